//! End-to-end dispatch scenarios: submit-once, resumability, backoff
//! signals, result propagation, and error translation through the full
//! executor shell.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::watch;

use strand_core::config::SystemConfig;
use strand_core::dispatch::JOB_ID_KEY;
use strand_core::domain::{
    AttemptId, ClientError, DomainKey, ExecuteStatus, JobHandle, JobStatusReport, RemoteJobId,
    TaskExecutionError, TaskKind, TaskRequest, TaskResult,
};
use strand_core::executor::{DONE_JOB_ID_KEY, ProcessorRegistry, TaskExecutor, TickDriver};
use strand_core::impls::{InMemoryStateStore, LocalJobClientFactory, LocalJobService};
use strand_core::ports::{JobClientFactory, RemoteJobClient, ResultProcessor, StateStore};

fn request() -> TaskRequest {
    TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({ "poll_interval": 1, "retry_interval": 1 }),
    )
}

fn executor(service: &Arc<LocalJobService>) -> TaskExecutor {
    TaskExecutor::new(
        Arc::new(LocalJobClientFactory::new(Arc::clone(service))),
        SystemConfig::default(),
    )
}

/// Fresh attempt over two ticks: the first invocation submits, persists the
/// id, observes RUNNING and raises the retry signal; the second re-attaches
/// via the persisted id, observes SUCCEEDED, and returns the result.
#[tokio::test]
async fn two_tick_scenario_persists_then_reattaches() {
    let service = Arc::new(LocalJobService::new(1).with_result(json!({"rows": 3})));
    let exec = executor(&service);
    let state = InMemoryStateStore::new();
    let req = request();

    // Tick 1: submit + first poll (RUNNING).
    let status = exec.execute(&req, &state).await.unwrap();
    let ExecuteStatus::Pending { wait, state: snapshot } = status else {
        panic!("expected Pending after first tick");
    };
    assert_eq!(wait, Duration::from_secs(1));
    assert_eq!(snapshot[JOB_ID_KEY], "local-1");

    // Tick 2: reattach via persisted id, observe SUCCEEDED.
    let status = exec.execute(&req, &state).await.unwrap();
    let ExecuteStatus::Done(result) = status else {
        panic!("expected Done after second tick");
    };
    assert_eq!(result.last_job_id(), Some("local-1"));

    assert_eq!(service.submit_calls().await, 1);
    assert_eq!(service.jobs_created().await, 1);
}

/// Restarts after the durable write never re-submit: a fresh store seeded
/// with the recorded id (what the engine would restore from its database)
/// goes straight to polling.
#[tokio::test]
async fn restart_after_persist_does_not_resubmit() {
    let service = Arc::new(LocalJobService::new(0));
    let exec = executor(&service);
    let req = request();

    let state = InMemoryStateStore::new();
    let first = exec.execute(&req, &state).await.unwrap();
    assert!(first.is_done() || first.is_pending());
    let submits_before = service.submit_calls().await;
    assert_eq!(submits_before, 1);

    // Process restart: only durable state survives.
    let restored = InMemoryStateStore::from_snapshot(state.snapshot().await.unwrap());
    let status = exec.execute(&req, &restored).await.unwrap();

    assert!(status.is_done());
    assert_eq!(service.submit_calls().await, 1, "reattach must not submit");
}

/// A crash before the durable write re-submits, but the deterministic
/// domain key makes the remote side return the same job: still one logical
/// job.
#[tokio::test]
async fn crash_before_persist_is_deduplicated_by_domain_key() {
    let service = Arc::new(LocalJobService::new(0));
    let exec = executor(&service);
    let req = request();

    // First invocation against state that is then lost entirely.
    let lost_state = InMemoryStateStore::new();
    exec.execute(&req, &lost_state).await.unwrap();

    // Re-run the same attempt with empty state: submit happens again...
    let fresh_state = InMemoryStateStore::new();
    let status = exec.execute(&req, &fresh_state).await.unwrap();

    // ...but the remote deduplicates on the domain key.
    assert_eq!(service.submit_calls().await, 2);
    assert_eq!(service.jobs_created().await, 1);
    let ExecuteStatus::Done(result) = status else {
        panic!("expected Done");
    };
    assert_eq!(result.last_job_id(), Some("local-1"));
}

/// Resumability: durable state already holds a done job id; a fresh
/// invocation returns the final result without any submit call.
#[tokio::test]
async fn done_job_id_short_circuits_submission() {
    let service = Arc::new(LocalJobService::new(0));
    let exec = executor(&service);
    let state = InMemoryStateStore::new();
    state
        .set(DONE_JOB_ID_KEY, Value::String("local-99".into()))
        .await
        .unwrap();

    let status = exec.execute(&request(), &state).await.unwrap();

    let ExecuteStatus::Done(result) = status else {
        panic!("expected Done");
    };
    assert_eq!(result.last_job_id(), Some("local-99"));
    assert_eq!(service.submit_calls().await, 0);
}

/// Backoff signal shape: RUNNING yields exactly one Pending per tick with
/// the poll interval, and the snapshot carries the persisted job id.
#[tokio::test]
async fn running_job_yields_poll_interval_pending() {
    let service = Arc::new(LocalJobService::new(3));
    let exec = TaskExecutor::new(
        Arc::new(LocalJobClientFactory::new(Arc::clone(&service))),
        SystemConfig {
            poll_interval_secs: 42,
            retry_interval_secs: 5,
        },
    );
    // No per-task overrides: system config decides.
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({}),
    );
    let state = InMemoryStateStore::new();

    let ExecuteStatus::Pending { wait, state: snapshot } =
        exec.execute(&req, &state).await.unwrap()
    else {
        panic!("expected Pending");
    };
    assert_eq!(wait, Duration::from_secs(42));
    assert!(snapshot.contains_key(JOB_ID_KEY));
}

/// Transient poll errors back off with the retry interval and are never
/// surfaced; the attempt still completes.
#[tokio::test]
async fn transient_errors_back_off_then_recover() {
    let service = Arc::new(LocalJobService::new(0));
    let exec = TaskExecutor::new(
        Arc::new(LocalJobClientFactory::new(Arc::clone(&service))),
        SystemConfig {
            poll_interval_secs: 42,
            retry_interval_secs: 5,
        },
    );
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({}),
    );
    let state = InMemoryStateStore::new();
    service.fail_next_polls(1).await;

    let ExecuteStatus::Pending { wait, .. } = exec.execute(&req, &state).await.unwrap() else {
        panic!("expected Pending from transient failure");
    };
    assert_eq!(wait, Duration::from_secs(5), "transient backoff uses retry interval");

    let status = exec.execute(&req, &state).await.unwrap();
    assert!(status.is_done());
}

/// A transient failure at submit time is a backoff signal, not an attempt
/// failure: the next tick submits from scratch and completes.
#[tokio::test]
async fn transient_submit_error_is_not_surfaced() {
    struct FlakySubmitClient {
        failures: Arc<AtomicU32>,
    }

    #[async_trait]
    impl RemoteJobClient for FlakySubmitClient {
        async fn submit(
            &self,
            _domain_key: &DomainKey,
            _params: &Value,
        ) -> Result<RemoteJobId, ClientError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(ClientError::transient("429 rate limited"));
            }
            Ok(RemoteJobId::new("J1"))
        }

        async fn poll(&self, _job_id: &RemoteJobId) -> Result<JobStatusReport, ClientError> {
            Ok(JobStatusReport::succeeded())
        }

        async fn fetch_result(&self, _job_id: &RemoteJobId) -> Result<Value, ClientError> {
            Ok(Value::Null)
        }

        async fn release(self: Box<Self>) {}
    }

    struct FlakySubmitFactory {
        failures: Arc<AtomicU32>,
    }

    #[async_trait]
    impl JobClientFactory for FlakySubmitFactory {
        async fn open(
            &self,
            _request: &TaskRequest,
        ) -> Result<Box<dyn RemoteJobClient>, ClientError> {
            Ok(Box::new(FlakySubmitClient {
                failures: Arc::clone(&self.failures),
            }))
        }
    }

    let exec = TaskExecutor::new(
        Arc::new(FlakySubmitFactory {
            failures: Arc::new(AtomicU32::new(1)),
        }),
        SystemConfig {
            poll_interval_secs: 42,
            retry_interval_secs: 5,
        },
    );
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({}),
    );
    let state = InMemoryStateStore::new();

    let ExecuteStatus::Pending { wait, state: snapshot } = exec.execute(&req, &state).await.unwrap()
    else {
        panic!("expected Pending backoff from transient submit failure");
    };
    assert_eq!(wait, Duration::from_secs(5), "submit backoff uses retry interval");
    assert!(!snapshot.contains_key(JOB_ID_KEY), "no job id before a successful submit");

    let status = exec.execute(&req, &state).await.unwrap();
    assert!(status.is_done());
}

/// A transient failure opening the session backs off the same way and
/// leaves no session behind; the next tick dispatches normally.
#[tokio::test]
async fn transient_open_error_becomes_backoff() {
    struct FlakyOpenFactory {
        inner: LocalJobClientFactory,
        failures: Arc<AtomicU32>,
    }

    #[async_trait]
    impl JobClientFactory for FlakyOpenFactory {
        async fn open(
            &self,
            request: &TaskRequest,
        ) -> Result<Box<dyn RemoteJobClient>, ClientError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(ClientError::transient("connection reset"));
            }
            self.inner.open(request).await
        }
    }

    let service = Arc::new(LocalJobService::new(0));
    let exec = TaskExecutor::new(
        Arc::new(FlakyOpenFactory {
            inner: LocalJobClientFactory::new(Arc::clone(&service)),
            failures: Arc::new(AtomicU32::new(1)),
        }),
        SystemConfig {
            poll_interval_secs: 42,
            retry_interval_secs: 5,
        },
    );
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({}),
    );
    let state = InMemoryStateStore::new();

    let ExecuteStatus::Pending { wait, .. } = exec.execute(&req, &state).await.unwrap() else {
        panic!("expected Pending backoff from transient open failure");
    };
    assert_eq!(wait, Duration::from_secs(5));
    assert_eq!(service.submit_calls().await, 0);

    assert!(exec.execute(&req, &state).await.unwrap().is_done());
    assert_eq!(service.open_sessions().await, 0);
}

/// The session is released on every exit path: done, pending, and failure.
#[tokio::test]
async fn sessions_released_on_every_path() {
    let service = Arc::new(LocalJobService::new(1));
    let exec = executor(&service);
    let req = request();

    // Pending path.
    let state = InMemoryStateStore::new();
    exec.execute(&req, &state).await.unwrap();
    assert_eq!(service.open_sessions().await, 0);

    // Done path.
    exec.execute(&req, &state).await.unwrap();
    assert_eq!(service.open_sessions().await, 0);

    // Failure path: poll of an unknown job (terminal client error).
    let broken = InMemoryStateStore::new();
    broken
        .set(JOB_ID_KEY, Value::String("no-such-job".into()))
        .await
        .unwrap();
    exec.execute(&req, &broken).await.unwrap_err();
    assert_eq!(service.open_sessions().await, 0);
}

/// A registered result processor shapes the output; the shell still stamps
/// job.last_job_id on top of it.
#[tokio::test]
async fn result_processor_output_is_stamped_with_job_id() {
    struct RowCountProcessor;

    #[async_trait]
    impl ResultProcessor for RowCountProcessor {
        async fn process(
            &self,
            client: &dyn RemoteJobClient,
            job: &JobHandle,
        ) -> Result<TaskResult, ClientError> {
            let payload = client.fetch_result(job.job_id()).await?;
            Ok(TaskResult::empty().with_store_param("rows", payload["rows"].clone()))
        }
    }

    let service = Arc::new(LocalJobService::new(0).with_result(json!({"rows": 3})));
    let mut processors = ProcessorRegistry::new();
    processors
        .register(TaskKind::new("query"), Arc::new(RowCountProcessor))
        .unwrap();
    let exec = executor(&service).with_processors(processors);
    let state = InMemoryStateStore::new();

    let ExecuteStatus::Done(result) = exec.execute(&request(), &state).await.unwrap() else {
        panic!("expected Done");
    };
    assert_eq!(result.store_params()["rows"], 3);
    assert_eq!(result.last_job_id(), Some("local-1"));
}

/// Error translation: whatever the client raises, the shell surfaces only
/// TaskExecutionError.
#[tokio::test]
async fn client_errors_surface_as_task_execution_errors_only() {
    struct RejectingFactory;

    #[async_trait]
    impl JobClientFactory for RejectingFactory {
        async fn open(
            &self,
            _request: &TaskRequest,
        ) -> Result<Box<dyn RemoteJobClient>, ClientError> {
            Err(ClientError::terminal("credentials rejected"))
        }
    }

    let exec = TaskExecutor::new(Arc::new(RejectingFactory), SystemConfig::default());
    let err = exec
        .execute(&request(), &InMemoryStateStore::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TaskExecutionError::Client { .. }));
    assert!(err.to_string().contains("credentials rejected"));
}

/// A terminally failed remote job surfaces the job id and remote detail.
#[tokio::test]
async fn failed_job_error_names_job_and_detail() {
    struct FailingClient;

    #[async_trait]
    impl RemoteJobClient for FailingClient {
        async fn submit(
            &self,
            _domain_key: &DomainKey,
            _params: &Value,
        ) -> Result<RemoteJobId, ClientError> {
            Ok(RemoteJobId::new("J1"))
        }

        async fn poll(&self, _job_id: &RemoteJobId) -> Result<JobStatusReport, ClientError> {
            Ok(JobStatusReport::failed("query syntax error at line 3"))
        }

        async fn fetch_result(&self, _job_id: &RemoteJobId) -> Result<Value, ClientError> {
            Err(ClientError::terminal("job did not succeed"))
        }

        async fn release(self: Box<Self>) {}
    }

    struct FailingFactory;

    #[async_trait]
    impl JobClientFactory for FailingFactory {
        async fn open(
            &self,
            _request: &TaskRequest,
        ) -> Result<Box<dyn RemoteJobClient>, ClientError> {
            Ok(Box::new(FailingClient))
        }
    }

    let exec = TaskExecutor::new(Arc::new(FailingFactory), SystemConfig::default());
    let err = exec
        .execute(&request(), &InMemoryStateStore::new())
        .await
        .unwrap_err();

    assert_eq!(err.job_id().map(|id| id.as_str()), Some("J1"));
    assert!(err.to_string().contains("query syntax error at line 3"));
}

/// A local config error surfaces immediately, before any session is opened.
#[tokio::test]
async fn config_error_fails_without_opening_a_session() {
    let service = Arc::new(LocalJobService::new(0));
    let exec = executor(&service);
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({ "poll_interval": "soon" }),
    );

    let err = exec
        .execute(&req, &InMemoryStateStore::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TaskExecutionError::Config(_)));
    assert_eq!(service.submit_calls().await, 0);
}

/// The tick driver runs an attempt to completion across many pending ticks.
#[tokio::test]
async fn tick_driver_runs_to_completion() {
    let service = Arc::new(LocalJobService::new(2).with_result(json!({"rows": 3})));
    let exec = Arc::new(TaskExecutor::new(
        Arc::new(LocalJobClientFactory::new(Arc::clone(&service))),
        SystemConfig::default(),
    ));
    let driver = TickDriver::new(exec);
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({ "poll_interval": 0, "retry_interval": 0 }),
    );
    let state = InMemoryStateStore::new();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        driver.drive_to_completion(&req, &state),
    )
    .await
    .expect("driver should finish well within the timeout")
    .unwrap();

    assert_eq!(result.last_job_id(), Some("local-1"));
    assert_eq!(service.submit_calls().await, 1);
}

/// Shutdown mid-attempt stops ticking: drive returns `None` and issues no
/// further submit, leaving the remote job untouched.
#[tokio::test]
async fn shutdown_mid_attempt_returns_none() {
    let service = Arc::new(LocalJobService::new(1000));
    let exec = Arc::new(TaskExecutor::new(
        Arc::new(LocalJobClientFactory::new(Arc::clone(&service))),
        SystemConfig {
            poll_interval_secs: 3600,
            retry_interval_secs: 3600,
        },
    ));
    let driver = TickDriver::new(exec);
    let req = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({}),
    );
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let attempt = tokio::spawn(async move {
        let state = InMemoryStateStore::new();
        driver.drive(&req, &state, &mut shutdown_rx).await
    });

    // Let the first tick submit, then request shutdown during its wait.
    while service.submit_calls().await == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    shutdown_tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), attempt)
        .await
        .expect("drive should stop promptly after shutdown")
        .unwrap()
        .unwrap();

    assert!(result.is_none());
    assert_eq!(service.submit_calls().await, 1);
}
