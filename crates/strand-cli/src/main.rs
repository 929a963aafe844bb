use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use strand_core::config::SystemConfig;
use strand_core::domain::{
    AttemptId, ClientError, JobHandle, TaskKind, TaskRequest, TaskResult,
};
use strand_core::executor::{ProcessorRegistry, TaskExecutor, TickDriver};
use strand_core::impls::{InMemoryStateStore, LocalJobClientFactory, LocalJobService};
use strand_core::ports::{RemoteJobClient, ResultProcessor};

/// Demo processor: fetch the finished job's payload and store the row count.
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

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // (A) Wire the ports: per-attempt durable state + a simulated remote
    //     service whose jobs report RUNNING twice before succeeding.
    let state = InMemoryStateStore::new();
    let service = Arc::new(LocalJobService::new(2).with_result(json!({ "rows": 3 })));
    let factory = Arc::new(LocalJobClientFactory::new(Arc::clone(&service)));

    // (B) Executor shell with a result processor for the "query" kind.
    let mut processors = ProcessorRegistry::new();
    processors
        .register(TaskKind::new("query"), Arc::new(RowCountProcessor))
        .expect("first registration");
    let executor = Arc::new(
        TaskExecutor::new(factory, SystemConfig::default()).with_processors(processors),
    );

    // (C) One task attempt, with short intervals so the demo finishes quickly.
    let request = TaskRequest::new(
        "daily_load",
        "ingest",
        TaskKind::new("query"),
        AttemptId::generate(),
        json!({ "poll_interval": 1, "retry_interval": 1 }),
    );

    // (D) Drive ticks until done (the outer engine's job in production).
    let driver = TickDriver::new(executor);
    match driver.drive_to_completion(&request, &state).await {
        Ok(result) => {
            println!(
                "task finished: last_job_id={} store_params={}",
                result.last_job_id().unwrap_or("<none>"),
                serde_json::to_string(result.store_params()).expect("store params are json"),
            );
            println!(
                "remote side saw {} submit call(s), {} job(s) created",
                service.submit_calls().await,
                service.jobs_created().await,
            );
        }
        Err(err) => {
            eprintln!("task failed: {err}");
            std::process::exit(1);
        }
    }
}
