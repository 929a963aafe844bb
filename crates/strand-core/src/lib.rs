//! strand-core
//!
//! Core building blocks for the Strand dispatch runtime: a durable
//! "submit once, poll until done" state machine for long-running remote jobs.
//!
//! # Module layout
//! - **domain**: domain model (ids, domain key, job handle, status, result, errors)
//! - **ports**: abstraction layer (StateStore, RemoteJobClient, Clock, ResultProcessor)
//! - **dispatch**: the job dispatch controller (submit-once + single-tick polling)
//! - **executor**: the task executor shell, processor registry, and tick driver
//! - **impls**: in-memory implementations for development and tests
//!
//! The central contract: a remote job is submitted at most once per task
//! attempt, its id is persisted to the durable state store before control
//! returns to the caller, and every later invocation re-attaches to that id
//! instead of submitting again. "Not yet done" is a control signal
//! ([`domain::ExecuteStatus::Pending`]), never an error.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod executor;
pub mod impls;
pub mod ports;
