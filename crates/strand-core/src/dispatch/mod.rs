//! Dispatch module: the submit-once / poll-until-done controller.

mod controller;

pub use controller::{JOB_ID_KEY, JobDispatcher, PollOutcome, SUBMITTED_AT_KEY, Submitter};
