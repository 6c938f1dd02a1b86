//! Probe scheduler.
//!
//! Binds the pipeline together for each queued server:
//! host identity → backoff eligibility → dispatch → trigger classification →
//! backoff update → comparison → result sink. Rate-limited servers go back to
//! the tail of the queue until their host's retries run out.

mod classify;
mod progress;
mod queue;
mod run;

pub use classify::{Trigger, TriggerPolicy};
pub use progress::ProgressEvent;
pub use queue::{WorkItem, WorkQueue};
pub use run::{RunSummary, Scheduler, SchedulerSettings};
