//! Asynchronous dispatch of scrape work.
//!
//! - [`dispatcher`] - validates requests and hands them to a queue
//! - [`queue`] - the `JobQueue` contract and an in-process tokio implementation
//! - [`scheduler`] - periodic "scrape all" trigger

mod dispatcher;
mod queue;
mod scheduler;

pub use dispatcher::{DispatchError, JobDispatcher};
pub use queue::{JobId, JobQueue, LocalQueue, ScrapeJob};
pub use scheduler::spawn_scheduler;
