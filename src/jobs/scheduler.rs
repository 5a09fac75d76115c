use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::dispatcher::JobDispatcher;
use super::queue::JobQueue;

/// Spawn a periodic "scrape all" trigger.
///
/// The first job is submitted immediately, then once per `interval`. Ticks
/// missed while the runtime was busy are not replayed in a burst.
pub fn spawn_scheduler<Q>(dispatcher: Arc<JobDispatcher<Q>>, interval: Duration) -> JoinHandle<()>
where
    Q: JobQueue + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let job_id = dispatcher.submit_scrape_all();
            tracing::info!(
                job_id = %job_id,
                interval_secs = interval.as_secs(),
                "Scheduled scrape dispatched"
            );
        }
    })
}
