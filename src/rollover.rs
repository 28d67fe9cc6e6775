use crate::engine::Engine;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveTime};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Gap between `now` and the next midnight in the reference timezone.
pub fn delay_until_midnight(now: DateTime<FixedOffset>) -> Duration {
    let midnight = (now.date_naive() + ChronoDuration::days(1)).and_time(NaiveTime::MIN);
    (midnight - now.naive_local())
        .to_std()
        .unwrap_or(Duration::from_secs(1))
}

/// Arms a one-shot timer for the next reference-timezone midnight; after
/// each firing the delay is recomputed, so the chain absorbs 23 to 25
/// hour calendar days without drift. Cancel by aborting the returned
/// handle.
pub fn spawn(engine: Engine) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = delay_until_midnight(engine.clock().now());
            info!("next daily reset in {}s", delay.as_secs());
            tokio::time::sleep(delay).await;
            engine.rollover().await;
        }
    })
}
