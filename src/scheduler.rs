//! Fixed-interval pull scheduling with a non-overlap guarantee.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::Ingestor;

// ---

/// Drive the pull path forever on a fixed interval.
///
/// One tick runs at a time: the loop awaits each `pull_once` to completion
/// before asking the interval for the next tick, and
/// [`MissedTickBehavior::Skip`] drops ticks that came due while a slow pull
/// was still in flight instead of firing them back-to-back. A failed tick is
/// logged and the loop moves on; nothing a tick does can end the loop.
pub async fn run_pull_loop(ingestor: Arc<Ingestor>, period: Duration) {
    // ---
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick fires immediately; consume it so the first pull
    // happens one full period after startup.
    ticker.tick().await;

    info!("Sensor pull loop started, period {:?}", period);

    loop {
        ticker.tick().await;

        match ingestor.pull_once().await {
            Ok(()) => {}
            Err(e) => warn!("Pull tick failed: {}", e),
        }
    }
}
