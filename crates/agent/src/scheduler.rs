use std::future::Future;
use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::agent::Agent;

/// Drive `agent` until `shutdown` resolves.
///
/// The base tick always runs. The burst tick only runs while the polling
/// state asks for it. A wake from the lock or the side task flushes the
/// deferred decision without waiting for the next tick.
pub async fn run<S>(agent: Arc<Agent>, shutdown: S)
where
    S: Future<Output = ()>,
{
    let timings = agent.config().timings.clone();
    let mut base = interval(timings.base_tick());
    base.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut burst = interval(timings.burst_tick());
    burst.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let wake = agent.wake_handle();

    info!(
        "scheduler started: base={}ms burst={}ms",
        timings.base_tick_ms, timings.burst_tick_ms
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested; scheduler stopping");
                break;
            }
            _ = base.tick() => agent.tick().await,
            _ = burst.tick() => {
                if agent.burst_active() {
                    agent.tick().await;
                }
            }
            _ = wake.notified() => agent.flush_deferred(),
        }
    }
}
