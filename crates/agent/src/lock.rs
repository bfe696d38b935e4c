use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use godfield_core::gate::LockView;
use godfield_core::Millis;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::clock::Clock;

#[derive(Debug, Default)]
struct Inner {
    holder: Option<String>,
    last_finish: Option<Millis>,
}

/// Single-flight guard over actuation.
///
/// At most one labelled action body runs at a time. A call made while the
/// lock is held is skipped, not queued.
#[derive(Debug)]
pub struct ActionLock {
    inner: Mutex<Inner>,
    clock: Clock,
    quiet: Duration,
    released: Arc<Notify>,
}

impl ActionLock {
    /// Free lock. `released` is notified after every release.
    pub fn new(clock: Clock, quiet: Duration, released: Arc<Notify>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
            quiet,
            released,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True while a body or its quiet period is running.
    pub fn is_held(&self) -> bool {
        self.inner().holder.is_some()
    }

    /// Label of the running action.
    pub fn holder(&self) -> Option<String> {
        self.inner().holder.clone()
    }

    /// Point-in-time copy for the decision gate.
    pub fn view(&self) -> LockView {
        let inner = self.inner();
        LockView {
            in_flight: inner.holder.is_some(),
            last_finish: inner.last_finish,
        }
    }

    fn try_acquire(&self, label: &str) -> bool {
        let mut inner = self.inner();
        if inner.holder.is_some() {
            return false;
        }
        inner.holder = Some(label.to_string());
        true
    }

    /// Run `body` under the lock. Returns `false` if the lock was busy and
    /// `body` never ran.
    ///
    /// Errors from `body` are logged and swallowed. The lock is released only
    /// after the quiet period, and every release wakes the scheduler.
    pub async fn run<F>(&self, label: &str, body: F) -> bool
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        if !self.try_acquire(label) {
            info!("skipped {label}: action already in progress");
            return false;
        }
        info!("start action: {label}");

        if let Err(e) = body.await {
            warn!("action {label} failed: {e:?}");
        }

        sleep(self.quiet).await;
        {
            let mut inner = self.inner();
            inner.last_finish = Some(self.clock.now_ms());
            inner.holder = None;
        }
        self.released.notify_one();
        info!("end action: {label} (lock released)");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lock(clock: Clock) -> ActionLock {
        ActionLock::new(clock, Duration::from_millis(500), Arc::new(Notify::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn second_caller_is_rejected_while_held() {
        let clock = Clock::start();
        let lock = lock(clock);
        let runs = AtomicUsize::new(0);

        let first = lock.run("first", async {
            runs.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(300)).await;
            Ok(())
        });
        let second = async {
            // Let the first body start before contending.
            tokio::task::yield_now().await;
            lock.run("second", async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
        };

        let (a, b) = tokio::join!(first, second);
        assert!(a);
        assert!(!b);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!lock.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_still_releases_after_quiet_period() {
        let clock = Clock::start();
        let lock = lock(clock);

        let ran = lock
            .run("boom", async { Err(anyhow::anyhow!("actuator unplugged")) })
            .await;
        assert!(ran);
        assert!(!lock.is_held());
        assert_eq!(lock.view().last_finish, Some(500));

        assert!(lock.run("again", async { Ok(()) }).await);
    }

    #[tokio::test(start_paused = true)]
    async fn held_during_body_and_quiet_period() {
        let clock = Clock::start();
        let lock = Arc::new(lock(clock));

        let l = lock.clone();
        let task = tokio::spawn(async move {
            l.run("slow", async {
                sleep(Duration::from_millis(100)).await;
                Ok(())
            })
            .await
        });

        sleep(Duration::from_millis(50)).await;
        assert_eq!(lock.holder().as_deref(), Some("slow"));
        sleep(Duration::from_millis(500)).await;
        assert!(lock.is_held());
        sleep(Duration::from_millis(100)).await;
        assert!(!lock.is_held());
        assert!(task.await.unwrap());
    }
}
