use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use godfield_core::api::ExchangePlan;
use godfield_core::model::{Phase, Snapshot, Target};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::Timings;
use crate::lock::ActionLock;
use crate::scene::{Column, Confirm, InputActuator, SceneSampler};

async fn settle(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

/// `indices[0]`, provided it names a card in the hand.
fn first_in_hand(snap: &Snapshot, indices: &[usize], label: &str) -> Option<usize> {
    match indices.first() {
        Some(&i) if snap.card(i).is_some() => Some(i),
        Some(i) => {
            info!("{label} card {i} is not in the hand; skipped");
            None
        }
        None => {
            info!("{label} needs a card, got none; skipped");
            None
        }
    }
}

/// What an executor call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The sequence ran. Actuation errors are logged by the lock, not here.
    Ran,
    /// Another action held the lock; nothing ran.
    Busy,
    /// The requested cards are not in the hand; nothing ran.
    Rejected,
}

impl Outcome {
    fn from_lock(ran: bool) -> Self {
        if ran {
            Self::Ran
        } else {
            Self::Busy
        }
    }

    /// True for [`Outcome::Ran`].
    pub fn ran(self) -> bool {
        self == Self::Ran
    }
}

/// Scripted input sequences. Every sequence runs under the [`ActionLock`];
/// a call made while the lock is held returns [`Outcome::Busy`].
pub struct Executor {
    sampler: Arc<dyn SceneSampler>,
    actuator: Arc<dyn InputActuator>,
    lock: Arc<ActionLock>,
    timings: Timings,
}

impl Executor {
    /// Sequences share `lock` with everything else that drives the screen.
    pub fn new(
        sampler: Arc<dyn SceneSampler>,
        actuator: Arc<dyn InputActuator>,
        lock: Arc<ActionLock>,
        timings: Timings,
    ) -> Self {
        Self {
            sampler,
            actuator,
            lock,
            timings,
        }
    }

    /// Play the listed cards and commit, or pass when none of them is in
    /// the hand.
    pub async fn use_cards(&self, snap: &Snapshot, indices: &[usize], target: Option<Target>) -> Outcome {
        let present: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|i| snap.card(*i).is_some())
            .collect();
        if present.len() < indices.len() {
            debug!("ignoring card indices missing from hand: requested {indices:?}, present {present:?}");
        }

        if present.is_empty() {
            return self.pass(snap.phase).await;
        }

        let phase = snap.phase;
        let ran = self
            .lock
            .run("use_cards", async {
                for i in &present {
                    self.actuator.click_indices(&[*i]).await?;
                    settle(self.timings.card_settle_ms).await;
                }
                self.actuator.commit(phase, target).await?;
                settle(self.timings.commit_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    /// Commit with nothing selected.
    pub async fn pass(&self, phase: Phase) -> Outcome {
        let ran = self
            .lock
            .run("pass", async {
                self.actuator.commit(phase, None).await?;
                settle(self.timings.pass_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    /// Forced progress from the watchdog.
    pub async fn defense_pass(&self) -> Outcome {
        let ran = self
            .lock
            .run("defense_pass", async {
                self.actuator.commit(Phase::Defense, None).await?;
                settle(self.timings.pass_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    /// `indices[0]` is the sale card, `indices[1]` the card being sold.
    pub async fn sell(&self, snap: &Snapshot, indices: &[usize]) -> Outcome {
        let [sale, item, ..] = indices else {
            info!("sell needs a sale card and a target card, got {indices:?}");
            return Outcome::Rejected;
        };
        if snap.card(*sale).is_none() || snap.card(*item).is_none() {
            info!("sell cards {indices:?} are not both in the hand; skipped");
            return Outcome::Rejected;
        }
        let phase = snap.phase;
        let ran = self
            .lock
            .run("sell", async {
                self.actuator.click_indices(&[*sale]).await?;
                settle(self.timings.trade_step_ms).await;
                self.actuator.click_indices(&[*item]).await?;
                settle(self.timings.trade_step_ms).await;
                self.actuator.commit(phase, None).await?;
                settle(self.timings.commit_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    /// Play the purchase card at `indices[0]` and commit.
    pub async fn buy(&self, snap: &Snapshot, indices: &[usize]) -> Outcome {
        let Some(card) = first_in_hand(snap, indices, "buy") else {
            return Outcome::Rejected;
        };
        let phase = snap.phase;
        let ran = self
            .lock
            .run("buy", async {
                self.actuator.click_indices(&[card]).await?;
                settle(self.timings.card_settle_ms).await;
                self.actuator.commit(phase, None).await?;
                settle(self.timings.commit_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    /// Play the exchange card, then move the counters to the planned levels.
    pub async fn exchange(&self, snap: &Snapshot, indices: &[usize], plan: Option<ExchangePlan>) -> Outcome {
        let Some(card) = first_in_hand(snap, indices, "exchange") else {
            return Outcome::Rejected;
        };
        let phase = snap.phase;
        let deltas = plan.map(|p| p.deltas(&snap.me));
        let ran = self
            .lock
            .run("exchange", async {
                self.actuator.click_indices(&[card]).await?;
                settle(self.timings.exchange_open_ms).await;

                if let Some((mp, gold)) = deltas {
                    if self.wait_for_counters().await? {
                        if mp != 0 {
                            self.actuator.adjust_counter(Column::Mp, mp).await?;
                        }
                        if gold != 0 {
                            self.actuator.adjust_counter(Column::Gold, gold).await?;
                        }
                        settle(self.timings.exchange_adjust_ms).await;
                    } else {
                        info!("exchange counters never appeared; committing as is");
                    }
                }

                self.actuator.commit(phase, None).await?;
                settle(self.timings.commit_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    /// Click the purchase confirmation once it shows.
    pub async fn confirm_purchase(&self, which: Confirm) -> Outcome {
        let ran = self
            .lock
            .run("confirm_purchase", async {
                if !self.wait_for_confirm(which).await? {
                    bail!("confirm control '{}' never became visible", which.as_str());
                }
                self.actuator.click_confirm(which).await?;
                settle(self.timings.confirm_settle_ms).await;
                Ok(())
            })
            .await;
        Outcome::from_lock(ran)
    }

    async fn wait_for_counters(&self) -> anyhow::Result<bool> {
        for _ in 0..self.timings.counter_attempts {
            if self.sampler.counters_visible().await? {
                return Ok(true);
            }
            settle(self.timings.poll_ms).await;
        }
        Ok(false)
    }

    async fn wait_for_confirm(&self, which: Confirm) -> anyhow::Result<bool> {
        for _ in 0..self.timings.confirm_attempts {
            if self.sampler.confirm_visible(which).await? {
                return Ok(true);
            }
            settle(self.timings.poll_ms).await;
        }
        Ok(false)
    }
}
