use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use godfield_core::api::{DecideRequest, Decision, DecisionKind};
use godfield_core::deferred::{DeferredDecision, DeferredSlot, Flush};
use godfield_core::echo::AttackMemory;
use godfield_core::gate::{DecisionGate, LockView, Verdict};
use godfield_core::model::{Phase, Refresh, SeenMiracles, Snapshot};
use godfield_core::phase::PhaseDetector;
use godfield_core::polling::{PollingState, Watchdog};
use godfield_core::{elapsed, new_ulid, Millis};
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, warn, Instrument};
use ulid::Ulid;

use crate::actions::{Executor, Outcome};
use crate::client::DecisionClient;
use crate::clock::Clock;
use crate::config::AgentConfig;
use crate::lock::ActionLock;
use crate::scene::{Confirm, InputActuator, SceneSampler};
use crate::ui_queue::UiQueue;

/// Mutable recency state shared by every component. Only ever touched
/// under `Agent::state`, and never across an await.
#[derive(Debug)]
struct Coordination {
    detector: PhaseDetector,
    gate: DecisionGate,
    polling: PollingState,
    deferred: DeferredSlot,
    attack_memory: AttackMemory,
    seen: SeenMiracles,
    last_snapshot: Option<Snapshot>,
    /// Side-task inspection is queued or running.
    checking: bool,
    last_inspection: Option<Millis>,
    ticking: bool,
}

/// The coordination context: one per process.
pub struct Agent {
    cfg: AgentConfig,
    clock: Clock,
    sampler: Arc<dyn SceneSampler>,
    actuator: Arc<dyn InputActuator>,
    client: DecisionClient,
    lock: Arc<ActionLock>,
    executor: Executor,
    ui_queue: UiQueue,
    wake: Arc<Notify>,
    state: Mutex<Coordination>,
}

impl Agent {
    /// Wire up the lock, executor and client. Nothing runs until the
    /// scheduler starts ticking.
    pub fn new(
        cfg: AgentConfig,
        sampler: Arc<dyn SceneSampler>,
        actuator: Arc<dyn InputActuator>,
    ) -> Arc<Self> {
        let clock = Clock::start();
        let wake = Arc::new(Notify::new());
        let lock = Arc::new(ActionLock::new(
            clock,
            Duration::from_millis(cfg.timings.lock_quiet_ms),
            wake.clone(),
        ));
        let executor = Executor::new(
            sampler.clone(),
            actuator.clone(),
            lock.clone(),
            cfg.timings.clone(),
        );
        let state = Coordination {
            detector: PhaseDetector::new(),
            gate: DecisionGate::new(cfg.vocabulary.clone()),
            polling: PollingState::new(),
            deferred: DeferredSlot::new(),
            attack_memory: AttackMemory::new(),
            seen: SeenMiracles::default(),
            last_snapshot: None,
            checking: false,
            last_inspection: None,
            ticking: false,
        };

        Arc::new(Self {
            client: DecisionClient::new(cfg.decide_url.clone()),
            cfg,
            clock,
            sampler,
            actuator,
            lock,
            executor,
            ui_queue: UiQueue::new(),
            wake,
            state: Mutex::new(state),
        })
    }

    fn state(&self) -> MutexGuard<'_, Coordination> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn lock(&self) -> &Arc<ActionLock> {
        &self.lock
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Signalled when the lock frees or an inspection ends.
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Miracles learned from the last successful inspection.
    pub fn seen_miracles(&self) -> SeenMiracles {
        self.state().seen.clone()
    }

    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.state().last_snapshot.clone()
    }

    pub fn has_deferred(&self) -> bool {
        self.state().deferred.is_pending()
    }

    pub fn attack_memory(&self) -> AttackMemory {
        self.state().attack_memory.clone()
    }

    /// True while the scheduler should run the burst tick.
    pub fn burst_active(&self) -> bool {
        let now = self.clock.now_ms();
        self.state().polling.burst_active(now)
    }

    /// An action or the side task owns the screen.
    fn busy(&self, st: &Coordination) -> bool {
        self.lock.is_held() || st.checking
    }

    /// One pass of the loop: sample, detect, gate, inspect, flush.
    ///
    /// Overlapping calls are skipped, as are calls made while the side task
    /// has the screen.
    pub async fn tick(self: &Arc<Self>) {
        {
            let mut st = self.state();
            if st.ticking {
                debug!("tick skipped: previous tick still running");
                return;
            }
            if st.checking {
                debug!("tick skipped: inspection in progress");
                return;
            }
            st.ticking = true;
        }

        let result = self.tick_inner().await;
        self.state().ticking = false;
        if let Err(e) = result {
            warn!("tick abandoned: {e:?}");
        }
    }

    async fn tick_inner(self: &Arc<Self>) -> anyhow::Result<()> {
        let Some(frame) = self.sampler.sample().await? else {
            debug!("scene ambiguous; tick abandoned");
            return Ok(());
        };

        let now = self.clock.now_ms();
        let lock = self.lock.view();
        let (snap, verdict, inspect) = {
            let mut st = self.state();
            let phase = st.detector.detect(&frame.cues, now);
            let snap = Snapshot::assemble(phase, frame, &st.seen);
            st.last_snapshot = Some(snap.clone());

            let watchdog = st.polling.observe(&snap, now);
            if let Watchdog::ForcePass { empty_for } = watchdog {
                warn!(
                    "watchdog: defense without incoming effects for {empty_for}ms (scene unchanged for {}ms); forcing pass",
                    st.polling.stalled_for(now)
                );
                drop(st);
                self.spawn_defense_pass();
                return Ok(());
            }

            let verdict = st.gate.evaluate(&snap, lock, now);
            let inspect = self.claim_inspection(&mut st, phase, lock, now);
            (snap, verdict, inspect)
        };

        match verdict {
            Verdict::Act => self.spawn_decide(snap),
            Verdict::Suppress(why) => debug!("gate suppressed {} tick: {why:?}", snap.phase),
        }
        if inspect {
            self.spawn_inspection();
        }
        self.flush_deferred();
        Ok(())
    }

    /// Due when attacking with the lock free, nothing already queued and the
    /// interval elapsed. Claims the side task on success.
    fn claim_inspection(&self, st: &mut Coordination, phase: Phase, lock: LockView, now: Millis) -> bool {
        if phase != Phase::Attack || lock.in_flight || st.checking {
            return false;
        }
        let interval = Millis::try_from(self.cfg.timings.inspection_interval_ms).unwrap_or(Millis::MAX);
        let due = st
            .last_inspection
            .map_or(true, |at| elapsed(now, at) >= interval);
        if due {
            st.checking = true;
        }
        due
    }

    fn spawn_decide(self: &Arc<Self>, snap: Snapshot) {
        let agent = Arc::clone(self);
        tokio::spawn(async move { agent.decide(snap).await }.in_current_span());
    }

    fn spawn_defense_pass(self: &Arc<Self>) {
        let agent = Arc::clone(self);
        tokio::spawn(async move { agent.executor.defense_pass().await }.in_current_span());
    }

    fn spawn_inspection(self: &Arc<Self>) {
        let agent = Arc::clone(self);
        tokio::spawn(async move { agent.inspect_miracles().await }.in_current_span());
    }

    /// Ask the decision service about `snap` and act on the answer, or
    /// defer it when the screen is busy.
    pub async fn decide(&self, snap: Snapshot) {
        let request_id = new_ulid();
        let req = DecideRequest::from(&snap);
        let decision = match self.client.decide(&req).await {
            Ok(d) => d,
            Err(e) => {
                warn!("decide {request_id} failed; dropping: {e}");
                return;
            }
        };
        info!(
            "decision {request_id}: {:?} cards={:?} reason={}",
            decision.kind,
            decision.indices(),
            decision.reason.as_deref().unwrap_or("-")
        );

        let now = self.clock.now_ms();
        if self.busy(&self.state()) {
            self.defer(DeferredDecision::new(request_id, decision, snap, now));
            return;
        }

        // The lock can still be taken between the check above and the
        // executor acquiring it; a busy outcome defers instead of dropping.
        let deferred = DeferredDecision::new(request_id, decision.clone(), snap.clone(), now);
        if self.dispatch(request_id, decision, snap).await == Outcome::Busy {
            self.defer(deferred);
        }
    }

    fn defer(&self, deferred: DeferredDecision) {
        let request_id = deferred.request_id;
        if let Some(old) = self.state().deferred.store(deferred) {
            info!("deferred decision {} overwritten by {request_id}", old.request_id);
        }
        info!("screen busy; decision {request_id} deferred");
    }

    async fn dispatch(&self, request_id: Ulid, decision: Decision, snap: Snapshot) -> Outcome {
        let indices = decision.indices().to_vec();
        debug!("dispatch {request_id}: {:?}", decision.kind);
        let outcome = match decision.kind {
            DecisionKind::Attack => {
                self.state().attack_memory.remember(&indices, &snap.hand);
                self.executor.use_cards(&snap, &indices, decision.target).await
            }
            DecisionKind::Defend | DecisionKind::Shield => {
                self.executor.use_cards(&snap, &indices, decision.target).await
            }
            DecisionKind::AttackPass | DecisionKind::DefensePass => self.executor.pass(snap.phase).await,
            DecisionKind::BuyChoice => {
                let which = if decision.accepts_purchase() {
                    Confirm::Yes
                } else {
                    Confirm::No
                };
                self.executor.confirm_purchase(which).await
            }
            DecisionKind::Exchange => self.executor.exchange(&snap, &indices, decision.exchange).await,
            DecisionKind::Sell => self.executor.sell(&snap, &indices).await,
            DecisionKind::Buy => self.executor.buy(&snap, &indices).await,
        };
        if outcome == Outcome::Rejected {
            warn!("decision {request_id} rejected: cards {indices:?} not in hand");
        }
        outcome
    }

    /// Replay or expire the deferred decision. Replays run on their own task.
    pub fn flush_deferred(self: &Arc<Self>) {
        let now = self.clock.now_ms();
        let outcome = {
            let mut st = self.state();
            let busy = self.busy(&st);
            let Coordination {
                deferred,
                last_snapshot,
                ..
            } = &mut *st;
            deferred.flush(now, busy, last_snapshot.as_ref())
        };

        match outcome {
            Flush::Empty | Flush::Busy => {}
            Flush::Expired(stale) => {
                info!(
                    "deferred decision {} is stale ({}ms old); discarded",
                    stale.request_id,
                    elapsed(now, stale.created_at)
                );
            }
            Flush::Replay {
                request_id,
                decision,
                snapshot,
                fresh,
                created_at,
            } => {
                let basis = if fresh { "current" } else { "stored" };
                info!("replaying deferred decision {request_id} against the {basis} snapshot");
                let agent = Arc::clone(self);
                tokio::spawn(
                    async move {
                        let retry = DeferredDecision::new(request_id, decision.clone(), snapshot.clone(), created_at);
                        if agent.dispatch(request_id, decision, snapshot).await == Outcome::Busy {
                            agent.defer(retry);
                        }
                    }
                    .in_current_span(),
                );
            }
        }
    }

    /// Open the miracle history, refresh what has been seen, close it.
    ///
    /// Runs through the side-task queue and under the Action Lock. Ticks are
    /// paused until it finishes.
    pub async fn inspect_miracles(&self) {
        self.state().checking = true;
        let ran = self
            .ui_queue
            .run(self.lock.run("inspect_miracles", self.inspection_body()))
            .await;

        let now = self.clock.now_ms();
        {
            let mut st = self.state();
            st.checking = false;
            if ran {
                st.last_inspection = Some(now);
            }
        }
        self.wake.notify_one();
    }

    async fn inspection_body(&self) -> anyhow::Result<()> {
        let t = &self.cfg.timings;
        self.actuator.toggle_miracle_view().await?;
        sleep(Duration::from_millis(t.inspect_open_ms)).await;

        let reading = self.sampler.read_miracles().await;
        // The view is closed even when the read failed.
        let closed = self.actuator.toggle_miracle_view().await;
        sleep(Duration::from_millis(t.inspect_close_ms)).await;

        match reading? {
            None => debug!("miracle view did not open"),
            Some(reading) => {
                let mut st = self.state();
                match st.seen.refresh(&reading) {
                    Refresh::Replaced => info!(
                        "seen miracles refreshed: me={:?} enemy={:?}",
                        st.seen.me, st.seen.enemy
                    ),
                    Refresh::NoIcons => debug!("no miracle icons on screen"),
                    Refresh::KeptPrevious => {
                        info!("{} miracle icons but no names resolved; keeping previous record", reading.icons)
                    }
                }
            }
        }
        closed
    }
}
