//! State/action bridge
//!
//! Couples the frame loop to an out-of-process decision service without ever
//! blocking it:
//! - `maybe_send` captures a snapshot and fires a request when the rate
//!   limiter allows, then returns immediately
//! - requests run as tasks on a tokio runtime, each under a deadline
//! - `poll` drains finished replies at the start of a frame and applies them
//!   to whatever agent is current at that moment
//!
//! Every request carries a sequence number. Under
//! [`ResponseOrdering::Sequenced`] a reply older than the last applied one is
//! dropped; under [`ResponseOrdering::LastWriteWins`] replies apply in arrival
//! order, so a slow reply can overwrite a newer decision.

pub mod protocol;
pub mod rate_limit;
pub mod service;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub use protocol::{StateSnapshot, parse_move_payload};
pub use rate_limit::RateLimiter;
pub use service::{DecisionFuture, DecisionService, HttpDecisionService};

use crate::error::BridgeError;
use crate::settings::BridgeSettings;
use crate::sim::{Action, SimulationWorld};

/// How replies that arrive out of order are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Drop replies not newer than the last applied one
    #[default]
    Sequenced,
    /// Apply every reply as it arrives
    LastWriteWins,
}

/// A finished request
#[derive(Debug)]
struct Reply {
    seq: u64,
    result: Result<String, BridgeError>,
}

/// What `poll` did with one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Flags replaced by the action
    Applied { seq: u64, action: Action },
    /// Superseded by a newer applied reply; ignored
    Stale { seq: u64 },
    /// Unknown label; flags cleared
    Malformed { seq: u64, label: String },
    /// Transport failure or timeout; flags untouched
    Unavailable { seq: u64, reason: String },
}

/// Fire-and-forget client side of the round trip
pub struct Bridge {
    service: Arc<dyn DecisionService>,
    runtime: Handle,
    limiter: RateLimiter,
    timeout: Duration,
    ordering: ResponseOrdering,
    replies_tx: UnboundedSender<Reply>,
    replies_rx: UnboundedReceiver<Reply>,
    next_seq: u64,
    last_applied: Option<u64>,
    in_flight: usize,
}

impl Bridge {
    pub fn new(service: Arc<dyn DecisionService>, runtime: Handle, settings: &BridgeSettings) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            service,
            runtime,
            limiter: RateLimiter::new(settings.request_interval()),
            timeout: settings.timeout(),
            ordering: settings.ordering,
            replies_tx,
            replies_rx,
            next_seq: 1,
            last_applied: None,
            in_flight: 0,
        }
    }

    /// Requests sent but not yet drained
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Sequence number of the newest reply that changed the flags
    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Export the world if the limiter allows. Returns the request's sequence number.
    pub fn maybe_send(&mut self, world: &SimulationWorld, now: Instant) -> Option<u64> {
        if !self.limiter.try_acquire(now) {
            return None;
        }
        Some(self.send(StateSnapshot::capture(world)))
    }

    /// Fire one request regardless of the limiter
    pub fn send(&mut self, snapshot: StateSnapshot) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight += 1;

        let request = self.service.decide(snapshot);
        let tx = self.replies_tx.clone();
        let timeout = self.timeout;
        log::debug!("Sending state #{seq}");
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(BridgeError::Timeout(timeout)),
            };
            // Receiver only goes away with the bridge itself
            let _ = tx.send(Reply { seq, result });
        });
        seq
    }

    /// Apply every reply that has arrived so far. Never blocks.
    pub fn poll(&mut self, world: &mut SimulationWorld) -> Vec<ReplyOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(reply) = self.replies_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            outcomes.push(self.apply(reply, world));
        }
        outcomes
    }

    fn is_stale(&self, seq: u64) -> bool {
        match self.ordering {
            ResponseOrdering::Sequenced => self.last_applied.is_some_and(|last| seq <= last),
            ResponseOrdering::LastWriteWins => false,
        }
    }

    fn apply(&mut self, reply: Reply, world: &mut SimulationWorld) -> ReplyOutcome {
        let seq = reply.seq;
        let parsed = reply.result.and_then(|body| parse_move_payload(&body));

        match parsed {
            Err(BridgeError::MalformedAction(label)) => {
                if self.is_stale(seq) {
                    return ReplyOutcome::Stale { seq };
                }
                log::warn!("Reply #{seq} carried unknown action {label:?}; clearing controls");
                world.clear_controls();
                self.last_applied = Some(seq);
                ReplyOutcome::Malformed { seq, label }
            }
            Err(err) => {
                log::warn!("No action for request #{seq}: {err}");
                ReplyOutcome::Unavailable {
                    seq,
                    reason: err.to_string(),
                }
            }
            Ok(action) => {
                if self.is_stale(seq) {
                    log::debug!("Dropping stale reply #{seq} ({action})");
                    return ReplyOutcome::Stale { seq };
                }
                log::debug!("Applying reply #{seq}: {action}");
                world.apply_action(action);
                self.last_applied = Some(seq);
                ReplyOutcome::Applied { seq, action }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use glam::Vec2;
    use tokio::sync::oneshot;

    use crate::sim::{GoalArea, Rect, Rules};

    /// Replies are released by the test through oneshot gates, in any order
    struct GatedService {
        gates: Mutex<VecDeque<oneshot::Receiver<String>>>,
        seen: Mutex<Vec<StateSnapshot>>,
    }

    impl GatedService {
        fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<String>>) {
            let mut senders = Vec::new();
            let mut gates = VecDeque::new();
            for _ in 0..count {
                let (tx, rx) = oneshot::channel();
                senders.push(tx);
                gates.push_back(rx);
            }
            let service = Arc::new(Self {
                gates: Mutex::new(gates),
                seen: Mutex::new(Vec::new()),
            });
            (service, senders)
        }
    }

    impl DecisionService for GatedService {
        fn decide(&self, snapshot: StateSnapshot) -> DecisionFuture {
            self.seen.lock().unwrap().push(snapshot);
            let gate = self.gates.lock().unwrap().pop_front();
            Box::pin(async move {
                match gate {
                    Some(rx) => rx
                        .await
                        .map_err(|_| BridgeError::Unavailable("gate dropped".into())),
                    None => std::future::pending::<Result<String, BridgeError>>().await,
                }
            })
        }
    }

    fn world() -> SimulationWorld {
        SimulationWorld::new(
            Vec::new(),
            GoalArea::new(Rect::new(Vec2::new(900.0, 900.0), Vec2::splat(50.0))),
            Vec::new(),
            Vec2::ZERO,
            Rules::default(),
        )
    }

    fn settings(ordering: ResponseOrdering) -> BridgeSettings {
        BridgeSettings {
            ordering,
            timeout_ms: 50,
            ..BridgeSettings::default()
        }
    }

    /// Poll until `expected` outcomes have arrived
    async fn drain(bridge: &mut Bridge, world: &mut SimulationWorld, expected: usize) -> Vec<ReplyOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..500 {
            outcomes.extend(bridge.poll(world));
            if outcomes.len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        outcomes
    }

    #[tokio::test]
    async fn test_reply_sets_flags_and_velocity() {
        let (service, mut gates) = GatedService::new(1);
        let mut bridge = Bridge::new(service.clone(), Handle::current(), &settings(ResponseOrdering::Sequenced));
        let mut world = world();

        let seq = bridge.maybe_send(&world, Instant::now()).unwrap();
        assert_eq!(bridge.in_flight(), 1);
        gates.remove(0).send(r#"{"move":"up-right"}"#.into()).unwrap();

        let outcomes = drain(&mut bridge, &mut world, 1).await;
        assert_eq!(outcomes, vec![ReplyOutcome::Applied { seq, action: Action::UpRight }]);
        assert_eq!(world.agent.velocity, Vec2::new(1.0, -1.0));
        assert_eq!(bridge.in_flight(), 0);
        assert_eq!(service.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_reply_is_dropped_when_sequenced() {
        let (service, mut gates) = GatedService::new(2);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::Sequenced));
        let mut world = world();

        let first = bridge.send(StateSnapshot::capture(&world));
        let second = bridge.send(StateSnapshot::capture(&world));
        let late = gates.remove(0);
        gates.remove(0).send("up".into()).unwrap();

        let outcomes = drain(&mut bridge, &mut world, 1).await;
        assert_eq!(outcomes, vec![ReplyOutcome::Applied { seq: second, action: Action::Up }]);

        late.send("down".into()).unwrap();
        let outcomes = drain(&mut bridge, &mut world, 1).await;
        assert_eq!(outcomes, vec![ReplyOutcome::Stale { seq: first }]);
        assert!(world.controls.up && !world.controls.down);
        assert_eq!(bridge.last_applied(), Some(second));
    }

    #[tokio::test]
    async fn test_last_write_wins_applies_late_reply() {
        let (service, mut gates) = GatedService::new(2);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::LastWriteWins));
        let mut world = world();

        let first = bridge.send(StateSnapshot::capture(&world));
        bridge.send(StateSnapshot::capture(&world));
        let late = gates.remove(0);
        gates.remove(0).send("up".into()).unwrap();
        drain(&mut bridge, &mut world, 1).await;

        late.send("down".into()).unwrap();
        let outcomes = drain(&mut bridge, &mut world, 1).await;
        assert_eq!(outcomes, vec![ReplyOutcome::Applied { seq: first, action: Action::Down }]);
        assert!(world.controls.down && !world.controls.up);
    }

    #[tokio::test]
    async fn test_unknown_action_clears_flags() {
        let (service, mut gates) = GatedService::new(1);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::Sequenced));
        let mut world = world();
        world.apply_action(Action::Left);

        let seq = bridge.send(StateSnapshot::capture(&world));
        gates.remove(0).send(r#"{"move":"teleport"}"#.into()).unwrap();
        let outcomes = drain(&mut bridge, &mut world, 1).await;

        assert_eq!(
            outcomes,
            vec![ReplyOutcome::Malformed {
                seq,
                label: "teleport".into()
            }]
        );
        assert!(world.controls.is_idle());
        assert_eq!(world.agent.velocity, Vec2::ZERO);
    }

    #[tokio::test]
    async fn test_reply_after_respawn_steers_new_agent() {
        let (service, mut gates) = GatedService::new(1);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::Sequenced));
        let mut world = world();

        bridge.send(StateSnapshot::capture(&world));
        world.agent.kill().unwrap();
        world.respawn();
        assert!(world.agent.is_alive());

        gates.remove(0).send("right".into()).unwrap();
        drain(&mut bridge, &mut world, 1).await;
        assert_eq!(world.agent.velocity, Vec2::new(1.0, 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_flags_unchanged() {
        // No gates: the service never answers
        let (service, _gates) = GatedService::new(0);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::Sequenced));
        let mut world = world();
        world.apply_action(Action::Down);

        let seq = bridge.send(StateSnapshot::capture(&world));
        let outcomes = drain(&mut bridge, &mut world, 1).await;

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(&outcomes[0], ReplyOutcome::Unavailable { seq: s, .. } if *s == seq));
        assert!(world.controls.down);
        assert_eq!(bridge.last_applied(), None);
    }

    #[tokio::test]
    async fn test_dropped_gate_is_unavailable() {
        let (service, mut gates) = GatedService::new(1);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::Sequenced));
        let mut world = world();

        bridge.send(StateSnapshot::capture(&world));
        drop(gates.remove(0));
        let outcomes = drain(&mut bridge, &mut world, 1).await;
        assert!(matches!(outcomes[0], ReplyOutcome::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_maybe_send_respects_interval() {
        let (service, _gates) = GatedService::new(0);
        let mut bridge = Bridge::new(service, Handle::current(), &settings(ResponseOrdering::Sequenced));
        let world = world();
        let start = Instant::now();

        assert_eq!(bridge.maybe_send(&world, start), Some(1));
        assert_eq!(bridge.maybe_send(&world, start + Duration::from_millis(50)), None);
        assert_eq!(bridge.maybe_send(&world, start + Duration::from_millis(100)), Some(2));
    }
}
