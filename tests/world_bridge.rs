//! Full loop: world ticks while the bridge exports state and applies replies

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use maze_runner::bridge::{DecisionFuture, DecisionService, StateSnapshot};
use maze_runner::policy::RandomPolicy;
use maze_runner::sim::{HazardCollisionPolicy, Level, Rect, Rules, SimEvent};
use maze_runner::{Bridge, BridgeSettings, FadeMode, SimulationWorld, tick};
use tokio::runtime::Handle;

/// Always answers with the same label and counts requests
struct Scripted {
    label: &'static str,
    requests: AtomicUsize,
}

impl DecisionService for Scripted {
    fn decide(&self, snapshot: StateSnapshot) -> DecisionFuture {
        self.requests.fetch_add(1, Ordering::SeqCst);
        assert!(snapshot.distances.to_goal >= 0.0);
        let body = format!(r#"{{"move":"{}"}}"#, self.label);
        Box::pin(async move { Ok(body) })
    }
}

fn fast_bridge_settings() -> BridgeSettings {
    BridgeSettings {
        request_interval_ms: 5,
        timeout_ms: 500,
        ..BridgeSettings::default()
    }
}

fn level_one_world(rules: Rules) -> SimulationWorld {
    let level = Level::level_one().unwrap();
    SimulationWorld::from_level(&level, rules)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scripted_service_walks_agent_to_goal() {
    let service = Arc::new(Scripted {
        label: "right",
        requests: AtomicUsize::new(0),
    });
    let mut bridge = Bridge::new(service.clone(), Handle::current(), &fast_bridge_settings());
    let mut world = level_one_world(Rules {
        fade: FadeMode::Instant,
        ..Rules::default()
    });

    let mut events = Vec::new();
    for _ in 0..5_000 {
        bridge.poll(&mut world);
        bridge.maybe_send(&world, Instant::now());
        if let Some(event) = tick(&mut world) {
            events.push(event);
        }
        if world.stats.wins >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(world.stats.wins, 1);
    assert!(events.iter().any(|e| matches!(e, SimEvent::GoalReached { .. })));
    assert!(events.contains(&SimEvent::Respawned { after_win: true }));
    assert_eq!(world.agent.position, world.spawn_point());
    assert!(service.requests.load(Ordering::SeqCst) > 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_random_policy_never_enters_walls() {
    let mut bridge = Bridge::new(Arc::new(RandomPolicy::new(42)), Handle::current(), &fast_bridge_settings());
    let mut world = level_one_world(Rules {
        fade: FadeMode::Instant,
        hazard_collision: HazardCollisionPolicy::KillOnContact,
        human_control: false,
    });

    for _ in 0..1_500 {
        bridge.poll(&mut world);
        bridge.maybe_send(&world, Instant::now());
        tick(&mut world);

        // Shrunk by float slack; touching a wall is allowed
        let raw = world.agent.bounds();
        let bounds = Rect::new(raw.origin + 1e-3, raw.extent - 2e-3);
        for obstacle in world.obstacles() {
            assert!(
                !obstacle.bounds.overlaps(&bounds),
                "agent {:?} inside wall {:?} at frame {}",
                bounds,
                obstacle.bounds,
                world.frame
            );
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(world.frame, 1_500);
}
