//! Mock implementations for testing
//!
//! `ManualScheduler` stands in for the wall clock: timers are recorded and
//! only fire when a test asks for it.

use super::traits::Scheduler;
use super::{spawn_simulator, SimulatorEvent, SimulatorHandle, Snapshot};
use crate::state_machine::{DemoContext, Event, Phase};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Manual Scheduler
// ============================================================================

struct PendingTimer {
    delay: Duration,
    event: Event,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

/// Scheduler whose timers fire only via `fire_next`
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<VecDeque<PendingTimer>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays of armed, non-cancelled timers in scheduling order
    pub fn pending_delays(&self) -> Vec<Duration> {
        self.timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.cancel.is_cancelled())
            .map(|t| t.delay)
            .collect()
    }

    /// Fire the oldest timer. Cancelled timers are skipped; returns the
    /// event delivered, if any.
    pub async fn fire_next(&self) -> Option<Event> {
        loop {
            let timer = self.timers.lock().unwrap().pop_front()?;
            if timer.cancel.is_cancelled() {
                continue;
            }
            timer.tx.send(timer.event.clone()).await.ok()?;
            return Some(timer.event);
        }
    }

    /// Fire the oldest timer even if it was cancelled (simulates a late wakeup)
    pub async fn fire_next_ignoring_cancel(&self) -> Option<Event> {
        let timer = self.timers.lock().unwrap().pop_front()?;
        timer.tx.send(timer.event.clone()).await.ok()?;
        Some(timer.event)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(
        &self,
        delay: Duration,
        event: Event,
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) {
        self.timers.lock().unwrap().push_back(PendingTimer {
            delay,
            event,
            tx,
            cancel,
        });
    }
}

// ============================================================================
// Test Simulator
// ============================================================================

/// A running simulator wired to a manual scheduler
pub struct TestSimulator {
    pub handle: SimulatorHandle,
    pub scheduler: ManualScheduler,
    pub events: broadcast::Receiver<SimulatorEvent>,
}

impl TestSimulator {
    pub fn new() -> Self {
        Self::with_context(DemoContext::new("test-session"))
    }

    pub fn with_context(context: DemoContext) -> Self {
        let scheduler = ManualScheduler::new();
        let handle = spawn_simulator(context, scheduler.clone());
        let events = handle.subscribe();
        Self {
            handle,
            scheduler,
            events,
        }
    }

    /// Wait for the next snapshot in `phase`
    pub async fn wait_for_phase(&mut self, phase: Phase, timeout: Duration) -> Option<Snapshot> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(SimulatorEvent::Snapshot(s))) if s.phase == phase => return Some(s),
                _ => continue,
            }
        }
        None
    }

    /// Wait for the next `TurnSettled` notification, returning the rule name
    pub async fn wait_for_settled(&mut self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(SimulatorEvent::TurnSettled { rule, .. })) => return Some(rule),
                _ => continue,
            }
        }
        None
    }

    /// Submit `text` and drive both settle timers to completion
    pub async fn run_turn(&mut self, text: &str) -> String {
        self.handle.submit(text).await.unwrap();
        assert!(self.wait_for_phase(Phase::Searching, WAIT).await.is_some());
        self.scheduler.fire_next().await.unwrap();
        assert!(self.wait_for_phase(Phase::Typing, WAIT).await.is_some());
        self.scheduler.fire_next().await.unwrap();
        self.wait_for_settled(WAIT).await.unwrap()
    }
}

impl Default for TestSimulator {
    fn default() -> Self {
        Self::new()
    }
}

const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TopicTag;
    use crate::config::OutputMode;
    use crate::runtime::TokioScheduler;
    use crate::shell::{render_stream, Renderer};
    use crate::state_machine::Speaker;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_turn_walks_every_phase() {
        let mut sim = TestSimulator::new();
        sim.handle.submit("What's going on with supply chains?").await.unwrap();

        let searching = sim.wait_for_phase(Phase::Searching, WAIT).await.unwrap();
        assert_eq!(searching.transcript.len(), 1);
        assert_eq!(searching.transcript[0].speaker, Speaker::User);
        assert_eq!(sim.scheduler.pending_delays(), vec![Duration::from_millis(800)]);

        sim.scheduler.fire_next().await.unwrap();
        let typing = sim.wait_for_phase(Phase::Typing, WAIT).await.unwrap();
        assert_eq!(typing.transcript.len(), 1);
        assert_eq!(sim.scheduler.pending_delays(), vec![Duration::from_millis(1000)]);

        sim.scheduler.fire_next().await.unwrap();
        let idle = sim.wait_for_phase(Phase::Idle, WAIT).await.unwrap();
        assert_eq!(idle.transcript.len(), 2);
        let bot = &idle.transcript[1];
        assert_eq!(bot.speaker, Speaker::Bot);
        assert!(bot.text.contains("demand forecasting"));
        assert_eq!(
            bot.sources,
            vec!["AI Revolutionizes Global Supply Chains, Report Finds".to_string()]
        );
        assert_eq!(idle.last_topic, Some(TopicTag::Business));
        assert!(sim.scheduler.pending_delays().is_empty());
    }

    #[tokio::test]
    async fn test_blank_submit_changes_nothing() {
        let mut sim = TestSimulator::new();
        sim.handle.submit("   ").await.unwrap();
        sim.handle.submit("").await.unwrap();

        // A real turn afterwards proves the blank ones were skipped, not queued
        assert_eq!(sim.run_turn("Is there a podcast?").await, "podcast");
        let snapshot = sim.handle.snapshot();
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.transcript[0].text, "Is there a podcast?");
        assert_eq!(snapshot.queued, 0);
    }

    #[tokio::test]
    async fn test_keynote_followup_uses_memory() {
        let mut sim = TestSimulator::new();
        assert_eq!(
            sim.run_turn("What happened at the Innovate Summit?").await,
            "innovate_summit"
        );
        assert_eq!(
            sim.run_turn("Who was the keynote speaker?").await,
            "keynote_followup"
        );
        assert_eq!(sim.handle.snapshot().transcript.len(), 4);
    }

    #[tokio::test]
    async fn test_keynote_first_falls_back() {
        let mut sim = TestSimulator::new();
        assert_eq!(sim.run_turn("Who was the keynote speaker?").await, "fallback");
        let snapshot = sim.handle.snapshot();
        assert!(snapshot.transcript[1].sources.is_empty());
        assert_eq!(snapshot.last_topic, None);
    }

    #[tokio::test]
    async fn test_briefing_beats_health() {
        let mut sim = TestSimulator::new();
        assert_eq!(sim.run_turn("Create a health briefing").await, "briefing");
        assert_eq!(sim.handle.snapshot().last_topic, Some(TopicTag::Briefing));
    }

    #[tokio::test]
    async fn test_fallback_clears_memory() {
        let mut sim = TestSimulator::new();
        sim.run_turn("Any vaccine news?").await;
        assert_eq!(sim.handle.snapshot().last_topic, Some(TopicTag::Health));
        sim.run_turn("Tell me a joke").await;
        assert_eq!(sim.handle.snapshot().last_topic, None);
    }

    #[tokio::test]
    async fn test_busy_submissions_queue_fifo() {
        let mut sim = TestSimulator::new();
        sim.handle.submit("What happened at the Innovate Summit?").await.unwrap();
        sim.wait_for_phase(Phase::Searching, WAIT).await.unwrap();

        sim.handle.submit("Who was the keynote speaker?").await.unwrap();
        sim.handle.submit("Is there a podcast?").await.unwrap();

        // Queued turns are not in the transcript yet
        let mut queued = 0;
        while queued < 2 {
            if let Ok(Ok(SimulatorEvent::Snapshot(s))) =
                tokio::time::timeout(WAIT, sim.events.recv()).await
            {
                assert_eq!(s.transcript.len(), 1);
                queued = s.queued;
            } else {
                panic!("no queue snapshot");
            }
        }

        // Each queued turn starts only after the previous one settles
        for expected_queue in [1, 0] {
            sim.scheduler.fire_next().await.unwrap();
            sim.wait_for_phase(Phase::Typing, WAIT).await.unwrap();
            sim.scheduler.fire_next().await.unwrap();
            let next = sim.wait_for_phase(Phase::Searching, WAIT).await.unwrap();
            assert_eq!(next.queued, expected_queue);
        }
        sim.scheduler.fire_next().await.unwrap();
        sim.wait_for_phase(Phase::Typing, WAIT).await.unwrap();
        sim.scheduler.fire_next().await.unwrap();
        sim.wait_for_phase(Phase::Idle, WAIT).await.unwrap();

        let snapshot = sim.handle.snapshot();
        let speakers: Vec<_> = snapshot.transcript.iter().map(|t| t.speaker).collect();
        assert_eq!(
            speakers,
            [
                Speaker::User,
                Speaker::Bot,
                Speaker::User,
                Speaker::Bot,
                Speaker::User,
                Speaker::Bot
            ]
        );
        assert_eq!(snapshot.transcript[2].text, "Who was the keynote speaker?");
        assert!(snapshot.transcript[3].text.contains("Dr. Aris Thorne"));
        assert_eq!(snapshot.transcript[4].text, "Is there a podcast?");
        assert!(snapshot.transcript[5].text.contains("Tech Forward Weekly"));
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.queued, 0);
    }

    #[tokio::test]
    async fn test_reset_restores_fresh_state() {
        let mut sim = TestSimulator::new();
        sim.run_turn("What happened at the Innovate Summit?").await;
        sim.handle.reset().await.unwrap();

        let snapshot = sim.wait_for_phase(Phase::Idle, WAIT).await.unwrap();
        assert_eq!(snapshot, Snapshot::default());

        // Memory is gone: the follow-up no longer resolves
        assert_eq!(sim.run_turn("Who was the keynote speaker?").await, "fallback");
    }

    #[tokio::test]
    async fn test_reset_mid_turn_ignores_late_timer() {
        let mut sim = TestSimulator::new();
        sim.handle.submit("Is there a podcast?").await.unwrap();
        sim.wait_for_phase(Phase::Searching, WAIT).await.unwrap();
        sim.handle.submit("queued and then dropped").await.unwrap();

        sim.handle.reset().await.unwrap();
        let snapshot = sim.wait_for_phase(Phase::Idle, WAIT).await.unwrap();
        assert_eq!(snapshot, Snapshot::default());
        assert!(sim.scheduler.pending_delays().is_empty());

        // The disarmed timer wakes up anyway; the runtime must drop it
        sim.scheduler.fire_next_ignoring_cancel().await.unwrap();
        assert!(sim.wait_for_phase(Phase::Typing, Duration::from_millis(200)).await.is_none());
        assert_eq!(sim.handle.snapshot(), Snapshot::default());
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let mut sim = TestSimulator::new();
        sim.handle.reset().await.unwrap();
        sim.handle.reset().await.unwrap();
        sim.wait_for_phase(Phase::Idle, WAIT).await.unwrap();
        assert_eq!(sim.handle.snapshot(), Snapshot::default());
    }

    #[tokio::test]
    async fn test_custom_delays_are_scheduled() {
        let ctx = DemoContext::new("custom")
            .with_delays(Duration::from_millis(5), Duration::from_millis(7));
        let mut sim = TestSimulator::with_context(ctx);
        sim.handle.submit("hello").await.unwrap();
        sim.wait_for_phase(Phase::Searching, WAIT).await.unwrap();
        assert_eq!(sim.scheduler.pending_delays(), vec![Duration::from_millis(5)]);
    }

    /// End to end with real tokio timers and short delays
    #[tokio::test]
    async fn test_tokio_scheduler_completes_turn() {
        let ctx = DemoContext::new("tokio")
            .with_delays(Duration::from_millis(10), Duration::from_millis(10));
        let handle = spawn_simulator(ctx, TokioScheduler);
        let mut events = handle.subscribe();
        handle.submit("What happened at the Innovate Summit?").await.unwrap();

        let mut phases = Vec::new();
        let rule = loop {
            match tokio::time::timeout(WAIT, events.recv()).await {
                Ok(Ok(SimulatorEvent::Snapshot(s))) => phases.push(s.phase),
                Ok(Ok(SimulatorEvent::TurnSettled { rule, .. })) => break rule,
                other => panic!("unexpected: {other:?}"),
            }
        };
        assert_eq!(rule, "innovate_summit");
        assert_eq!(phases, [Phase::Searching, Phase::Typing, Phase::Idle]);
        assert_eq!(handle.snapshot().transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_settle_waits_for_turn_in_flight() {
        let mut sim = TestSimulator::new();
        sim.handle.submit("   ").await.unwrap();
        let snapshot = tokio::time::timeout(WAIT, sim.handle.settle())
            .await
            .unwrap()
            .unwrap();
        assert!(snapshot.transcript.is_empty());

        sim.handle.submit("Is there a podcast?").await.unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(50), sim.handle.settle())
                .await
                .is_err(),
            "settle returned while the turn was searching"
        );

        sim.scheduler.fire_next().await.unwrap();
        sim.wait_for_phase(Phase::Typing, WAIT).await.unwrap();
        sim.scheduler.fire_next().await.unwrap();

        let snapshot = tokio::time::timeout(WAIT, sim.handle.settle())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.transcript[1].speaker, Speaker::Bot);
    }

    /// Input that ends right after submitting still gets every answer rendered
    #[tokio::test]
    async fn test_closing_input_renders_queued_answers() {
        let ctx = DemoContext::new("piped")
            .with_delays(Duration::from_millis(5), Duration::from_millis(5));
        let handle = spawn_simulator(ctx, TokioScheduler);
        let output = render_stream(handle.subscribe(), Renderer::new(OutputMode::Text));

        handle
            .submit("What happened at the Innovate Summit?")
            .await
            .unwrap();
        handle.submit("Who was the keynote speaker?").await.unwrap();

        let snapshot = tokio::time::timeout(WAIT, handle.settle())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.transcript.len(), 4);
        assert_eq!(snapshot.queued, 0);
        drop(handle);

        // The stream ends once the runtime exits
        let lines: Vec<String> = tokio::time::timeout(WAIT, output.collect::<Vec<_>>())
            .await
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let answers: Vec<&String> = lines.iter().filter(|l| l.starts_with("bot> ")).collect();
        assert_eq!(answers.len(), 2, "rendered: {lines:?}");
        assert!(answers[0].contains("Innovate Summit"));
    }

    #[tokio::test]
    async fn test_runtime_outlives_dropped_clone() {
        let sim = TestSimulator::new();
        let handle = sim.handle.clone();
        drop(sim);
        // Another handle is still alive, so the runtime keeps accepting input
        assert!(handle.submit("still here").await.is_ok());
    }

    #[test]
    fn test_event_serialization() {
        let event = SimulatorEvent::TurnSettled {
            turn_id: "t1".into(),
            rule: "podcast".into(),
            topic: Some(TopicTag::Podcast),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"type": "turn_settled", "turn_id": "t1", "rule": "podcast", "topic": "podcast"})
        );

        let snapshot = serde_json::to_value(SimulatorEvent::Snapshot(Snapshot::default())).unwrap();
        assert_eq!(snapshot["type"], "snapshot");
        assert_eq!(snapshot["phase"], "idle");
        assert_eq!(snapshot["queued"], 0);
    }
}
