//! Event gating
//!
//! Last stage before the event stream: a cooldown ledger keyed by scope
//! and kind throttles the discrete gestures, and a debounced attention
//! flag suppresses everything the operator did not mean for the machine.
//! Drag sessions are tracked by what actually got emitted, so a session
//! either appears complete in the stream or not at all.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::PipelineConfig;
use crate::events::{GestureEvent, GestureKind};
use crate::pipeline::tracker::HandId;

/// Which actor an event candidate belongs to, for cooldown bookkeeping.
/// Two-hand gestures share one scope; everything else is per hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventScope {
    Hand(HandId),
    Pair,
}

/// An event the classifier wants to emit, before gating.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub scope: EventScope,
    pub event: GestureEvent,
}

#[derive(Debug, Default)]
struct AttentionState {
    attending: bool,
    attend_streak: u32,
    absent_streak: u32,
}

#[derive(Debug, Default)]
pub struct EventGate {
    /// Timestamp of the last emission per (scope, kind), in ms.
    last_fired: HashMap<(EventScope, GestureKind), f64>,
    attention: AttentionState,
    /// Hands with an emitted `DragStart` that has not been closed yet.
    active_drags: HashSet<HandId>,
}

impl EventGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one frame's attention signal into the debouncer. A missing
    /// signal counts as looking away.
    pub fn observe_attention(&mut self, signal: Option<bool>, config: &PipelineConfig) {
        if signal.unwrap_or(false) {
            self.attention.attend_streak += 1;
            self.attention.absent_streak = 0;
            if !self.attention.attending && self.attention.attend_streak >= config.attention_on_frames {
                debug!("attention acquired after {} frames", self.attention.attend_streak);
                self.attention.attending = true;
            }
        } else {
            self.attention.absent_streak += 1;
            self.attention.attend_streak = 0;
            if self.attention.attending && self.attention.absent_streak >= config.attention_off_frames {
                debug!("attention lost after {} frames", self.attention.absent_streak);
                self.attention.attending = false;
            }
        }
    }

    pub fn is_attending(&self, config: &PipelineConfig) -> bool {
        !config.attention_required || self.attention.attending
    }

    /// Applies attention and cooldown rules to this frame's candidates and
    /// returns what actually goes out, in candidate order.
    pub fn filter(
        &mut self,
        candidates: Vec<Candidate>,
        timestamp_ms: f64,
        config: &PipelineConfig,
    ) -> Vec<GestureEvent> {
        let attending = self.is_attending(config);
        let mut events = Vec::new();
        for Candidate { scope, event } in candidates {
            let kind = event.kind();
            match kind {
                GestureKind::DragStart => {
                    if attending {
                        if let EventScope::Hand(id) = scope {
                            self.active_drags.insert(id);
                        }
                        events.push(event);
                    } else {
                        debug!("suppressed dragStart from {:?} without attention", scope);
                    }
                }
                // Moves and ends follow the emitted start, not attention:
                // a session that began must finish, one that never began
                // must stay invisible.
                GestureKind::DragMove => {
                    if matches!(scope, EventScope::Hand(id) if self.active_drags.contains(&id)) {
                        events.push(event);
                    }
                }
                GestureKind::DragEnd => {
                    if let EventScope::Hand(id) = scope {
                        if self.active_drags.remove(&id) {
                            events.push(event);
                        }
                    }
                }
                _ if kind.is_discrete() => {
                    if !attending {
                        continue;
                    }
                    let key = (scope, kind);
                    let ready = self
                        .last_fired
                        .get(&key)
                        .map_or(true, |last| timestamp_ms - last >= config.cooldown_ms);
                    if ready {
                        self.last_fired.insert(key, timestamp_ms);
                        events.push(event);
                    } else {
                        debug!("cooldown swallowed {} from {:?}", kind, scope);
                    }
                }
                _ => {
                    if attending {
                        events.push(event);
                    }
                }
            }
        }
        events
    }

    /// Drops the cooldown entries of an expired identity; its id never
    /// comes back. The drag session table is left alone so a close-out
    /// `DragEnd` for the same hand still flows through [`EventGate::filter`].
    pub fn forget_hand(&mut self, id: HandId) {
        self.last_fired
            .retain(|(scope, _), _| *scope != EventScope::Hand(id));
    }

    /// Clears the ledger, sessions and attention state.
    pub fn reset(&mut self) {
        self.last_fired.clear();
        self.active_drags.clear();
        self.attention = AttentionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::landmarks::{keypoints, FrameSnapshot, HandSnapshot, Keypoint};
    use crate::pipeline::GesturePipeline;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn relaxed() -> PipelineConfig {
        PipelineConfig {
            attention_required: false,
            ..PipelineConfig::default()
        }
    }

    fn hand(n: u64) -> EventScope {
        EventScope::Hand(HandId(n))
    }

    fn cand(scope: EventScope, event: GestureEvent) -> Vec<Candidate> {
        vec![Candidate { scope, event }]
    }

    fn warm_attention(gate: &mut EventGate, cfg: &PipelineConfig) {
        for _ in 0..cfg.attention_on_frames {
            gate.observe_attention(Some(true), cfg);
        }
    }

    /// Minimal clicking pose for driving a whole pipeline: 100px hand
    /// scale, thumb and index tips nearly touching, the rest spread flat.
    fn clicking_hand(cx: f64, cy: f64, ts: f64) -> HandSnapshot {
        let mut k: Vec<Keypoint> = (0..21).map(|i| Keypoint::new(cx + i as f64 * 4.0, cy)).collect();
        k[keypoints::WRIST] = Keypoint::new(cx, cy + 100.0);
        k[keypoints::MIDDLE_MCP] = Keypoint::new(cx, cy);
        k[keypoints::THUMB_TIP] = Keypoint::new(cx + 10.0, cy - 40.0);
        k[keypoints::INDEX_TIP] = Keypoint::new(cx + 20.0, cy - 40.0);
        HandSnapshot::from_keypoints(k, ts)
    }

    #[test]
    fn test_cooldown_blocks_rapid_refire() {
        let mut gate = EventGate::new();
        let cfg = relaxed();

        let first = gate.filter(cand(hand(0), GestureEvent::Click), 1000.0, &cfg);
        assert_eq!(first, vec![GestureEvent::Click]);

        let blocked = gate.filter(cand(hand(0), GestureEvent::Click), 1100.0, &cfg);
        assert_eq!(blocked, vec![], "100ms is inside the 250ms cooldown");

        let again = gate.filter(cand(hand(0), GestureEvent::Click), 1260.0, &cfg);
        assert_eq!(again, vec![GestureEvent::Click], "cooldown measured from the last emission");
    }

    #[test]
    fn test_cooldown_is_per_kind() {
        let mut gate = EventGate::new();
        let cfg = relaxed();
        gate.filter(cand(hand(0), GestureEvent::Click), 1000.0, &cfg);
        let other = gate.filter(cand(hand(0), GestureEvent::PauseToggle), 1000.0, &cfg);
        assert_eq!(other, vec![GestureEvent::PauseToggle], "kinds cool down independently");
    }

    #[test]
    fn test_cooldown_is_per_scope() {
        let mut gate = EventGate::new();
        let cfg = relaxed();
        gate.filter(cand(hand(0), GestureEvent::Click), 1000.0, &cfg);
        let other_hand = gate.filter(cand(hand(1), GestureEvent::Click), 1000.0, &cfg);
        assert_eq!(other_hand, vec![GestureEvent::Click], "hands cool down independently");
    }

    #[test]
    fn test_continuous_events_skip_the_ledger() {
        let mut gate = EventGate::new();
        let cfg = relaxed();
        for _ in 0..3 {
            let events = gate.filter(
                cand(hand(0), GestureEvent::CursorMove { x: 1.0, y: 2.0 }),
                1000.0,
                &cfg,
            );
            assert_eq!(events.len(), 1, "cursor moves are never throttled");
        }
    }

    #[test]
    fn test_attention_debounces_on() {
        let mut gate = EventGate::new();
        let cfg = config();

        gate.observe_attention(Some(true), &cfg);
        gate.observe_attention(Some(true), &cfg);
        assert!(!gate.is_attending(&cfg), "two frames is below attention_on_frames");
        let early = gate.filter(cand(hand(0), GestureEvent::Click), 1000.0, &cfg);
        assert_eq!(early, vec![], "no emission before attention is acquired");

        gate.observe_attention(Some(true), &cfg);
        assert!(gate.is_attending(&cfg));
        let now = gate.filter(cand(hand(0), GestureEvent::Click), 1033.0, &cfg);
        assert_eq!(now, vec![GestureEvent::Click]);
    }

    #[test]
    fn test_attention_debounces_off_and_ignores_flicker() {
        let mut gate = EventGate::new();
        let cfg = config();
        warm_attention(&mut gate, &cfg);

        for _ in 0..cfg.attention_off_frames - 1 {
            gate.observe_attention(Some(false), &cfg);
        }
        assert!(gate.is_attending(&cfg), "one frame short of the off debounce");

        // a single attending frame restarts the countdown
        gate.observe_attention(Some(true), &cfg);
        for _ in 0..cfg.attention_off_frames - 1 {
            gate.observe_attention(Some(false), &cfg);
        }
        assert!(gate.is_attending(&cfg), "the absent streak restarted");

        gate.observe_attention(Some(false), &cfg);
        assert!(!gate.is_attending(&cfg), "full off debounce reached");
    }

    #[test]
    fn test_missing_signal_counts_as_away() {
        let mut gate = EventGate::new();
        let cfg = config();
        warm_attention(&mut gate, &cfg);
        for _ in 0..cfg.attention_off_frames {
            gate.observe_attention(None, &cfg);
        }
        assert!(!gate.is_attending(&cfg), "absent estimator output is not attention");
    }

    #[test]
    fn test_drag_session_completes_through_attention_loss() {
        let mut gate = EventGate::new();
        let cfg = config();
        warm_attention(&mut gate, &cfg);

        let start = gate.filter(cand(hand(0), GestureEvent::DragStart), 1000.0, &cfg);
        assert_eq!(start, vec![GestureEvent::DragStart]);

        for _ in 0..cfg.attention_off_frames {
            gate.observe_attention(Some(false), &cfg);
        }
        assert!(!gate.is_attending(&cfg));

        let mv = gate.filter(cand(hand(0), GestureEvent::DragMove { x: 5.0, y: 6.0 }), 1300.0, &cfg);
        assert_eq!(mv.len(), 1, "an open session keeps flowing without attention");
        let click = gate.filter(cand(hand(0), GestureEvent::Click), 1300.0, &cfg);
        assert_eq!(click, vec![], "but new gestures stay suppressed");

        let end = gate.filter(cand(hand(0), GestureEvent::DragEnd), 1333.0, &cfg);
        assert_eq!(end, vec![GestureEvent::DragEnd], "the session must close in the stream");

        let after = gate.filter(cand(hand(0), GestureEvent::DragMove { x: 7.0, y: 8.0 }), 1366.0, &cfg);
        assert_eq!(after, vec![], "no session, no moves");
    }

    #[test]
    fn test_suppressed_drag_start_hides_whole_session() {
        let mut gate = EventGate::new();
        let cfg = config();
        // never attended
        assert_eq!(gate.filter(cand(hand(0), GestureEvent::DragStart), 1000.0, &cfg), vec![]);
        assert_eq!(
            gate.filter(cand(hand(0), GestureEvent::DragMove { x: 1.0, y: 1.0 }), 1033.0, &cfg),
            vec![],
            "a session whose start was suppressed stays invisible"
        );
        assert_eq!(gate.filter(cand(hand(0), GestureEvent::DragEnd), 1066.0, &cfg), vec![]);
    }

    #[test]
    fn test_attention_not_required_passes_everything() {
        let mut gate = EventGate::new();
        let cfg = relaxed();
        let events = gate.filter(cand(hand(0), GestureEvent::Confirm), 500.0, &cfg);
        assert_eq!(events, vec![GestureEvent::Confirm]);
    }

    #[test]
    fn test_reset_clears_ledger_and_sessions() {
        let mut gate = EventGate::new();
        let cfg = relaxed();
        gate.filter(cand(hand(0), GestureEvent::Click), 1000.0, &cfg);
        gate.filter(cand(hand(0), GestureEvent::DragStart), 1000.0, &cfg);

        gate.reset();

        let click = gate.filter(cand(hand(0), GestureEvent::Click), 1001.0, &cfg);
        assert_eq!(click, vec![GestureEvent::Click], "the cooldown ledger was cleared");
        let mv = gate.filter(cand(hand(0), GestureEvent::DragMove { x: 0.0, y: 0.0 }), 1001.0, &cfg);
        assert_eq!(mv, vec![], "sessions do not survive a reset");
    }

    #[test]
    fn test_forget_hand_evicts_only_that_scope() {
        let mut gate = EventGate::new();
        let cfg = relaxed();
        gate.filter(cand(hand(0), GestureEvent::Click), 1000.0, &cfg);
        gate.filter(cand(hand(1), GestureEvent::Click), 1000.0, &cfg);

        gate.forget_hand(HandId(1));
        assert_eq!(gate.last_fired.len(), 1, "only the dead hand's entries go");

        let blocked = gate.filter(cand(hand(0), GestureEvent::Click), 1100.0, &cfg);
        assert_eq!(blocked, vec![], "the surviving hand keeps its cooldown");
    }

    #[test]
    fn test_identity_churn_does_not_grow_the_ledger() {
        let mut pipeline = GesturePipeline::new(relaxed()).expect("test config must validate");
        let grace = relaxed().identity_grace_frames;
        let mut ts = 0.0;
        for round in 0..25u64 {
            let clicked =
                pipeline.tick(&FrameSnapshot::new(vec![clicking_hand(320.0, 240.0, ts)], 640, 480, ts));
            assert_eq!(clicked, vec![GestureEvent::Click], "round {round} should click once");
            for _ in 0..=grace {
                ts += 33.0;
                pipeline.tick(&FrameSnapshot::empty(640, 480, ts));
            }
            ts += 33.0;
            assert!(
                pipeline.gate.last_fired.is_empty(),
                "round {round} left {} cooldown entries for dead hands",
                pipeline.gate.last_fired.len()
            );
        }
        assert_eq!(pipeline.stats().identities_expired, 25);
    }
}
