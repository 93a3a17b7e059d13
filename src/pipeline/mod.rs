//! The gesture pipeline
//!
//! One synchronous tick per camera frame: snapshots are validated, hands
//! are matched to identities, shapes are extracted and smoothed, the
//! per-hand machines (or the two-hand tracker) propose events, and the
//! gate decides what reaches the stream. No stage looks ahead, so a
//! recorded session replays to the byte.

pub mod classifier;
pub mod gate;
pub mod shape;
pub mod smoothing;
pub mod tracker;

pub use classifier::{GestureState, HandObservation, HandShapeState, PairTracker, PinchPhase};
pub use gate::{Candidate, EventGate, EventScope};
pub use shape::{ShapeDescriptor, StaticShape};
pub use smoothing::PositionSmoother;
pub use tracker::{HandId, HandRole, HandTracker, TrackedHand};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConfigError, PipelineConfig};
use crate::events::GestureEvent;
use crate::landmarks::{keypoints, FrameSnapshot, HandSnapshot};

/// Running totals since construction or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub ticks: u64,
    pub events_emitted: u64,
    pub malformed_hands: u64,
    pub identities_spawned: u64,
    pub identities_expired: u64,
}

/// The full recognizer. Feed it frames in order; it hands back the events
/// the executor should act on.
pub struct GesturePipeline {
    config: PipelineConfig,
    tracker: HandTracker,
    pair: PairTracker,
    gate: EventGate,
    stats: PipelineStats,
    tick_count: u64,
}

impl GesturePipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            tracker: HandTracker::new(),
            pair: PairTracker::new(),
            gate: EventGate::new(),
            stats: PipelineStats::default(),
            tick_count: 0,
        })
    }

    /// Processes one frame and returns the emitted events in order.
    pub fn tick(&mut self, frame: &FrameSnapshot) -> Vec<GestureEvent> {
        let tick = self.tick_count;
        self.tick_count += 1;
        self.stats.ticks += 1;

        self.gate.observe_attention(frame.attention, &self.config);

        let mut valid: Vec<&HandSnapshot> = Vec::with_capacity(frame.hands.len());
        for hand in &frame.hands {
            if hand.is_well_formed() {
                valid.push(hand);
            } else {
                self.stats.malformed_hands += 1;
                debug!("dropping malformed hand snapshot at t={}ms", frame.timestamp_ms);
            }
        }

        let update = self
            .tracker
            .update(&valid, f64::from(frame.frame_width), &self.config);
        self.stats.identities_spawned += update.spawned as u64;
        self.stats.identities_expired += update.expired.len() as u64;

        let mut candidates: Vec<Candidate> = Vec::new();
        for dead in &update.expired {
            self.gate.forget_hand(dead.id);
            if let Some(event) = classifier::close_out(&dead.gesture, dead.id) {
                candidates.push(Candidate {
                    scope: EventScope::Hand(dead.id),
                    event,
                });
            }
        }

        // Shape extraction plus a smoother sample per assigned hand. The
        // index fingertip is the control point for every pointer-like
        // gesture, so it is what gets smoothed. A hand whose geometry does
        // not read this frame keeps its identity but classifies as nothing.
        let mut prepared: Vec<(HandId, ShapeDescriptor)> = Vec::with_capacity(update.assigned.len());
        for (id, idx) in &update.assigned {
            let snapshot = valid[*idx];
            let Some(shape) = ShapeDescriptor::extract(snapshot, &self.config) else {
                debug!("{} is too collapsed to classify at t={}ms", id, frame.timestamp_ms);
                continue;
            };
            let Some(hand) = self.tracker.get_mut(*id) else {
                continue;
            };
            let control = &snapshot.keypoints[keypoints::INDEX_TIP];
            hand.smoother.push(control.x, control.y, frame.timestamp_ms);
            prepared.push((*id, shape));
        }

        // Two hands that are each pinching or presenting open palms, with
        // no drag running, switch the frame into pair mode.
        let pair_ready = prepared.len() == 2
            && prepared.iter().all(|(id, shape)| {
                self.tracker.get(*id).is_some_and(|hand| {
                    !hand.gesture.drag_active
                        && (hand.gesture.pinch == PinchPhase::Pinched
                            || shape.static_shape() == Some(StaticShape::Palm))
                })
            });

        if pair_ready {
            for (id, shape) in &prepared {
                if let Some(hand) = self.tracker.get_mut(*id) {
                    classifier::maintain_pinch(&mut hand.gesture, *id, shape, &self.config);
                }
            }
            // prepared is primary-first, so the pair sees a stable order
            let anchors = (
                self.tracker.get(prepared[0].0).map(|h| h.last_position),
                self.tracker.get(prepared[1].0).map(|h| h.last_position),
            );
            if let (Some(primary), Some(secondary)) = anchors {
                for event in self.pair.step(primary, secondary, &self.config) {
                    candidates.push(Candidate {
                        scope: EventScope::Pair,
                        event,
                    });
                }
            }
        } else {
            self.pair.reset();
            for (id, shape) in &prepared {
                let Some(hand) = self.tracker.get_mut(*id) else {
                    continue;
                };
                let obs = HandObservation {
                    smoothed: hand.smoother.smoothed().unwrap_or(hand.last_position),
                    velocity: hand.smoother.velocity().unwrap_or((0.0, 0.0)),
                    step: hand.smoother.last_step(),
                };
                for event in
                    classifier::step_hand(&mut hand.gesture, *id, shape, &obs, tick, &self.config)
                {
                    candidates.push(Candidate {
                        scope: EventScope::Hand(*id),
                        event,
                    });
                }
            }
        }

        let events = self.gate.filter(candidates, frame.timestamp_ms, &self.config);
        self.stats.events_emitted += events.len() as u64;
        if !events.is_empty() {
            debug!("tick {} emitted {} events", tick, events.len());
        }
        events
    }

    /// Drops all state. Open drag sessions are closed in the returned
    /// events so downstream consumers are never left holding a payload.
    pub fn reset(&mut self) -> Vec<GestureEvent> {
        let mut candidates = Vec::new();
        for hand in self.tracker.drain() {
            if let Some(event) = classifier::close_out(&hand.gesture, hand.id) {
                candidates.push(Candidate {
                    scope: EventScope::Hand(hand.id),
                    event,
                });
            }
        }
        let events = self.gate.filter(candidates, 0.0, &self.config);
        self.gate.reset();
        self.pair.reset();
        self.stats = PipelineStats::default();
        self.tick_count = 0;
        events
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether events currently pass the attention gate.
    pub fn attending(&self) -> bool {
        self.gate.is_attending(&self.config)
    }
}
