//! Gesture classification
//!
//! Per-hand state machine that turns a stream of shape descriptors into
//! gesture events, plus the two-hand tracker for zoom and rotation. The
//! precedence order is fixed: an engaged pinch is serviced before anything
//! else, then an active drag, then pinch entry, then the static shapes.

use tracing::debug;

use crate::config::PipelineConfig;
use crate::events::GestureEvent;
use crate::pipeline::shape::{ShapeDescriptor, StaticShape};
use crate::pipeline::tracker::HandId;

/// Normalized thumb elevation at which a lone thumb reads as a verdict.
/// Between the two bounds the thumb is sideways and means nothing.
const THUMB_SIGNAL_MIN: f64 = 0.5;

/// Two coincident hands would make zoom factors blow up; separations are
/// clamped to this floor first.
const MIN_PAIR_SEPARATION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandShapeState {
    IdleOpen,
    Pointing,
    PinchHeld,
    FistDrag,
    Palm,
    ThumbUp,
    ThumbDown,
    PeaceDrag,
}

/// Pinch hysteresis phase. Entry and exit use different thresholds, so the
/// phase is explicit rather than derived from the current distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Idle,
    Pinched,
}

/// Cross-frame classifier state for one hand identity.
#[derive(Debug, Clone)]
pub struct GestureState {
    pub state: HandShapeState,
    pub pinch: PinchPhase,
    /// True between an emitted-candidate `DragStart` and its `DragEnd`.
    pub drag_active: bool,
    /// Tick of the most recent click, for double-click pairing.
    pub last_pinch_click_tick: Option<u64>,
    /// Signed horizontal travel accumulated toward a swipe, in pixels.
    pub swipe_travel: f64,
}

impl GestureState {
    pub fn new() -> Self {
        Self {
            state: HandShapeState::IdleOpen,
            pinch: PinchPhase::Idle,
            drag_active: false,
            last_pinch_click_tick: None,
            swipe_travel: 0.0,
        }
    }
}

impl Default for GestureState {
    fn default() -> Self {
        Self::new()
    }
}

/// Smoothed kinematics for one hand this frame. Velocity is zero and the
/// step absent until the smoother has enough history.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandObservation {
    /// Smoothed control-point position, in pixels.
    pub smoothed: (f64, f64),
    /// Smoothed velocity, in px/s.
    pub velocity: (f64, f64),
    /// Raw displacement since the previous frame, in pixels.
    pub step: Option<(f64, f64)>,
}

/// Advances one hand's state machine by a frame and returns its event
/// candidates, in emission order.
pub fn step_hand(
    gs: &mut GestureState,
    hand: HandId,
    shape: &ShapeDescriptor,
    obs: &HandObservation,
    tick: u64,
    config: &PipelineConfig,
) -> Vec<GestureEvent> {
    let mut events = Vec::new();

    // An engaged pinch owns the hand until it releases.
    if gs.pinch == PinchPhase::Pinched {
        maintain_pinch(gs, hand, shape, config);
        return events;
    }

    // A live drag survives unrecognized frames; only a different
    // recognized shape ends it, and that shape acts from the next frame.
    if gs.drag_active {
        match shape.static_shape() {
            Some(StaticShape::Peace) | None => {
                events.push(GestureEvent::DragMove {
                    x: obs.smoothed.0,
                    y: obs.smoothed.1,
                });
            }
            Some(_) => {
                gs.drag_active = false;
                transition(gs, hand, HandShapeState::IdleOpen);
                events.push(GestureEvent::DragEnd);
            }
        }
        return events;
    }

    if shape.pinch_distance < config.pinch_grab_threshold {
        gs.pinch = PinchPhase::Pinched;
        transition(gs, hand, HandShapeState::PinchHeld);
        let paired = gs
            .last_pinch_click_tick
            .is_some_and(|last| tick.saturating_sub(last) <= u64::from(config.double_pinch_frames));
        if paired {
            gs.last_pinch_click_tick = None;
            events.push(GestureEvent::DoubleClick);
        } else {
            gs.last_pinch_click_tick = Some(tick);
            events.push(GestureEvent::Click);
        }
        return events;
    }

    match shape.static_shape() {
        Some(StaticShape::Point) => {
            transition(gs, hand, HandShapeState::Pointing);
            events.push(GestureEvent::CursorMove {
                x: obs.smoothed.0,
                y: obs.smoothed.1,
            });
        }
        Some(StaticShape::Peace) => {
            transition(gs, hand, HandShapeState::PeaceDrag);
            gs.drag_active = true;
            events.push(GestureEvent::DragStart);
        }
        Some(StaticShape::Fist) => {
            transition(gs, hand, HandShapeState::FistDrag);
            let vy = obs.velocity.1;
            if vy.abs() >= config.scroll_min_velocity {
                // Hand moving down (y grows) scrolls content down: negative delta.
                events.push(GestureEvent::Scroll {
                    delta: -vy * config.scroll_gain,
                });
            }
        }
        Some(StaticShape::Palm) => {
            transition(gs, hand, HandShapeState::Palm);
            // Candidate every frame; the cooldown gate collapses the run.
            events.push(GestureEvent::PauseToggle);
        }
        Some(StaticShape::Thumb) => {
            if shape.thumb_elevation >= THUMB_SIGNAL_MIN {
                transition(gs, hand, HandShapeState::ThumbUp);
                events.push(GestureEvent::Confirm);
            } else if shape.thumb_elevation <= -THUMB_SIGNAL_MIN {
                transition(gs, hand, HandShapeState::ThumbDown);
                events.push(GestureEvent::Cancel);
            } else {
                transition(gs, hand, HandShapeState::IdleOpen);
            }
        }
        None => {
            transition(gs, hand, HandShapeState::IdleOpen);
            accumulate_swipe(gs, obs, config, &mut events);
        }
    }

    events
}

/// Releases an engaged pinch once the distance clears the release
/// threshold. Safe to call for any hand; does nothing when not pinched.
pub fn maintain_pinch(
    gs: &mut GestureState,
    hand: HandId,
    shape: &ShapeDescriptor,
    config: &PipelineConfig,
) {
    if gs.pinch == PinchPhase::Pinched && shape.pinch_distance > config.pinch_release_threshold {
        gs.pinch = PinchPhase::Idle;
        transition(gs, hand, HandShapeState::IdleOpen);
    }
}

/// Final event owed by a hand whose identity expired.
pub fn close_out(gs: &GestureState, hand: HandId) -> Option<GestureEvent> {
    if gs.drag_active {
        debug!("{} vanished mid-drag, closing the session", hand);
        Some(GestureEvent::DragEnd)
    } else {
        None
    }
}

fn transition(gs: &mut GestureState, hand: HandId, next: HandShapeState) {
    if gs.state == next {
        return;
    }
    debug!("{} {:?} -> {:?}", hand, gs.state, next);
    gs.swipe_travel = 0.0;
    gs.state = next;
}

/// Swipes only build while the hand stays unrecognized and fast; any slow
/// frame or direction flip restarts the run.
fn accumulate_swipe(
    gs: &mut GestureState,
    obs: &HandObservation,
    config: &PipelineConfig,
    events: &mut Vec<GestureEvent>,
) {
    let Some((dx, _)) = obs.step else {
        gs.swipe_travel = 0.0;
        return;
    };
    if obs.velocity.0.abs() < config.swipe_min_velocity {
        gs.swipe_travel = 0.0;
        return;
    }
    if gs.swipe_travel != 0.0 && gs.swipe_travel.signum() != dx.signum() {
        gs.swipe_travel = 0.0;
    }
    gs.swipe_travel += dx;
    if gs.swipe_travel.abs() >= config.swipe_min_distance {
        events.push(if gs.swipe_travel < 0.0 {
            GestureEvent::SwipeLeft
        } else {
            GestureEvent::SwipeRight
        });
        gs.swipe_travel = 0.0;
    }
}

/// Baseline-relative zoom and rotation for a qualified two-hand pair.
///
/// The first qualified frame only records the baseline. Afterwards each
/// axis fires once its change clears the deadband, then re-baselines so
/// continued motion keeps producing steps.
#[derive(Debug, Default)]
pub struct PairTracker {
    baseline: Option<PairBaseline>,
}

#[derive(Debug, Clone, Copy)]
struct PairBaseline {
    separation: f64,
    angle_deg: f64,
}

impl PairTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(
        &mut self,
        primary: (f64, f64),
        secondary: (f64, f64),
        config: &PipelineConfig,
    ) -> Vec<GestureEvent> {
        let dx = secondary.0 - primary.0;
        let dy = secondary.1 - primary.1;
        let separation = (dx * dx + dy * dy).sqrt().max(MIN_PAIR_SEPARATION);
        // Image y grows downward, so a growing angle is a visually
        // clockwise sweep.
        let angle_deg = dy.atan2(dx).to_degrees();

        let Some(baseline) = self.baseline else {
            self.baseline = Some(PairBaseline {
                separation,
                angle_deg,
            });
            return Vec::new();
        };

        let mut events = Vec::new();
        let mut next = baseline;

        let spread = separation - baseline.separation;
        if spread > config.zoom_deadband_px {
            events.push(GestureEvent::ZoomIn {
                factor: separation / baseline.separation,
            });
            next.separation = separation;
        } else if spread < -config.zoom_deadband_px {
            events.push(GestureEvent::ZoomOut {
                factor: baseline.separation / separation,
            });
            next.separation = separation;
        }

        let swept = wrap_degrees(angle_deg - baseline.angle_deg);
        if swept.abs() >= config.rotation_step_degrees {
            events.push(if swept > 0.0 {
                GestureEvent::RotateCw {
                    degrees: swept.abs(),
                }
            } else {
                GestureEvent::RotateCcw {
                    degrees: swept.abs(),
                }
            });
            next.angle_deg = angle_deg;
        }

        self.baseline = Some(next);
        events
    }

    /// Forgets the baseline. Called whenever the pair stops qualifying, so
    /// the next qualified frame starts fresh.
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

/// Maps an angle difference into (-180, 180] so crossing the atan2 seam
/// does not read as a near-full turn.
fn wrap_degrees(d: f64) -> f64 {
    (d + 180.0).rem_euclid(360.0) - 180.0
}
