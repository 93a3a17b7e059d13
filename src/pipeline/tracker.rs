//! Multi-hand selection and identity tracking
//!
//! Ranks the frame's detected hands, matches them to live identities by
//! proximity, and ages out identities that vanish. Identities carry the
//! sticky primary/secondary roles plus the per-hand smoothing and gesture
//! state that must survive across frames.

use std::fmt;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::landmarks::HandSnapshot;
use crate::pipeline::classifier::GestureState;
use crate::pipeline::smoothing::PositionSmoother;

/// Stable token for one physical hand across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandId(pub u64);

impl fmt::Display for HandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hand#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandRole {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Per-identity record: role, last known centroid, and the cross-frame
/// state owned on this hand's behalf.
#[derive(Debug)]
pub struct TrackedHand {
    pub id: HandId,
    pub role: HandRole,
    pub last_position: (f64, f64),
    /// 0 when seen this frame; counts up while unseen.
    pub frames_missing: u32,
    pub smoother: PositionSmoother,
    pub gesture: GestureState,
    home_side: Option<Side>,
}

/// Result of feeding one frame's snapshots through the selector.
#[derive(Debug)]
pub struct TrackerUpdate {
    /// `(identity, snapshot index)` pairs, primary role first.
    pub assigned: Vec<(HandId, usize)>,
    /// Identities destroyed this frame, with their state for close-out.
    pub expired: Vec<TrackedHand>,
    pub spawned: usize,
}

/// Score multiplier for a candidate sitting exactly on a live identity's
/// last position; decays linearly to zero at the match radius. Keeps a
/// briefly-larger background hand from stealing an established identity.
const CONTINUITY_BONUS: f64 = 0.75;

#[derive(Debug, Default)]
pub struct HandTracker {
    hands: Vec<TrackedHand>,
    next_id: u64,
}

impl HandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects up to `max_hands` snapshots, matches them to identities,
    /// ages the rest, and maintains roles.
    pub fn update(
        &mut self,
        snapshots: &[&HandSnapshot],
        frame_width: f64,
        config: &PipelineConfig,
    ) -> TrackerUpdate {
        let mut ranked: Vec<(usize, f64)> = snapshots
            .iter()
            .enumerate()
            .map(|(idx, snap)| {
                let centroid = snap.centroid();
                let continuity = self
                    .hands
                    .iter()
                    .map(|hand| {
                        let d = distance(centroid, hand.last_position);
                        if d < config.match_radius_px {
                            1.0 - d / config.match_radius_px
                        } else {
                            0.0
                        }
                    })
                    .fold(0.0, f64::max);
                (idx, snap.size * (1.0 + CONTINUITY_BONUS * continuity))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(config.max_hands);

        let mut assigned: Vec<(HandId, usize)> = Vec::with_capacity(ranked.len());
        let mut claimed: Vec<HandId> = Vec::with_capacity(ranked.len());
        let mut spawned = 0;
        for (idx, _) in &ranked {
            let centroid = snapshots[*idx].centroid();
            let mut best: Option<(usize, f64)> = None;
            for (pos, hand) in self.hands.iter().enumerate() {
                if claimed.contains(&hand.id) {
                    continue;
                }
                let d = distance(centroid, hand.last_position);
                if d <= config.match_radius_px && best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((pos, d));
                }
            }
            match best {
                Some((pos, _)) => {
                    let hand = &mut self.hands[pos];
                    hand.last_position = centroid;
                    hand.frames_missing = 0;
                    claimed.push(hand.id);
                    assigned.push((hand.id, *idx));
                }
                None if self.hands.len() < config.max_hands => {
                    let id = HandId(self.next_id);
                    self.next_id += 1;
                    let role = if self.hands.iter().any(|h| h.role == HandRole::Primary) {
                        HandRole::Secondary
                    } else {
                        HandRole::Primary
                    };
                    debug!("adopted {} as {:?} at ({:.0}, {:.0})", id, role, centroid.0, centroid.1);
                    self.hands.push(TrackedHand {
                        id,
                        role,
                        last_position: centroid,
                        frames_missing: 0,
                        smoother: PositionSmoother::new(
                            config.smoothing_window,
                            config.smoothing_recent_weight,
                        ),
                        gesture: GestureState::new(),
                        home_side: None,
                    });
                    claimed.push(id);
                    assigned.push((id, *idx));
                    spawned += 1;
                }
                // Table full and nothing close enough: continuity wins,
                // the candidate waits for a grace window to free a slot.
                None => {}
            }
        }

        let mut expired = Vec::new();
        let mut pos = 0;
        while pos < self.hands.len() {
            if claimed.contains(&self.hands[pos].id) {
                pos += 1;
                continue;
            }
            self.hands[pos].frames_missing += 1;
            if self.hands[pos].frames_missing > config.identity_grace_frames {
                let dead = self.hands.remove(pos);
                debug!(
                    "expired {} ({:?}) after {} unseen frames",
                    dead.id, dead.role, dead.frames_missing
                );
                expired.push(dead);
            } else {
                pos += 1;
            }
        }

        self.maintain_roles(frame_width, config);

        assigned.sort_by_key(|(id, _)| match self.get(*id).map(|h| h.role) {
            Some(HandRole::Primary) => 0,
            _ => 1,
        });

        TrackerUpdate {
            assigned,
            expired,
            spawned,
        }
    }

    /// Sticky-role maintenance with a midline buffer zone: roles swap only
    /// when both hands sit beyond the deadband on the side opposite where
    /// the pair formed, never on a grazing midline touch.
    fn maintain_roles(&mut self, frame_width: f64, config: &PipelineConfig) {
        if self.hands.len() != 2 {
            for hand in &mut self.hands {
                hand.home_side = None;
            }
            return;
        }
        if self.hands.iter().any(|h| h.home_side.is_none()) {
            let (left, right) = if self.hands[0].last_position.0 <= self.hands[1].last_position.0 {
                (0, 1)
            } else {
                (1, 0)
            };
            self.hands[left].home_side = Some(Side::Left);
            self.hands[right].home_side = Some(Side::Right);
            return;
        }
        let midline = frame_width / 2.0;
        let crossed = |hand: &TrackedHand| match hand.home_side {
            Some(Side::Left) => hand.last_position.0 > midline + config.role_swap_deadband_px,
            Some(Side::Right) => hand.last_position.0 < midline - config.role_swap_deadband_px,
            None => false,
        };
        if self.hands.iter().all(|h| crossed(h)) {
            debug!(
                "{} and {} fully crossed the midline; swapping roles",
                self.hands[0].id, self.hands[1].id
            );
            let role = self.hands[0].role;
            self.hands[0].role = self.hands[1].role;
            self.hands[1].role = role;
            let side = self.hands[0].home_side;
            self.hands[0].home_side = self.hands[1].home_side;
            self.hands[1].home_side = side;
        }
    }

    pub fn get(&self, id: HandId) -> Option<&TrackedHand> {
        self.hands.iter().find(|h| h.id == id)
    }

    pub fn get_mut(&mut self, id: HandId) -> Option<&mut TrackedHand> {
        self.hands.iter_mut().find(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.hands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    /// Removes and returns every live identity (pipeline reset).
    pub fn drain(&mut self) -> Vec<TrackedHand> {
        self.hands.drain(..).collect()
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}
