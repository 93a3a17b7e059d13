use serde::{Deserialize, Serialize};

use super::keypoints;

/// Number of keypoints the detector reports per hand.
pub const KEYPOINT_COUNT: usize = 21;

/// A single tracked joint position, in pixels of the source camera frame.
///
/// `z` is the detector's relative depth estimate (unitless, smaller is
/// closer); the pipeline's geometry is 2D and ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// 2D Euclidean distance to another keypoint.
    pub fn distance_to(&self, other: &Keypoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detected hand for one frame: 21 ordered keypoints, a
/// bounding-box-derived size estimate, and the frame timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandSnapshot {
    pub keypoints: Vec<Keypoint>,
    /// Diagonal of the keypoint bounding box, in pixels. Larger reads as
    /// closer to the camera.
    pub size: f64,
    pub timestamp_ms: f64,
}

impl HandSnapshot {
    /// Builds a snapshot from raw keypoints, deriving the size estimate.
    pub fn from_keypoints(keypoints: Vec<Keypoint>, timestamp_ms: f64) -> Self {
        let size = bounding_diagonal(&keypoints);
        Self {
            keypoints,
            size,
            timestamp_ms,
        }
    }

    /// Whether this snapshot is safe to run geometry over: exactly 21
    /// keypoints, all coordinates finite.
    pub fn is_well_formed(&self) -> bool {
        self.keypoints.len() == KEYPOINT_COUNT
            && self.size.is_finite()
            && self.keypoints.iter().all(Keypoint::is_finite)
    }

    /// Mean position of all keypoints.
    pub fn centroid(&self) -> (f64, f64) {
        if self.keypoints.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.keypoints.len() as f64;
        let (sx, sy) = self
            .keypoints
            .iter()
            .fold((0.0, 0.0), |(sx, sy), k| (sx + k.x, sy + k.y));
        (sx / n, sy / n)
    }

    /// The wrist keypoint, or `None` when the snapshot is too short to
    /// carry one. Deserialized snapshots are not validated, so the slot
    /// is not guaranteed to exist.
    pub fn wrist(&self) -> Option<&Keypoint> {
        self.keypoints.get(keypoints::WRIST)
    }
}

fn bounding_diagonal(keypoints: &[Keypoint]) -> f64 {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for k in keypoints {
        min_x = min_x.min(k.x);
        min_y = min_y.min(k.y);
        max_x = max_x.max(k.x);
        max_y = max_y.max(k.y);
    }
    if keypoints.is_empty() {
        return 0.0;
    }
    let w = max_x - min_x;
    let h = max_y - min_y;
    (w * w + h * h).sqrt()
}

/// Everything the detector hands the pipeline for one tick: zero or more
/// hand snapshots, an optional "face with forward gaze visible" signal,
/// and the source frame geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub hands: Vec<HandSnapshot>,
    /// `None` when face tracking did not run this frame; treated the same
    /// as an explicit "not attending."
    #[serde(default)]
    pub attention: Option<bool>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub timestamp_ms: f64,
}

impl FrameSnapshot {
    pub fn new(hands: Vec<HandSnapshot>, frame_width: u32, frame_height: u32, timestamp_ms: f64) -> Self {
        Self {
            hands,
            attention: None,
            frame_width,
            frame_height,
            timestamp_ms,
        }
    }

    /// A frame with no hands, for grace-window and attention-decay ticks.
    pub fn empty(frame_width: u32, frame_height: u32, timestamp_ms: f64) -> Self {
        Self::new(Vec::new(), frame_width, frame_height, timestamp_ms)
    }

    pub fn with_attention(mut self, attending: bool) -> Self {
        self.attention = Some(attending);
        self
    }
}
