//! Landmark input data model
//!
//! Types the external detector produces each frame: per-hand keypoint
//! snapshots plus the optional face-attention signal. The pipeline owns
//! these transiently for one tick's processing.

pub mod keypoints;
pub mod types;

pub use types::{FrameSnapshot, HandSnapshot, Keypoint, KEYPOINT_COUNT};
