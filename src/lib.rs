//! Handwave - Hands-free input from camera hand tracking, made reliable.
//!
//! This is the main library crate for the Handwave recognizer. It turns
//! per-frame hand landmark snapshots into a debounced gesture event
//! stream: construct a [`GesturePipeline`], feed it [`FrameSnapshot`]s in
//! order, and act on the [`GestureEvent`]s that come back.

pub mod config;
pub mod events;
pub mod landmarks;
pub mod pipeline;
pub mod replay;

pub use config::{ConfigError, PipelineConfig};
pub use events::{GestureEvent, GestureKind};
pub use landmarks::{FrameSnapshot, HandSnapshot, Keypoint, KEYPOINT_COUNT};
pub use pipeline::{GesturePipeline, PipelineStats};
pub use replay::{replay_session, RecordedSession, ReplayError, ReplayOutcome, TickTrace};
