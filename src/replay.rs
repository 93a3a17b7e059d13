//! Session recording and deterministic replay
//!
//! A [`RecordedSession`] is the raw landmark stream captured from one
//! sitting, serialized as JSON. Replaying it through a fresh pipeline
//! is pure: same frames, same config, same event stream, which is how
//! threshold changes get evaluated against real captures.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::{ConfigError, PipelineConfig};
use crate::events::GestureEvent;
use crate::landmarks::FrameSnapshot;
use crate::pipeline::{GesturePipeline, PipelineStats};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read session file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse session file: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A captured landmark stream, in frame order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedSession {
    pub session_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub frames: Vec<FrameSnapshot>,
}

impl RecordedSession {
    pub fn new(frames: Vec<FrameSnapshot>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            frames,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// What one tick of a replay produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickTrace {
    pub tick: u64,
    pub timestamp_ms: f64,
    pub events: Vec<GestureEvent>,
}

/// Full replay result: the per-tick trace plus the pipeline's totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub session_id: Uuid,
    pub trace: Vec<TickTrace>,
    pub stats: PipelineStats,
}

/// Runs a session through a fresh pipeline built from `config`.
pub fn replay_session(
    session: &RecordedSession,
    config: &PipelineConfig,
) -> Result<ReplayOutcome, ReplayError> {
    let mut pipeline = GesturePipeline::new(config.clone())?;
    let mut trace = Vec::with_capacity(session.frames.len());
    for (tick, frame) in session.frames.iter().enumerate() {
        let events = pipeline.tick(frame);
        trace.push(TickTrace {
            tick: tick as u64,
            timestamp_ms: frame.timestamp_ms,
            events,
        });
    }
    let stats = pipeline.stats();
    info!(
        "replayed session {}: {} frames, {} events",
        session.session_id,
        session.frames.len(),
        stats.events_emitted
    );
    Ok(ReplayOutcome {
        session_id: session.session_id,
        trace,
        stats,
    })
}
