//! Pipeline configuration
//!
//! Every tunable threshold lives here as named configuration rather than a
//! hard-coded constant. Values are validated at pipeline construction so a
//! bad combination (e.g. a hysteresis gap that can never release) is
//! rejected up front instead of misbehaving at runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a [`PipelineConfig`].
///
/// Field names in messages use the camelCase spelling found in config files.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pinchReleaseThreshold ({release}) must exceed pinchGrabThreshold ({grab}); an inverted or collapsed hysteresis gap never releases")]
    PinchGapInverted { grab: f64, release: f64 },
    #[error("maxHands must be 1 or 2, got {0}")]
    MaxHandsOutOfRange(usize),
    #[error("smoothingWindow must be between 1 and 30 frames, got {0}")]
    SmoothingWindowOutOfRange(usize),
    #[error("smoothingRecentWeight must be within (0, 1], got {0}")]
    RecentWeightOutOfRange(f64),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{0} must be at least one frame")]
    ZeroFrameWindow(&'static str),
}

/// Tunables consumed by the gesture pipeline.
///
/// Defaults carry the empirically tuned values of the reference deployment
/// (640x480 camera at ~30 fps); expect to re-tune per camera and distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// How many hands the selector tracks at once (1 or 2).
    pub max_hands: usize,

    // Pinch hysteresis, in scale-normalized pixel units (see
    // `ShapeDescriptor::pinch_distance`).
    pub pinch_grab_threshold: f64,
    pub pinch_release_threshold: f64,

    /// Minimum interval between two firings of the same discrete gesture
    /// kind on the same hand, measured on frame timestamps.
    pub cooldown_ms: f64,
    /// A second pinch within this many frames of a click upgrades it to a
    /// double click.
    pub double_pinch_frames: u32,

    // Temporal smoothing.
    pub smoothing_window: usize,
    /// Weight of the newest sample in the smoothed position; the remainder
    /// goes to the mean of the older samples.
    pub smoothing_recent_weight: f64,

    // Identity tracking.
    /// Frames an unseen identity survives before it is destroyed.
    pub identity_grace_frames: u32,
    /// Maximum centroid displacement for matching a snapshot to a live
    /// identity, in pixels.
    pub match_radius_px: f64,
    /// How far past the frame midline both hands must sit before
    /// primary/secondary roles swap.
    pub role_swap_deadband_px: f64,

    // Attention gating.
    pub attention_required: bool,
    pub attention_on_frames: u32,
    pub attention_off_frames: u32,

    // Two-hand gestures.
    pub zoom_deadband_px: f64,
    pub rotation_step_degrees: f64,

    // Shape extraction.
    /// Fingertip-to-palm vs. middle-joint-to-palm ratio above which a
    /// finger counts as extended.
    pub finger_extend_ratio: f64,
    /// Thumb-tip displacement from the pinky-side palm base, in hand-scale
    /// units, above which the thumb counts as extended.
    pub thumb_extend_ratio: f64,

    // Scroll and swipe.
    pub scroll_gain: f64,
    /// Vertical speed (px/s) a fist must reach before scroll deltas emit.
    pub scroll_min_velocity: f64,
    /// Horizontal speed (px/s) below which swipe travel resets.
    pub swipe_min_velocity: f64,
    /// Accumulated horizontal travel (px) that fires a swipe.
    pub swipe_min_distance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_hands: 2,
            pinch_grab_threshold: 60.0,
            pinch_release_threshold: 90.0,
            cooldown_ms: 250.0,
            double_pinch_frames: 15,
            smoothing_window: 5,
            smoothing_recent_weight: 0.8,
            identity_grace_frames: 5,
            match_radius_px: 120.0,
            role_swap_deadband_px: 40.0,
            attention_required: true,
            attention_on_frames: 3,
            attention_off_frames: 10,
            zoom_deadband_px: 50.0,
            rotation_step_degrees: 15.0,
            finger_extend_ratio: 1.15,
            thumb_extend_ratio: 0.8,
            scroll_gain: 0.05,
            scroll_min_velocity: 150.0,
            swipe_min_velocity: 300.0,
            swipe_min_distance: 150.0,
        }
    }
}

impl PipelineConfig {
    /// Shorter smoothing and debounce windows: lower latency, more jitter.
    pub fn low_latency() -> Self {
        Self {
            smoothing_window: 3,
            smoothing_recent_weight: 0.85,
            cooldown_ms: 150.0,
            attention_on_frames: 2,
            attention_off_frames: 6,
            ..Self::default()
        }
    }

    /// Longer windows and stricter debounce: steadier output, more lag.
    pub fn steady() -> Self {
        Self {
            smoothing_window: 8,
            smoothing_recent_weight: 0.6,
            cooldown_ms: 300.0,
            attention_on_frames: 5,
            attention_off_frames: 15,
            ..Self::default()
        }
    }

    /// Checks every field against its sane range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=2).contains(&self.max_hands) {
            return Err(ConfigError::MaxHandsOutOfRange(self.max_hands));
        }
        require_positive("pinchGrabThreshold", self.pinch_grab_threshold)?;
        if !(self.pinch_release_threshold > self.pinch_grab_threshold) {
            return Err(ConfigError::PinchGapInverted {
                grab: self.pinch_grab_threshold,
                release: self.pinch_release_threshold,
            });
        }
        require_non_negative("cooldownMs", self.cooldown_ms)?;
        if self.double_pinch_frames == 0 {
            return Err(ConfigError::ZeroFrameWindow("doublePinchFrames"));
        }
        if !(1..=30).contains(&self.smoothing_window) {
            return Err(ConfigError::SmoothingWindowOutOfRange(self.smoothing_window));
        }
        if !(self.smoothing_recent_weight > 0.0 && self.smoothing_recent_weight <= 1.0) {
            return Err(ConfigError::RecentWeightOutOfRange(self.smoothing_recent_weight));
        }
        require_positive("matchRadiusPx", self.match_radius_px)?;
        require_non_negative("roleSwapDeadbandPx", self.role_swap_deadband_px)?;
        if self.attention_on_frames == 0 {
            return Err(ConfigError::ZeroFrameWindow("attentionOnFrames"));
        }
        if self.attention_off_frames == 0 {
            return Err(ConfigError::ZeroFrameWindow("attentionOffFrames"));
        }
        require_non_negative("zoomDeadbandPx", self.zoom_deadband_px)?;
        require_positive("rotationStepDegrees", self.rotation_step_degrees)?;
        require_positive("fingerExtendRatio", self.finger_extend_ratio)?;
        require_positive("thumbExtendRatio", self.thumb_extend_ratio)?;
        require_non_negative("scrollGain", self.scroll_gain)?;
        require_non_negative("scrollMinVelocity", self.scroll_min_velocity)?;
        require_non_negative("swipeMinVelocity", self.swipe_min_velocity)?;
        require_positive("swipeMinDistance", self.swipe_min_distance)?;
        Ok(())
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(PipelineConfig::low_latency().validate().is_ok());
        assert!(PipelineConfig::steady().validate().is_ok());
    }

    #[test]
    fn test_release_must_exceed_grab() {
        let mut config = PipelineConfig::default();
        config.pinch_release_threshold = config.pinch_grab_threshold;
        match config.validate() {
            Err(ConfigError::PinchGapInverted { grab, release }) => {
                assert!((grab - release).abs() < 1e-9);
            }
            other => panic!("expected PinchGapInverted, got {other:?}"),
        }

        config.pinch_release_threshold = 40.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PinchGapInverted { .. })
        ));
    }

    #[test]
    fn test_negative_cooldown_rejected() {
        let config = PipelineConfig {
            cooldown_ms: -1.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { name: "cooldownMs", .. })
        ));
    }

    #[test]
    fn test_zero_cooldown_allowed() {
        let config = PipelineConfig {
            cooldown_ms: 0.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_hands_bounds() {
        for bad in [0, 3, 10] {
            let config = PipelineConfig {
                max_hands: bad,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::MaxHandsOutOfRange(n)) if n == bad),
                "maxHands {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_smoothing_bounds() {
        let config = PipelineConfig {
            smoothing_window: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SmoothingWindowOutOfRange(0))
        ));

        for bad_weight in [0.0, -0.2, 1.5, f64::NAN] {
            let config = PipelineConfig {
                smoothing_recent_weight: bad_weight,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::RecentWeightOutOfRange(_))),
                "weight {bad_weight} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_attention_debounce_rejected() {
        let config = PipelineConfig {
            attention_on_frames: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroFrameWindow("attentionOnFrames"))
        ));
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let config = PipelineConfig {
            match_radius_px: f64::INFINITY,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"pinchGrabThreshold": 45.0, "maxHands": 1}"#).unwrap();
        assert!((config.pinch_grab_threshold - 45.0).abs() < 1e-9);
        assert_eq!(config.max_hands, 1);
        // untouched fields keep their defaults
        assert!((config.pinch_release_threshold - 90.0).abs() < 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip_uses_camel_case() {
        let json = serde_json::to_string(&PipelineConfig::default()).unwrap();
        assert!(json.contains("\"pinchGrabThreshold\""), "got {json}");
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PipelineConfig::default());
    }
}
