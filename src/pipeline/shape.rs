//! Finger-state extraction
//!
//! Reduces one hand's 21 keypoints to a compact [`ShapeDescriptor`]: which
//! fingers are extended, how close the pinch is, and how the palm is
//! oriented. All geometry is 2D and normalized by hand scale so the same
//! thresholds work at any distance from the camera.

use crate::config::PipelineConfig;
use crate::landmarks::{keypoints, HandSnapshot, Keypoint};

/// Hand scale, in pixels, at which normalized distances are expressed.
///
/// Pinch distance is `tip-to-tip / hand-scale * REFERENCE_HAND_SCALE`, so a
/// threshold of 60 reads as "60 px on a hand whose wrist-to-middle-base
/// span is 100 px" regardless of the actual span.
pub const REFERENCE_HAND_SCALE: f64 = 100.0;

/// Below this wrist-to-middle-base span the geometry is degenerate and no
/// descriptor is produced.
const MIN_HAND_SCALE: f64 = 1.0;

/// Per-frame geometric summary of one hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeDescriptor {
    /// Extended state per digit, thumb first.
    pub fingers_extended: [bool; 5],
    /// Thumb-tip to index-tip distance in reference units.
    pub pinch_distance: f64,
    /// Signed angle between wrist→middle-base and the image's upward
    /// vertical, in degrees. 0 = upright, positive = tilted clockwise.
    pub palm_angle_deg: f64,
    /// Unit vector from wrist toward the index fingertip.
    pub pointing: (f64, f64),
    /// Thumb-tip height above the wrist, in hand-scale units. Positive is
    /// up in image terms (smaller y).
    pub thumb_elevation: f64,
}

/// The static finger patterns the classifier recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticShape {
    /// Index extended alone.
    Point,
    /// Index and middle extended.
    Peace,
    /// Everything flexed.
    Fist,
    /// Everything extended.
    Palm,
    /// Thumb extended alone.
    Thumb,
}

impl ShapeDescriptor {
    /// Derives the descriptor for one snapshot.
    ///
    /// Returns `None` when the snapshot is not well-formed or its geometry
    /// is too collapsed to read (wrist-to-middle-base span under a pixel);
    /// such a hand classifies as nothing for the frame.
    pub fn extract(hand: &HandSnapshot, config: &PipelineConfig) -> Option<Self> {
        if !hand.is_well_formed() {
            return None;
        }
        let wrist = &hand.keypoints[keypoints::WRIST];
        let middle_base = &hand.keypoints[keypoints::MIDDLE_MCP];
        let hand_scale = wrist.distance_to(middle_base);
        if hand_scale < MIN_HAND_SCALE {
            return None;
        }

        let palm_center = palm_center(hand);

        let mut fingers_extended = [false; 5];
        for finger in 1..5 {
            let tip = &hand.keypoints[keypoints::FINGER_TIPS[finger]];
            let pip = &hand.keypoints[keypoints::FINGER_PIPS[finger]];
            fingers_extended[finger] =
                tip.distance_to(&palm_center) > pip.distance_to(&palm_center) * config.finger_extend_ratio;
        }

        // The thumb flexes across the palm rather than toward its center,
        // so radial distance is a poor signal. Measure how far the tip has
        // escaped from the pinky-side palm base instead.
        let thumb_tip = &hand.keypoints[keypoints::THUMB_TIP];
        let pinky_base = &hand.keypoints[keypoints::PINKY_MCP];
        fingers_extended[0] =
            thumb_tip.distance_to(pinky_base) / hand_scale > config.thumb_extend_ratio;

        let index_tip = &hand.keypoints[keypoints::INDEX_TIP];
        let pinch_distance = thumb_tip.distance_to(index_tip) / hand_scale * REFERENCE_HAND_SCALE;

        let axis_x = middle_base.x - wrist.x;
        let axis_y = middle_base.y - wrist.y;
        // Image y grows downward; upright means the axis points at -y.
        let palm_angle_deg = axis_x.atan2(-axis_y).to_degrees();

        let point_x = index_tip.x - wrist.x;
        let point_y = index_tip.y - wrist.y;
        let point_len = (point_x * point_x + point_y * point_y).sqrt();
        let pointing = if point_len > f64::EPSILON {
            (point_x / point_len, point_y / point_len)
        } else {
            (0.0, 0.0)
        };

        let thumb_elevation = (wrist.y - thumb_tip.y) / hand_scale;

        Some(Self {
            fingers_extended,
            pinch_distance,
            palm_angle_deg,
            pointing,
            thumb_elevation,
        })
    }

    /// Which static pattern, if any, the extended-finger flags match.
    pub fn static_shape(&self) -> Option<StaticShape> {
        match self.fingers_extended {
            [false, true, false, false, false] => Some(StaticShape::Point),
            [false, true, true, false, false] => Some(StaticShape::Peace),
            [false, false, false, false, false] => Some(StaticShape::Fist),
            [true, true, true, true, true] => Some(StaticShape::Palm),
            [true, false, false, false, false] => Some(StaticShape::Thumb),
            _ => None,
        }
    }
}

fn palm_center(hand: &HandSnapshot) -> Keypoint {
    let wrist = &hand.keypoints[keypoints::WRIST];
    let mut sx = wrist.x;
    let mut sy = wrist.y;
    for idx in keypoints::PALM_BASES {
        sx += hand.keypoints[idx].x;
        sy += hand.keypoints[idx].y;
    }
    let n = (keypoints::PALM_BASES.len() + 1) as f64;
    Keypoint::new(sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new(x, y)
    }

    /// Synthetic hand with a 100px wrist-to-middle-base span, so pinch
    /// distances read directly in pixels. Extended digits stretch upward,
    /// flexed ones curl near the knuckle line; an extended thumb sits out
    /// to the side.
    fn posed_keypoints(extended: [bool; 5], cx: f64, cy: f64) -> Vec<Keypoint> {
        let mut k = vec![kp(0.0, 0.0); 21];
        k[keypoints::WRIST] = kp(cx, cy + 100.0);
        k[keypoints::THUMB_CMC] = kp(cx - 40.0, cy + 60.0);
        k[keypoints::THUMB_MCP] = kp(cx - 50.0, cy + 30.0);
        if extended[0] {
            k[keypoints::THUMB_IP] = kp(cx - 80.0, cy + 10.0);
            k[keypoints::THUMB_TIP] = kp(cx - 120.0, cy - 40.0);
        } else {
            k[keypoints::THUMB_IP] = kp(cx + 5.0, cy + 30.0);
            k[keypoints::THUMB_TIP] = kp(cx + 20.0, cy + 30.0);
        }
        let columns = [
            (keypoints::INDEX_MCP, cx - 30.0),
            (keypoints::MIDDLE_MCP, cx),
            (keypoints::RING_MCP, cx + 30.0),
            (keypoints::PINKY_MCP, cx + 60.0),
        ];
        for (finger, (mcp, x)) in columns.into_iter().enumerate() {
            k[mcp] = kp(x, cy);
            if extended[finger + 1] {
                k[mcp + 1] = kp(x, cy - 60.0);
                k[mcp + 2] = kp(x, cy - 100.0);
                k[mcp + 3] = kp(x, cy - 150.0);
            } else if mcp == keypoints::INDEX_MCP {
                // curl the index a little away from the tucked thumb
                k[mcp + 1] = kp(x, cy - 40.0);
                k[mcp + 2] = kp(x - 8.0, cy - 30.0);
                k[mcp + 3] = kp(x - 15.0, cy - 20.0);
            } else {
                k[mcp + 1] = kp(x, cy - 40.0);
                k[mcp + 2] = kp(x, cy - 25.0);
                k[mcp + 3] = kp(x, cy - 10.0);
            }
        }
        k
    }

    fn posed_hand(extended: [bool; 5]) -> HandSnapshot {
        HandSnapshot::from_keypoints(posed_keypoints(extended, 320.0, 240.0), 0.0)
    }

    fn pinch_hand(pinch_px: f64) -> HandSnapshot {
        let mut k = posed_keypoints([false, true, true, true, false], 320.0, 240.0);
        k[keypoints::THUMB_IP] = kp(300.0, 140.0);
        k[keypoints::THUMB_TIP] = kp(290.0 + pinch_px, 90.0);
        HandSnapshot::from_keypoints(k, 0.0)
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn extract(hand: &HandSnapshot) -> ShapeDescriptor {
        ShapeDescriptor::extract(hand, &config()).expect("posed hands have readable geometry")
    }

    #[test]
    fn test_open_palm_reads_all_extended() {
        let shape = extract(&posed_hand([true; 5]));
        assert_eq!(shape.fingers_extended, [true; 5]);
        assert_eq!(shape.static_shape(), Some(StaticShape::Palm));
    }

    #[test]
    fn test_fist_reads_all_flexed() {
        let shape = extract(&posed_hand([false; 5]));
        assert_eq!(shape.fingers_extended, [false; 5]);
        assert_eq!(shape.static_shape(), Some(StaticShape::Fist));
    }

    #[test]
    fn test_index_alone_is_pointing() {
        let shape = extract(&posed_hand([false, true, false, false, false]));
        assert_eq!(shape.static_shape(), Some(StaticShape::Point));
    }

    #[test]
    fn test_index_and_middle_is_peace() {
        let shape = extract(&posed_hand([false, true, true, false, false]));
        assert_eq!(shape.static_shape(), Some(StaticShape::Peace));
    }

    #[test]
    fn test_thumb_alone_is_thumb() {
        let shape = extract(&posed_hand([true, false, false, false, false]));
        assert_eq!(shape.static_shape(), Some(StaticShape::Thumb));
        assert!(
            shape.thumb_elevation > 0.0,
            "side-extended thumb above the wrist should read as elevated"
        );
    }

    #[test]
    fn test_three_fingers_matches_nothing() {
        let shape = extract(&posed_hand([false, true, true, true, false]));
        assert_eq!(shape.static_shape(), None);
    }

    #[test]
    fn test_pinch_distance_in_reference_units() {
        let shape = extract(&pinch_hand(50.0));
        assert!(
            (shape.pinch_distance - 50.0).abs() < 1e-6,
            "hand scale is 100px so pinch should read raw pixels, got {}",
            shape.pinch_distance
        );
    }

    #[test]
    fn test_pinch_distance_is_scale_invariant() {
        let near = pinch_hand(50.0);
        let far: Vec<Keypoint> = near.keypoints.iter().map(|k| kp(k.x * 0.4, k.y * 0.4)).collect();
        let far = HandSnapshot::from_keypoints(far, 0.0);

        let near_shape = extract(&near);
        let far_shape = extract(&far);
        assert!(
            (near_shape.pinch_distance - far_shape.pinch_distance).abs() < 1e-6,
            "normalized pinch must not change with camera distance: {} vs {}",
            near_shape.pinch_distance,
            far_shape.pinch_distance
        );
    }

    #[test]
    fn test_palm_angle_upright_and_rotated() {
        let upright = extract(&posed_hand([true; 5]));
        assert!(upright.palm_angle_deg.abs() < 1e-6, "got {}", upright.palm_angle_deg);

        // rotate the whole hand 90 degrees clockwise around its middle base
        let hand = posed_hand([true; 5]);
        let (px, py) = (320.0, 240.0);
        let rotated: Vec<Keypoint> = hand
            .keypoints
            .iter()
            .map(|k| kp(px - (k.y - py), py + (k.x - px)))
            .collect();
        let rotated = HandSnapshot::from_keypoints(rotated, 0.0);
        let shape = extract(&rotated);
        assert!(
            (shape.palm_angle_deg - 90.0).abs() < 1e-6,
            "clockwise tilt should be positive, got {}",
            shape.palm_angle_deg
        );
    }

    #[test]
    fn test_thumb_elevation_sign() {
        let mut up = posed_keypoints([false; 5], 320.0, 240.0);
        up[keypoints::THUMB_IP] = kp(300.0, 180.0);
        up[keypoints::THUMB_TIP] = kp(300.0, 120.0);
        let up = extract(&HandSnapshot::from_keypoints(up, 0.0));
        assert!(up.thumb_elevation > 1.0, "got {}", up.thumb_elevation);

        let mut down = posed_keypoints([false; 5], 320.0, 240.0);
        down[keypoints::THUMB_IP] = kp(300.0, 400.0);
        down[keypoints::THUMB_TIP] = kp(300.0, 460.0);
        let down = extract(&HandSnapshot::from_keypoints(down, 0.0));
        assert!(down.thumb_elevation < -1.0, "got {}", down.thumb_elevation);
    }

    #[test]
    fn test_pointing_vector_is_unit_length() {
        let shape = extract(&posed_hand([false, true, false, false, false]));
        let (x, y) = shape.pointing;
        let len = (x * x + y * y).sqrt();
        assert!((len - 1.0).abs() < 1e-9);
        assert!(y < 0.0, "extended index points up in image coordinates");
    }

    #[test]
    fn test_degenerate_hand_yields_no_descriptor() {
        let k = vec![kp(100.0, 100.0); 21];
        let collapsed = HandSnapshot::from_keypoints(k, 0.0);
        assert_eq!(
            ShapeDescriptor::extract(&collapsed, &config()),
            None,
            "collapsed geometry must not match any finger pattern"
        );
    }

    #[test]
    fn test_short_snapshot_yields_no_descriptor() {
        let short = HandSnapshot::from_keypoints(vec![kp(100.0, 100.0); 9], 0.0);
        assert_eq!(ShapeDescriptor::extract(&short, &config()), None);
    }
}
