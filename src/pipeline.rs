// THEORY:
// The `pipeline` module is the top-level API for the tracking core. It wires the
// individual layers together into a single call per rendered frame:
//
//   Frame -> ColorMask -> BlobDetector -> top 2 by area -> SideAssigner -> smoother
//
// Key architectural principles:
// 1.  **No Hidden State**: The pipeline holds only its validated, immutable
//     configuration. The smoothed paddle positions from the previous frame are passed
//     in by the caller and the new ones handed back, so a tick is a pure function of
//     its arguments and can be replayed or tested with synthetic frames.
// 2.  **Omission Means "No Update"**: A side that received no observation this frame
//     is simply absent from the output. There is no sentinel value; the caller keeps
//     its previous position for that paddle.
// 3.  **Validate Once**: Bad configuration (a smoothing factor outside [0, 1], an
//     inverted color range) is rejected when the pipeline is built. A running tick
//     has no failure modes.

use crate::core_modules::blob_detector::{Blob, blob_detector};
use crate::core_modules::color_mask::{ColorRange, compute_mask};
use crate::core_modules::frame::Frame;
use crate::core_modules::side_assigner::{Side, SideAssignment, assign_sides};
use crate::core_modules::smoother::{DEFAULT_SMOOTHING_FACTOR, SmoothingFactor, smooth};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, trace};

/// How many of the largest blobs are considered for side assignment.
const MAX_CANDIDATES: usize = 2;

/// What to do when only one blob is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleBlobPolicy {
    /// Give the blob the side of the frame half it starts in and update only that paddle.
    #[default]
    Midline,
    /// Treat the frame as no observation and leave both paddles where they are.
    Hold,
}

/// Configuration for the TrackingPipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// The HSV range that marks a sample as part of a hand.
    pub color_range: ColorRange,
    /// Weight kept on the previous position when smoothing, in [0, 1].
    pub smoothing_factor: SmoothingFactor,
    /// Blobs smaller than this many samples are treated as noise.
    pub min_blob_area: u32,
    /// Mirror frames horizontally before tracking, like a selfie preview.
    pub mirror: bool,
    pub single_blob_policy: SingleBlobPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            color_range: ColorRange::default(),
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            min_blob_area: 1,
            mirror: false,
            single_blob_policy: SingleBlobPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Checks every field against its valid domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let factor = self.smoothing_factor;
        if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
            return Err(ConfigError::SmoothingFactor(factor));
        }
        if self.min_blob_area == 0 {
            return Err(ConfigError::MinBlobArea);
        }
        // The color range validates itself on construction and deserialization.
        Ok(())
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

/// A tracked paddle anchor for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidedPosition {
    pub side: Side,
    /// The left edge of the blob that drives this paddle.
    pub x: i32,
    /// The smoothed vertical position.
    pub y: i32,
}

/// The caller-owned smoothed positions carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingState {
    pub left_y: i32,
    pub right_y: i32,
}

impl TrackingState {
    pub fn new(left_y: i32, right_y: i32) -> Self {
        Self { left_y, right_y }
    }

    /// Both paddles at the vertical center of a frame `frame_height` tall.
    pub fn centered(frame_height: u32) -> Self {
        let center = (frame_height / 2) as i32;
        Self::new(center, center)
    }

    pub fn get(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.left_y,
            Side::Right => self.right_y,
        }
    }

    /// Overwrites the sides present in `positions` and keeps the rest unchanged.
    pub fn apply(&mut self, positions: &[SidedPosition]) {
        for position in positions {
            match position.side {
                Side::Left => self.left_y = position.y,
                Side::Right => self.right_y = position.y,
            }
        }
    }
}

/// The positions of a tick together with what the detector saw, for debug views.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub positions: Vec<SidedPosition>,
    /// Number of samples that matched the color range.
    pub foreground: usize,
    /// Number of blobs at or above the minimum area.
    pub blobs_found: usize,
    /// The largest blobs that were passed to side assignment.
    pub candidates: Vec<Blob>,
}

/// The gesture-tracking core: turns one frame into up to two paddle positions.
#[derive(Debug, Clone)]
pub struct TrackingPipeline {
    config: TrackerConfig,
}

impl TrackingPipeline {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Processes one frame. Returns 0, 1 or 2 positions, Left before Right.
    pub fn tick(&self, prev_left_y: i32, prev_right_y: i32, frame: &Frame) -> Vec<SidedPosition> {
        self.tick_with_report(prev_left_y, prev_right_y, frame).positions
    }

    /// Like `tick`, but also returns the intermediate detection results.
    pub fn tick_with_report(&self, prev_left_y: i32, prev_right_y: i32, frame: &Frame) -> TickReport {
        let frame: Cow<'_, Frame> = if self.config.mirror {
            Cow::Owned(frame.mirrored())
        } else {
            Cow::Borrowed(frame)
        };

        // Stage 1: Color threshold
        let mask = compute_mask(&frame, &self.config.color_range);
        let foreground = mask.foreground_count();

        // Stage 2: Spatial grouping, noise filtering and truncation
        let mut blobs = blob_detector::extract_blobs(&mask);
        blobs.retain(|blob| blob.area >= self.config.min_blob_area);
        let blobs_found = blobs.len();
        blobs.truncate(MAX_CANDIDATES);
        trace!(foreground, blobs_found, "frame segmented");

        // Stage 3: Side assignment and smoothing
        let height = frame.height() as i32;
        let previous = TrackingState::new(prev_left_y.clamp(0, height), prev_right_y.clamp(0, height));
        let observe = |side: Side, blob: &Blob| {
            let (x, y) = blob.anchor();
            SidedPosition {
                side,
                x: x as i32,
                y: smooth(previous.get(side), y as i32, self.config.smoothing_factor).clamp(0, height),
            }
        };

        let positions = match assign_sides(&blobs) {
            SideAssignment::Pair { left, right } => {
                vec![observe(Side::Left, &left), observe(Side::Right, &right)]
            }
            SideAssignment::One(blob) => match self.config.single_blob_policy {
                SingleBlobPolicy::Midline => {
                    let side = Side::of_midline(blob.bounding_box.x, frame.width());
                    debug!(%side, "single blob observed, updating one paddle");
                    vec![observe(side, &blob)]
                }
                SingleBlobPolicy::Hold => {
                    debug!("single blob observed, holding both paddles");
                    Vec::new()
                }
            },
            SideAssignment::None => {
                debug!("no blobs observed");
                Vec::new()
            }
        };

        TickReport {
            positions,
            foreground,
            blobs_found,
            candidates: blobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::Bgr;

    const BACKGROUND: Bgr = Bgr::from_rgb(20, 40, 160);
    const SKIN: Bgr = Bgr::from_rgb(224, 172, 105);

    fn two_hands() -> Frame {
        Frame::filled(800, 600, BACKGROUND)
            .unwrap()
            .with_rect(30, 100, 20, 20, SKIN)
            .with_rect(700, 400, 20, 20, SKIN)
    }

    fn pipeline() -> TrackingPipeline {
        TrackingPipeline::new(TrackerConfig::default()).unwrap()
    }

    #[test]
    fn two_hands_end_to_end() {
        let positions = pipeline().tick(300, 300, &two_hands());
        assert_eq!(
            positions,
            vec![
                SidedPosition { side: Side::Left, x: 30, y: 262 },
                SidedPosition { side: Side::Right, x: 700, y: 322 },
            ]
        );
    }

    #[test]
    fn report_exposes_detection() {
        let report = pipeline().tick_with_report(300, 300, &two_hands());
        assert_eq!(report.foreground, 800);
        assert_eq!(report.blobs_found, 2);
        assert!(report.candidates.iter().all(|blob| blob.area == 400));
    }

    #[test]
    fn tick_is_idempotent() {
        let pipeline = pipeline();
        let frame = two_hands();
        assert_eq!(pipeline.tick(120, 480, &frame), pipeline.tick(120, 480, &frame));
    }

    #[test]
    fn empty_frame_yields_nothing() {
        let frame = Frame::filled(800, 600, BACKGROUND).unwrap();
        assert!(pipeline().tick(300, 300, &frame).is_empty());
    }

    #[test]
    fn single_hand_updates_only_its_side() {
        let frame = Frame::filled(800, 600, BACKGROUND)
            .unwrap()
            .with_rect(600, 400, 20, 20, SKIN);
        let positions = pipeline().tick(300, 300, &frame);
        assert_eq!(positions, vec![SidedPosition { side: Side::Right, x: 600, y: 322 }]);

        let mut state = TrackingState::new(300, 300);
        state.apply(&positions);
        assert_eq!(state, TrackingState::new(300, 322));
    }

    #[test]
    fn hold_policy_ignores_a_single_hand() {
        let config = TrackerConfig {
            single_blob_policy: SingleBlobPolicy::Hold,
            ..TrackerConfig::default()
        };
        let frame = Frame::filled(800, 600, BACKGROUND)
            .unwrap()
            .with_rect(600, 400, 20, 20, SKIN);
        assert!(TrackingPipeline::new(config).unwrap().tick(300, 300, &frame).is_empty());
    }

    #[test]
    fn only_the_two_largest_blobs_are_used() {
        let frame = two_hands().with_rect(400, 10, 5, 5, SKIN);
        let positions = pipeline().tick(300, 300, &frame);
        let xs: Vec<i32> = positions.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![30, 700]);
    }

    #[test]
    fn small_blobs_are_filtered_as_noise() {
        let config = TrackerConfig {
            min_blob_area: 401,
            ..TrackerConfig::default()
        };
        let frame = two_hands().with_rect(300, 300, 30, 30, SKIN);
        let report = TrackingPipeline::new(config).unwrap().tick_with_report(300, 300, &frame);
        assert_eq!(report.blobs_found, 1);
        assert_eq!(report.positions.len(), 1);
        assert_eq!(report.positions[0].side, Side::Left);
    }

    #[test]
    fn mirror_flips_x_coordinates() {
        let config = TrackerConfig {
            mirror: true,
            ..TrackerConfig::default()
        };
        let positions = TrackingPipeline::new(config).unwrap().tick(300, 300, &two_hands());
        // 800 - 700 - 20 = 80 and 800 - 30 - 20 = 750
        assert_eq!(positions[0], SidedPosition { side: Side::Left, x: 80, y: 322 });
        assert_eq!(positions[1], SidedPosition { side: Side::Right, x: 750, y: 262 });
    }

    #[test]
    fn previous_positions_are_clamped_to_the_frame() {
        let positions = pipeline().tick(-500, 10_000, &two_hands());
        assert_eq!(positions[0].y, 22);
        assert_eq!(positions[1].y, 562);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        for factor in [1.5, -0.1, f64::NAN] {
            let config = TrackerConfig {
                smoothing_factor: factor,
                ..TrackerConfig::default()
            };
            assert!(matches!(
                TrackingPipeline::new(config),
                Err(ConfigError::SmoothingFactor(_))
            ));
        }

        let config = TrackerConfig {
            min_blob_area: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(TrackingPipeline::new(config), Err(ConfigError::MinBlobArea)));
    }

    #[test]
    fn config_from_toml() {
        let config = TrackerConfig::from_toml_str(
            r#"
            smoothing_factor = 0.5
            mirror = true
            single_blob_policy = "hold"

            [color_range]
            lower = { hue = 0, saturation = 30, value = 60 }
            upper = { hue = 25, saturation = 255, value = 255 }
            "#,
        )
        .unwrap();

        assert_eq!(config.smoothing_factor, 0.5);
        assert!(config.mirror);
        assert_eq!(config.single_blob_policy, SingleBlobPolicy::Hold);
        assert_eq!(config.min_blob_area, 1);
        assert_eq!(config.color_range.upper().hue, 25);
    }

    #[test]
    fn toml_with_inverted_range_is_rejected() {
        let result = TrackerConfig::from_toml_str(
            r#"
            [color_range]
            lower = { hue = 30, saturation = 0, value = 0 }
            upper = { hue = 10, saturation = 255, value = 255 }
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn centered_state() {
        assert_eq!(TrackingState::centered(600), TrackingState::new(300, 300));
    }
}
