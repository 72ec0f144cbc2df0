// THEORY:
// The `ColorMask` module is the signal-extraction layer of the tracker. It answers a
// single question for every sample of a frame: "does this look like a hand?"
//
// Key architectural principles:
// 1.  **Perceptual Color Space**: Skin is easier to isolate by hue and saturation than
//     by raw RGB, because lighting changes mostly move the value channel. Each sample
//     is converted to HSV using the common 8-bit convention: hue is stored as
//     degrees / 2 so it fits in a byte (0..180), saturation and value span 0..255.
// 2.  **Inclusive Box Threshold**: A sample is foreground iff all three channels lie
//     inside the configured `[lower, upper]` range, bounds included.
// 3.  **Pure Function**: `compute_mask` reads the frame and the range and nothing else.
//     The same inputs always produce the same `Mask`.

use crate::core_modules::frame::{Bgr, Frame};
use crate::error::ConfigError;
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

pub type Hue = u8;
pub type Saturation = u8;
pub type Value = u8;

/// The largest hue the 8-bit convention can produce.
pub const MAX_HUE: Hue = 179;

/// A color in 8-bit HSV form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    /// Hue in half-degrees, 0..=179.
    pub hue: Hue,
    /// Saturation, 0..=255.
    pub saturation: Saturation,
    /// Value (brightness, the maximum channel), 0..=255.
    pub value: Value,
}

impl Hsv {
    pub const fn new(hue: Hue, saturation: Saturation, value: Value) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Converts a BGR sample to 8-bit HSV.
    ///
    /// - Value is `max(R, G, B)`.
    /// - Saturation is `255 * chroma / value`, zero for black.
    /// - Hue is computed in degrees on the color wheel, then halved and rounded.
    pub fn from_bgr(sample: Bgr) -> Self {
        let red = sample.red as f32;
        let green = sample.green as f32;
        let blue = sample.blue as f32;

        let maximum_channel = red.max(green.max(blue));
        let minimum_channel = red.min(green.min(blue));
        let chroma = maximum_channel - minimum_channel;

        let saturation = if maximum_channel > 0.0 {
            (255.0 * chroma / maximum_channel).round()
        } else {
            0.0
        };

        let hue = if chroma <= 0.0 {
            0.0
        } else {
            let mut hue_degrees = if maximum_channel == red {
                60.0 * (green - blue) / chroma
            } else if maximum_channel == green {
                120.0 + 60.0 * (blue - red) / chroma
            } else {
                240.0 + 60.0 * (red - green) / chroma
            };
            if hue_degrees < 0.0 {
                hue_degrees += 360.0;
            }
            let half_degrees = (hue_degrees / 2.0).round();
            // 359.x degrees rounds up to 180, which wraps back to red.
            if half_degrees >= 180.0 { half_degrees - 180.0 } else { half_degrees }
        };

        Self {
            hue: hue as Hue,
            saturation: saturation as Saturation,
            value: maximum_channel as Value,
        }
    }
}

/// An inclusive per-channel HSV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawColorRange", into = "RawColorRange")]
pub struct ColorRange {
    lower: Hsv,
    upper: Hsv,
}

#[derive(Serialize, Deserialize)]
struct RawColorRange {
    lower: Hsv,
    upper: Hsv,
}

impl TryFrom<RawColorRange> for ColorRange {
    type Error = ConfigError;

    fn try_from(raw: RawColorRange) -> Result<Self, Self::Error> {
        ColorRange::new(raw.lower, raw.upper)
    }
}

impl From<ColorRange> for RawColorRange {
    fn from(range: ColorRange) -> Self {
        Self {
            lower: range.lower,
            upper: range.upper,
        }
    }
}

impl ColorRange {
    /// Light skin tones under typical indoor lighting.
    pub const SKIN: ColorRange = ColorRange {
        lower: Hsv::new(0, 20, 70),
        upper: Hsv::new(20, 255, 255),
    };

    /// Creates a range, rejecting inverted bounds and hues outside the 8-bit wheel.
    pub fn new(lower: Hsv, upper: Hsv) -> Result<Self, ConfigError> {
        let inverted = lower.hue > upper.hue
            || lower.saturation > upper.saturation
            || lower.value > upper.value;
        if inverted || upper.hue > MAX_HUE {
            return Err(ConfigError::ColorRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> Hsv {
        self.lower
    }

    pub fn upper(&self) -> Hsv {
        self.upper
    }

    /// Whether `color` lies inside the range on every channel, bounds inclusive.
    pub fn contains(&self, color: Hsv) -> bool {
        (self.lower.hue..=self.upper.hue).contains(&color.hue)
            && (self.lower.saturation..=self.upper.saturation).contains(&color.saturation)
            && (self.lower.value..=self.upper.value).contains(&color.value)
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::SKIN
    }
}

/// A binary image marking which samples of a frame matched the color range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// Builds a mask from row-major bits. Panics if the length does not match.
    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Self {
        assert_eq!(bits.len(), width as usize * height as usize, "mask size mismatch");
        Self {
            width,
            height,
            bits,
        }
    }

    /// An all-background mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::from_bits(width, height, vec![false; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `(x, y)` is foreground. Out-of-bounds coordinates are background.
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn foreground_count(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    /// Renders the mask as an 8-bit grayscale image, foreground white.
    pub fn to_luma_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.bits[y as usize * self.width as usize + x as usize] {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

/// Thresholds `frame` in HSV space, marking every sample inside `range`.
pub fn compute_mask(frame: &Frame, range: &ColorRange) -> Mask {
    let bits = frame
        .pixels()
        .map(|sample| range.contains(Hsv::from_bgr(sample)))
        .collect();
    Mask::from_bits(frame.width(), frame.height(), bits)
}
