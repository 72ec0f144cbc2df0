// THEORY:
// The `Frame` module is the most fundamental unit of the tracking system. A `Frame`
// is a "dumb" data container for one camera image: a flat, row-major buffer of
// 8-bit BGR samples plus its dimensions. It is the only input the tracking core
// ever sees from the outside world.
//
// Key architectural principles:
// 1.  **Validated at the Border**: A `Frame` can only be constructed from a buffer
//     whose length matches its dimensions. A malformed buffer is a `FrameError`,
//     never a silently truncated or zero-filled image.
// 2.  **Immutable**: Nothing in the pipeline mutates a `Frame`. Transformations such
//     as the horizontal mirror produce a new `Frame`.
// 3.  **BGR Ordering**: Samples are stored blue-first, matching what camera capture
//     libraries hand out. Conversions from the `image` crate's RGB buffers swap the
//     channels once, at construction.

use image::{DynamicImage, RgbImage};
use thiserror::Error;

pub type Channel = u8;

/// Number of interleaved channels per sample (B, G, R).
pub const CHANNELS: usize = 3;

/// A single BGR sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bgr {
    pub blue: Channel,
    pub green: Channel,
    pub red: Channel,
}

impl Bgr {
    pub const fn new(blue: Channel, green: Channel, red: Channel) -> Self {
        Self { blue, green, red }
    }

    /// Builds a sample from ordinary RGB component order.
    pub const fn from_rgb(red: Channel, green: Channel, blue: Channel) -> Self {
        Self { blue, green, red }
    }
}

impl From<&[u8]> for Bgr {
    fn from(bytes: &[u8]) -> Self {
        Self {
            blue: bytes[0],
            green: bytes[1],
            red: bytes[2],
        }
    }
}

/// Errors raised when a buffer cannot be interpreted as a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("frame buffer holds {actual} bytes, expected {expected} for the given dimensions")]
    BufferSize { expected: usize, actual: usize },
}

/// An immutable BGR image captured for a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The width of the frame in pixels.
    width: u32,
    /// The height of the frame in pixels.
    height: u32,
    /// Row-major, interleaved B, G, R bytes.
    data: Vec<u8>,
}

impl Frame {
    /// Wraps a raw BGR buffer, checking that it covers exactly `width * height` samples.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }

        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a frame where every sample has the same color.
    pub fn filled(width: u32, height: u32, color: Bgr) -> Result<Self, FrameError> {
        let samples = width as usize * height as usize;
        let mut data = Vec::with_capacity(samples * CHANNELS);
        for _ in 0..samples {
            data.extend_from_slice(&[color.blue, color.green, color.red]);
        }
        Self::from_bgr(width, height, data)
    }

    /// Converts an RGB buffer from the `image` crate, swapping into BGR order.
    pub fn from_rgb_image(image: &RgbImage) -> Result<Self, FrameError> {
        let mut data = image.as_raw().clone();
        for sample in data.chunks_exact_mut(CHANNELS) {
            sample.swap(0, 2);
        }
        Self::from_bgr(image.width(), image.height(), data)
    }

    /// Decodes any image format supported by the `image` crate.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self, FrameError> {
        Self::from_rgb_image(&image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw interleaved BGR bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the sample at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Bgr> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some(Bgr::from(&self.data[index..index + CHANNELS]))
    }

    /// Iterates over all samples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Bgr> + '_ {
        self.data.chunks_exact(CHANNELS).map(Bgr::from)
    }

    /// Returns a horizontally mirrored copy, the way a selfie camera preview is shown.
    pub fn mirrored(&self) -> Self {
        let row_len = self.width as usize * CHANNELS;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len) {
            for sample in row.chunks_exact(CHANNELS).rev() {
                data.extend_from_slice(sample);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Converts back into an RGB buffer, e.g. for saving a debug snapshot.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut data = self.data.clone();
        for sample in data.chunks_exact_mut(CHANNELS) {
            sample.swap(0, 2);
        }
        // Length was validated at construction, so this cannot fail.
        RgbImage::from_raw(self.width, self.height, data).unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Paints an axis-aligned rectangle. Intended for building synthetic frames.
    pub fn with_rect(mut self, x: u32, y: u32, width: u32, height: u32, color: Bgr) -> Self {
        let x_end = (x + width).min(self.width);
        let y_end = (y + height).min(self.height);
        for row in y.min(self.height)..y_end {
            for column in x.min(self.width)..x_end {
                let index = (row as usize * self.width as usize + column as usize) * CHANNELS;
                self.data[index] = color.blue;
                self.data[index + 1] = color.green;
                self.data[index + 2] = color.red;
            }
        }
        self
    }
}
