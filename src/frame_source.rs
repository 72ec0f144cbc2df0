// THEORY:
// A `FrameSource` is the seam between the tracking core and whatever produces images:
// a webcam, a recorded sequence on disk, or synthetic frames in a test. The core never
// owns a camera handle; the caller injects a source and asks it for one frame per tick.
//
// A source that cannot produce a frame returns an `AcquisitionError`. It must never
// paper over a failed read with a black or empty frame, because the tracker would
// treat that as a valid "no hands visible" observation. Timeouts and retries, when a
// device needs them, are the source's own business.

use crate::core_modules::frame::Frame;
use crate::error::AcquisitionError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions the `image` crate is asked to decode from a directory.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Produces one frame per tick.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, AcquisitionError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        (**self).next_frame()
    }
}

/// Replays image files in order, decoding each one on demand.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Collects every image in `dir`, sorted by file name.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, AcquisitionError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();
        debug!(count = paths.len(), dir = %dir.as_ref().display(), "image sequence loaded");
        Ok(Self::new(paths))
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }

    /// Width and height of the next frame, read from the file header only.
    pub fn next_dimensions(&self) -> Result<Option<(u32, u32)>, AcquisitionError> {
        match self.paths.front() {
            Some(path) => Ok(Some(image::image_dimensions(path)?)),
            None => Ok(None),
        }
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        let path = self.paths.pop_front().ok_or(AcquisitionError::Exhausted)?;
        let image = image::open(&path)?;
        Ok(Frame::from_dynamic_image(&image)?)
    }
}

/// Hands out frames that are already in memory. Useful for replay and tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<Result<Frame, AcquisitionError>>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Ok).collect(),
        }
    }

    /// Queues a failed read, delivered in order with the frames.
    pub fn push_failure(&mut self, error: AcquisitionError) {
        self.frames.push_back(Err(error));
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push_back(Ok(frame));
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        self.frames.pop_front().unwrap_or(Err(AcquisitionError::Exhausted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::Bgr;
    use image::{Rgb, RgbImage};

    #[test]
    fn directory_is_replayed_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 2, Rgb([255, 0, 0])).save(dir.path().join("b.png")).unwrap();
        RgbImage::from_pixel(4, 2, Rgb([0, 0, 255])).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_dimensions().unwrap(), Some((4, 2)));

        let first = source.next_frame().unwrap();
        assert_eq!(first.pixel(0, 0), Some(Bgr::from_rgb(0, 0, 255)));
        let second = source.next_frame().unwrap();
        assert_eq!(second.pixel(3, 1), Some(Bgr::from_rgb(255, 0, 0)));

        assert!(matches!(source.next_frame(), Err(AcquisitionError::Exhausted)));
        assert_eq!(source.next_dimensions().unwrap(), None);
    }

    #[test]
    fn undecodable_file_is_an_acquisition_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let mut source = ImageSequenceSource::new([path]);
        assert!(matches!(source.next_frame(), Err(AcquisitionError::Decode(_))));
    }

    #[test]
    fn memory_source_delivers_failures_in_order() {
        let frame = Frame::filled(2, 2, Bgr::default()).unwrap();
        let mut source = MemorySource::new([frame.clone()]);
        source.push_failure(AcquisitionError::ReadFailed("usb reset".into()));

        assert_eq!(source.next_frame().unwrap(), frame);
        assert!(matches!(source.next_frame(), Err(AcquisitionError::ReadFailed(_))));
        assert!(matches!(source.next_frame(), Err(AcquisitionError::Exhausted)));
    }
}
