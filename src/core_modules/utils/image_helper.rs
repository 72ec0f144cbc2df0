pub mod image_helper {
    use crate::core_modules::blob_detector::Blob;
    use crate::core_modules::color_mask::Mask;
    use crate::core_modules::frame::Frame;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

    /// Writes a mask as a black and white PNG.
    pub fn save_mask(path: impl AsRef<Path>, mask: &Mask) -> Result<(), image::error::ImageError> {
        mask.to_luma_image().save(path)
    }

    /// Writes a frame, optionally with the outlines of `blobs` drawn on top.
    pub fn save_frame(
        path: impl AsRef<Path>,
        frame: &Frame,
        blobs: &[Blob],
    ) -> Result<(), image::error::ImageError> {
        annotate(frame, blobs).save(path)
    }

    /// Converts a frame to RGB and outlines each blob's bounding box.
    pub fn annotate(frame: &Frame, blobs: &[Blob]) -> RgbImage {
        let mut image = frame.to_rgb_image();
        for blob in blobs {
            let bounding_box = blob.bounding_box;
            let x_end = bounding_box.x + bounding_box.width - 1;
            let y_end = bounding_box.y + bounding_box.height - 1;
            for x in bounding_box.x..=x_end {
                image.put_pixel(x, bounding_box.y, OUTLINE);
                image.put_pixel(x, y_end, OUTLINE);
            }
            for y in bounding_box.y..=y_end {
                image.put_pixel(bounding_box.x, y, OUTLINE);
                image.put_pixel(x_end, y, OUTLINE);
            }
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use crate::core_modules::blob_detector::{Blob, BoundingBox};
    use crate::core_modules::color_mask::Mask;
    use crate::core_modules::frame::{Bgr, Frame};
    use image::Rgb;

    #[test]
    fn save_mask_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("mask.png");
        let mask = Mask::from_bits(3, 2, vec![true, false, true, false, true, false]);

        save_mask(&path, &mask).expect("Error Saving File.");

        let loaded = image::open(&path).expect("Error Loading File.").to_luma8();
        assert_eq!(loaded, mask.to_luma_image());
    }

    #[test]
    fn save_annotated_frame_file() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("frame.png");
        let frame = Frame::filled(10, 10, Bgr::default()).unwrap();
        let blob = Blob {
            bounding_box: BoundingBox::new(2, 2, 4, 3),
            area: 12,
        };

        save_frame(&path, &frame, &[blob]).expect("Error Saving File.");

        let loaded = image::open(&path).expect("Error Loading File.").to_rgb8();
        assert_eq!(loaded.get_pixel(2, 2), &Rgb([0, 255, 0]));
        assert_eq!(loaded.get_pixel(5, 4), &Rgb([0, 255, 0]));
        assert_eq!(loaded.get_pixel(3, 3), &Rgb([0, 0, 0]));
    }
}
