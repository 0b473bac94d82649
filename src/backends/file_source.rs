// SPDX-License-Identifier: GPL-3.0-only

//! Still image source
//!
//! Serves a recorded color image and a 16-bit depth image as a pair of
//! streams that are always ready and always return the same frame. Depth
//! images are read as 16-bit grayscale; 8-bit files are widened by the image
//! decoder, which rarely matches the sensor's units.

use super::{CameraStreams, ColorFrame, DepthFrame, VideoSource};
use crate::errors::SourceError;
use std::path::Path;
use tracing::{debug, info};

/// Load a color image as an RGBA frame
pub fn load_color_frame(path: &Path) -> Result<ColorFrame, SourceError> {
    let image = image::open(path)
        .map_err(|e| SourceError::Load(format!("{}: {}", path.display(), e)))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    debug!(path = %path.display(), width, height, "Loaded color image");
    Ok(ColorFrame::new(width, height, image.into_raw()))
}

/// Load a 16-bit grayscale depth image as a normalized depth frame
pub fn load_depth_frame(path: &Path) -> Result<DepthFrame, SourceError> {
    let image = image::open(path)
        .map_err(|e| SourceError::Load(format!("{}: {}", path.display(), e)))?
        .into_luma16();
    let (width, height) = image.dimensions();
    debug!(path = %path.display(), width, height, "Loaded depth image");
    Ok(DepthFrame::from_raw_u16(width, height, image.as_raw()))
}

/// Open a color/depth image pair under the given camera label
pub fn open(color: &Path, depth: &Path, label: &str) -> Result<CameraStreams, SourceError> {
    let color_frame = load_color_frame(color)?;
    let depth_frame = load_depth_frame(depth)?;

    if depth_frame.width == 0 || depth_frame.height == 0 {
        return Err(SourceError::InvalidStream(format!(
            "depth image {} is empty",
            depth.display()
        )));
    }

    info!(
        label,
        color_width = color_frame.width,
        color_height = color_frame.height,
        depth_width = depth_frame.width,
        depth_height = depth_frame.height,
        "Opened still image streams"
    );

    Ok(CameraStreams {
        depth: Box::new(StillImage::new(label, depth_frame.width, depth_frame.height, depth_frame)),
        color: Box::new(StillImage::new(label, color_frame.width, color_frame.height, color_frame)),
    })
}

/// A stream that repeats one frame forever
pub struct StillImage<F> {
    label: String,
    width: u32,
    height: u32,
    frame: F,
}

impl<F> StillImage<F> {
    pub fn new(label: &str, width: u32, height: u32, frame: F) -> Self {
        Self {
            label: label.to_string(),
            width,
            height,
            frame,
        }
    }
}

impl<F: Clone + Send> VideoSource for StillImage<F> {
    type Frame = F;

    fn label(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn latest_frame(&mut self) -> Option<F> {
        Some(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_png() {
        let dir = std::env::temp_dir().join(format!("depthview_still_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let color_path = dir.join("color.png");
        let depth_path = dir.join("depth.png");

        image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]))
            .save(&color_path)
            .unwrap();
        image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_pixel(4, 3, image::Luma([1000]))
            .save(&depth_path)
            .unwrap();

        let mut streams = open(&color_path, &depth_path, "SR300").unwrap();
        assert!(streams.is_ready());
        assert_eq!(streams.depth.dimensions(), (4, 3));

        let depth = streams.depth.latest_frame().unwrap();
        assert!((depth.sample(1, 1).unwrap() - 1000.0 / 65535.0).abs() < 1e-9);
        let color = streams.color.latest_frame().unwrap();
        assert_eq!(&color.data[..4], &[10, 20, 30, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = load_color_frame(Path::new("/nonexistent/color.png"));
        assert!(matches!(result, Err(SourceError::Load(_))));
    }
}
