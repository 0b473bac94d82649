// SPDX-License-Identifier: GPL-3.0-only

//! Saving rendered point cloud frames as PNG files

use crate::errors::{AppError, AppResult};
use crate::shaders::RenderedFrame;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default snapshot directory (`~/Pictures/depthview`, or the working directory)
pub fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .map(|dir| dir.join(crate::constants::APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Timestamped file name inside `dir`
pub fn timestamped_path(dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("POINTS_{}.png", timestamp))
}

/// Write an RGBA frame as PNG, creating the parent directory
pub fn save_png(frame: &RenderedFrame, path: &Path) -> AppResult<()> {
    let img: image::RgbaImage =
        image::ImageBuffer::from_raw(frame.width, frame.height, frame.rgba.clone())
            .ok_or_else(|| AppError::Other("Frame buffer size mismatch".to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    img.save(path)
        .map_err(|e| AppError::Other(format!("Failed to save {}: {}", path.display(), e)))?;
    info!(path = %path.display(), "Snapshot saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_path() {
        let path = timestamped_path(Path::new("/tmp/shots"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("POINTS_"));
        assert!(name.ends_with(".png"));
        assert_eq!(path.parent(), Some(Path::new("/tmp/shots")));
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = std::env::temp_dir().join(format!("depthview_snapshot_{}", std::process::id()));
        let path = dir.join("nested").join("frame.png");
        let frame = RenderedFrame {
            rgba: vec![10, 20, 30, 255, 40, 50, 60, 255],
            width: 2,
            height: 1,
        };

        save_png(&frame, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 1));
        assert_eq!(loaded.get_pixel(1, 0).0, [40, 50, 60, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_png_rejects_short_buffer() {
        let frame = RenderedFrame {
            rgba: vec![0; 3],
            width: 2,
            height: 2,
        };
        let path = std::env::temp_dir().join("depthview_never_written.png");
        assert!(save_png(&frame, &path).is_err());
    }
}
