// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud renderer
//!
//! Owns the per-frame loop: regenerate per-pixel geometry when the depth
//! resolution changes, compute the MVP from the orbit controller, upload the
//! latest color and depth frames, and issue one point per depth pixel.
//!
//! GPU work goes through [`PointCloudTarget`] so the loop can run against
//! the wgpu processor or a recording target in tests.

mod session;

pub use session::{SessionStatus, ViewerSession};

use crate::backends::{CameraStreams, ColorFrame, DepthFrame};
use crate::calibration::{self, CameraCalibration};
use crate::errors::{CalibrationError, RenderError};
use crate::shaders::{CalibrationUniforms, ViewUniforms};
use crate::view::OrbitController;
use tracing::{debug, info, warn};

/// One draw of the point cloud
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Render target size; equals the depth frame size
    pub viewport: (u32, u32),
    pub uniforms: ViewUniforms,
    /// One point per depth pixel
    pub point_count: u32,
}

/// GPU operations the per-frame loop relies on
pub trait PointCloudTarget {
    /// Upload calibration parameters (once per stream)
    fn upload_calibration(&mut self, uniforms: &CalibrationUniforms);

    /// Replace the per-pixel index buffer
    fn upload_geometry(&mut self, geometry: &FrameGeometryCache) -> Result<(), RenderError>;

    /// Upload the latest color and depth frames as textures
    fn upload_frames(&mut self, color: &ColorFrame, depth: &DepthFrame)
    -> Result<(), RenderError>;

    /// Draw the uploaded frames as a point list
    fn draw_points(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    /// Clear the render target without drawing
    fn clear(&mut self) -> Result<(), RenderError>;
}

/// Per-pixel index buffer for a depth resolution
///
/// Entries run column by column: for each x, every y. The order only has to
/// cover every pixel exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometryCache {
    width: u32,
    height: u32,
    indices: Vec<[f32; 2]>,
}

impl FrameGeometryCache {
    pub fn build(width: u32, height: u32) -> Self {
        let mut indices = Vec::with_capacity(width as usize * height as usize);
        for x in 0..width {
            for y in 0..height {
                indices.push([x as f32, y as f32]);
            }
        }
        Self {
            width,
            height,
            indices,
        }
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn indices(&self) -> &[[f32; 2]] {
        &self.indices
    }

    pub fn point_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// What a render iteration produced
#[derive(Debug)]
pub enum FrameOutcome {
    /// Sources not ready; the target was cleared
    Cleared,
    /// Point cloud drawn
    Drawn { points: u32 },
    /// Frame upload failed; the draw was skipped and the loop continues
    UploadFailed(RenderError),
}

impl FrameOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, FrameOutcome::Drawn { .. })
    }
}

/// Drives a [`PointCloudTarget`] once per frame
pub struct PointCloudRenderer<T> {
    target: T,
    geometry: Option<FrameGeometryCache>,
    calibration: Option<CameraCalibration>,
}

impl<T: PointCloudTarget> PointCloudRenderer<T> {
    pub fn new(mut target: T) -> Self {
        target.upload_calibration(&CalibrationUniforms::uncalibrated());
        Self {
            target,
            geometry: None,
            calibration: None,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Calibration currently uploaded, if the camera was recognized
    pub fn calibration(&self) -> Option<&CameraCalibration> {
        self.calibration.as_ref()
    }

    /// Resolve and upload the calibration for a stream identity
    ///
    /// An unrecognized camera uploads the uncalibrated fallback: rendering
    /// continues with every point collapsed to the origin.
    pub fn calibrate(&mut self, identity: &str) -> Result<&CameraCalibration, CalibrationError> {
        match calibration::resolve(identity) {
            Ok(resolved) => {
                info!(identity, "Calibration uploaded");
                self.target
                    .upload_calibration(&CalibrationUniforms::from(&resolved));
                Ok(&*self.calibration.insert(resolved))
            }
            Err(e) => {
                warn!(identity, error = %e, "Rendering uncalibrated");
                self.target
                    .upload_calibration(&CalibrationUniforms::uncalibrated());
                self.calibration = None;
                Err(e)
            }
        }
    }

    /// Run one iteration of the frame loop
    ///
    /// Only GPU failures outside frame upload are returned as errors.
    pub fn render_frame(
        &mut self,
        streams: Option<&mut CameraStreams>,
        controller: &OrbitController,
    ) -> Result<FrameOutcome, RenderError> {
        let Some(streams) = streams.filter(|s| s.is_ready()) else {
            self.target.clear()?;
            return Ok(FrameOutcome::Cleared);
        };

        let (Some(depth), Some(color)) = (streams.depth.latest_frame(), streams.color.latest_frame())
        else {
            self.target.clear()?;
            return Ok(FrameOutcome::Cleared);
        };

        let (viewport, point_count) = self.ensure_geometry(depth.width, depth.height)?;

        let uniforms = ViewUniforms::new(
            controller.view_projection(viewport.0, viewport.1),
            (depth.width, depth.height),
            (color.width, color.height),
        );

        if let Err(e) = self.target.upload_frames(&color, &depth) {
            warn!(error = %e, "Skipping draw");
            self.target.clear()?;
            return Ok(FrameOutcome::UploadFailed(e));
        }

        self.target.draw_points(&DrawCall {
            viewport,
            uniforms,
            point_count,
        })?;

        Ok(FrameOutcome::Drawn {
            points: point_count,
        })
    }

    fn ensure_geometry(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<((u32, u32), u32), RenderError> {
        if let Some(geometry) = self.geometry.as_ref().filter(|g| g.matches(width, height)) {
            return Ok((geometry.viewport(), geometry.point_count()));
        }

        debug!(width, height, "Rebuilding point geometry");
        let geometry = FrameGeometryCache::build(width, height);
        self.target.upload_geometry(&geometry)?;
        let result = (geometry.viewport(), geometry.point_count());
        self.geometry = Some(geometry);
        Ok(result)
    }
}
