// SPDX-License-Identifier: GPL-3.0-only

//! Per-point unprojection from depth pixels into 3D
//!
//! This is the CPU reference for what the point cloud vertex shader evaluates
//! for every depth pixel. The order of operations is fixed:
//!
//! 1. scale the normalized depth sample to meters
//! 2. normalize the pixel by the depth intrinsics and remove depth distortion
//! 3. scale the ideal ray by the metric depth
//! 4. move the point into color-camera space
//! 5. project through the color intrinsics, distortion applied before the
//!    focal length and principal point
//!
//! A zero depth sample produces a point at the origin. It is not discarded;
//! the GPU path renders it the same way.

use crate::backends::DepthFrame;
use crate::calibration::CameraCalibration;
use glam::{UVec2, Vec2, Vec3};

/// Geometry computed for one depth pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Position in depth-camera space (meters)
    pub position: Vec3,
    /// Distorted color-image coordinate in color pixels
    pub color_uv: Vec2,
}

impl ProjectedPoint {
    /// Color coordinate as a texture coordinate in [0, 1] for a color image of `color_size`
    pub fn normalized_color_uv(&self, color_size: UVec2) -> Vec2 {
        self.color_uv / color_size.as_vec2()
    }
}

/// Unproject one depth pixel and find its color sample coordinate
pub fn project(pixel: UVec2, raw_depth: f32, calibration: &CameraCalibration) -> ProjectedPoint {
    let position = deproject_depth_pixel(pixel, raw_depth, calibration);
    let color_point = calibration.depth_to_color.transform_point3(position);
    let color_uv = project_to_color(color_point, calibration);
    ProjectedPoint { position, color_uv }
}

/// Depth pixel + normalized depth sample -> point in depth-camera space
pub fn deproject_depth_pixel(
    pixel: UVec2,
    raw_depth: f32,
    calibration: &CameraCalibration,
) -> Vec3 {
    let depth = raw_depth * calibration.depth_scale;
    let normalized = (pixel.as_vec2() - calibration.depth_offset) / calibration.depth_focal_length;
    let ray = calibration.depth_distortion.undistort(normalized);
    (ray * depth).extend(depth)
}

/// Point in color-camera space -> distorted color pixel coordinate
///
/// A point on the color camera's image plane (z = 0) samples the principal
/// point.
pub fn project_to_color(point: Vec3, calibration: &CameraCalibration) -> Vec2 {
    let normalized = if point.z == 0.0 {
        Vec2::ZERO
    } else {
        point.truncate() / point.z
    };
    let distorted = calibration.color_distortion.distort(normalized);
    distorted * calibration.color_focal_length + calibration.color_offset
}

/// Project every pixel of a depth frame, row by row
pub fn project_frame(frame: &DepthFrame, calibration: &CameraCalibration) -> Vec<ProjectedPoint> {
    let mut points = Vec::with_capacity(frame.pixel_count());
    for y in 0..frame.height {
        for x in 0..frame.width {
            let raw_depth = frame.sample(x, y).unwrap_or(0.0);
            points.push(project(UVec2::new(x, y), raw_depth, calibration));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{DistortionSpec, resolve};
    use glam::Mat4;

    fn pinhole() -> CameraCalibration {
        CameraCalibration {
            depth_scale: 2.0,
            depth_focal_length: Vec2::new(100.0, 100.0),
            depth_offset: Vec2::new(50.0, 40.0),
            color_focal_length: Vec2::new(200.0, 200.0),
            color_offset: Vec2::new(100.0, 80.0),
            depth_distortion: DistortionSpec::NONE,
            color_distortion: DistortionSpec::NONE,
            depth_to_color: Mat4::IDENTITY,
        }
    }

    #[test]
    fn test_principal_point_lies_on_axis() {
        let point = project(UVec2::new(50, 40), 0.5, &pinhole());
        assert_eq!(point.position, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(point.color_uv, Vec2::new(100.0, 80.0));
    }

    #[test]
    fn test_pinhole_unprojection() {
        let point = project(UVec2::new(150, 40), 0.5, &pinhole());
        // One focal length to the right at 1 m depth
        assert!((point.position - Vec3::new(1.0, 0.0, 1.0)).length() < 1e-6);
        assert!((point.color_uv - Vec2::new(300.0, 80.0)).length() < 1e-4);
    }

    #[test]
    fn test_translation_shifts_color_sample() {
        let mut calibration = pinhole();
        calibration.depth_to_color = Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0));
        let point = project(UVec2::new(50, 40), 0.5, &calibration);
        // Position stays in depth space, color sample moves by f * tx / z
        assert_eq!(point.position, Vec3::new(0.0, 0.0, 1.0));
        assert!((point.color_uv.x - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_depth_lands_at_origin() {
        let calibration = resolve("SR300").unwrap();
        let point = project(UVec2::new(10, 20), 0.0, &calibration);
        assert_eq!(point.position, Vec3::ZERO);
    }

    #[test]
    fn test_normalized_color_uv() {
        let point = project(UVec2::new(50, 40), 0.5, &pinhole());
        assert_eq!(
            point.normalized_color_uv(UVec2::new(200, 160)),
            Vec2::new(0.5, 0.5)
        );
    }
}
