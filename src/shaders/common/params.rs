// SPDX-License-Identifier: GPL-3.0-only

//! Uniform blocks for the point cloud shader
//!
//! Every field is packed into 16-byte vectors so the Rust layout matches the
//! WGSL uniform layout without implicit padding.

use crate::calibration::CameraCalibration;
use glam::Mat4;

/// Calibration parameters, uploaded once per stream
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CalibrationUniforms {
    /// Depth space -> color space, column-major
    pub depth_to_color: [[f32; 4]; 4],
    /// Depth focal length (xy) and principal point (zw)
    pub depth_intrinsics: [f32; 4],
    /// Color focal length (xy) and principal point (zw)
    pub color_intrinsics: [f32; 4],
    /// Depth distortion k1, k2, p1, p2
    pub depth_coeffs: [f32; 4],
    /// Color distortion k1, k2, p1, p2
    pub color_coeffs: [f32; 4],
    /// Depth k3, color k3, depth scale, unused
    pub scalars: [f32; 4],
    /// Depth distortion model, color distortion model, unused, unused
    pub models: [u32; 4],
}

impl CalibrationUniforms {
    /// Parameters of [`CameraCalibration::uncalibrated`]; every point collapses to the origin
    pub fn uncalibrated() -> Self {
        Self::from(&CameraCalibration::uncalibrated())
    }
}

impl From<&CameraCalibration> for CalibrationUniforms {
    fn from(calibration: &CameraCalibration) -> Self {
        let depth = calibration.depth_distortion.coeffs();
        let color = calibration.color_distortion.coeffs();
        Self {
            depth_to_color: calibration.depth_to_color.to_cols_array_2d(),
            depth_intrinsics: [
                calibration.depth_focal_length.x,
                calibration.depth_focal_length.y,
                calibration.depth_offset.x,
                calibration.depth_offset.y,
            ],
            color_intrinsics: [
                calibration.color_focal_length.x,
                calibration.color_focal_length.y,
                calibration.color_offset.x,
                calibration.color_offset.y,
            ],
            depth_coeffs: [depth[0], depth[1], depth[2], depth[3]],
            color_coeffs: [color[0], color[1], color[2], color[3]],
            scalars: [depth[4], color[4], calibration.depth_scale, 0.0],
            models: [
                calibration.depth_distortion.model() as u32,
                calibration.color_distortion.model() as u32,
                0,
                0,
            ],
        }
    }
}

/// Per-frame view parameters
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    /// Model-view-projection, column-major
    pub mvp: [[f32; 4]; 4],
    /// Depth texture size in pixels
    pub depth_size: [f32; 2],
    /// Color texture size in pixels
    pub color_size: [f32; 2],
}

impl ViewUniforms {
    pub fn new(mvp: Mat4, depth_size: (u32, u32), color_size: (u32, u32)) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            depth_size: [depth_size.0 as f32, depth_size.1 as f32],
            color_size: [color_size.0 as f32, color_size.1 as f32],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CameraProfile, DistortionModel};

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<CalibrationUniforms>(), 160);
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 80);
    }

    #[test]
    fn test_sr300_packing() {
        let calibration = CameraProfile::Sr300.calibration().unwrap();
        let uniforms = CalibrationUniforms::from(&calibration);
        assert_eq!(uniforms.scalars[2], calibration.depth_scale);
        assert_eq!(
            uniforms.models,
            [DistortionModel::InverseBrownConrady as u32, 0, 0, 0]
        );
        // Translation lands in the fourth column
        assert_eq!(uniforms.depth_to_color[3][0], calibration.depth_to_color.w_axis.x);
        assert_eq!(uniforms.depth_coeffs[0], calibration.depth_distortion.coeffs()[0]);
        assert_eq!(uniforms.scalars[0], calibration.depth_distortion.coeffs()[4]);
    }

    #[test]
    fn test_uncalibrated_has_unit_intrinsics() {
        let uniforms = CalibrationUniforms::uncalibrated();
        assert_eq!(uniforms.depth_intrinsics, [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniforms.color_intrinsics, [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniforms.depth_to_color, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(uniforms.scalars[2], 0.0);
        assert_eq!(uniforms.models, [DistortionModel::None as u32, 0, 0, 0]);
    }
}
