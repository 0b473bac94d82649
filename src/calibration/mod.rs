// SPDX-License-Identifier: GPL-3.0-only

//! Camera calibration registry
//!
//! Maps a camera identity (a model token such as `"SR300"` or a full device
//! label) to the fixed intrinsic/extrinsic parameter set of that camera
//! family. The set of families is closed: supporting a new camera means adding
//! a [`CameraProfile`] variant and its literal table in [`profiles`].

pub mod distortion;
pub mod profiles;

pub use distortion::{DistortionModel, DistortionSpec};

use crate::constants::depth::NORMALIZATION;
use crate::errors::CalibrationError;
use glam::{Mat4, Vec2};
use profiles::ProfileTable;

/// Known camera families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraProfile {
    Sr300,
    R200,
}

impl CameraProfile {
    /// All supported profiles, for listing
    pub const ALL: [CameraProfile; 2] = [CameraProfile::Sr300, CameraProfile::R200];

    /// Model token matched against stream labels
    pub fn model_name(&self) -> &'static str {
        match self {
            CameraProfile::Sr300 => "SR300",
            CameraProfile::R200 => "R200",
        }
    }

    /// Human readable product name
    pub fn display_name(&self) -> &'static str {
        match self {
            CameraProfile::Sr300 => "Intel RealSense SR300",
            CameraProfile::R200 => "Intel RealSense R200",
        }
    }

    pub fn table(&self) -> &'static ProfileTable {
        match self {
            CameraProfile::Sr300 => &profiles::SR300,
            CameraProfile::R200 => &profiles::R200,
        }
    }

    /// Find the profile whose model token appears in `identity` (case insensitive)
    pub fn identify(identity: &str) -> Option<CameraProfile> {
        let identity = identity.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|profile| identity.contains(profile.model_name()))
    }

    /// Build the calibration for this profile
    pub fn calibration(&self) -> Result<CameraCalibration, CalibrationError> {
        CameraCalibration::from_table(self.table())
    }
}

/// Intrinsic and extrinsic parameters of one depth camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCalibration {
    /// Normalized depth sample -> meters (includes the 16-bit denormalization)
    pub depth_scale: f32,
    /// Depth sensor focal length (pixels)
    pub depth_focal_length: Vec2,
    /// Depth sensor principal point (pixels)
    pub depth_offset: Vec2,
    /// Color sensor focal length (pixels)
    pub color_focal_length: Vec2,
    /// Color sensor principal point (pixels)
    pub color_offset: Vec2,
    pub depth_distortion: DistortionSpec,
    pub color_distortion: DistortionSpec,
    /// Rigid transform from depth-camera space to color-camera space
    pub depth_to_color: Mat4,
}

impl CameraCalibration {
    /// Fallback for cameras without a profile
    ///
    /// Unit focal lengths, no distortion, identity extrinsics and a zero depth
    /// scale: every depth pixel unprojects to the origin.
    pub fn uncalibrated() -> Self {
        Self {
            depth_scale: 0.0,
            depth_focal_length: Vec2::ONE,
            depth_offset: Vec2::ZERO,
            color_focal_length: Vec2::ONE,
            color_offset: Vec2::ZERO,
            depth_distortion: DistortionSpec::NONE,
            color_distortion: DistortionSpec::NONE,
            depth_to_color: Mat4::IDENTITY,
        }
    }

    /// Validate a literal table and convert it
    pub fn from_table(table: &ProfileTable) -> Result<Self, CalibrationError> {
        let depth_distortion =
            DistortionSpec::new(table.depth_distortion_model, table.depth_distortion_coeffs)?;
        let color_distortion =
            DistortionSpec::new(table.color_distortion_model, table.color_distortion_coeffs)?;

        let depth_to_color = Mat4::from_cols_array(&table.depth_to_color);
        if depth_to_color.row(3) != glam::Vec4::W {
            return Err(CalibrationError::DistortionModelMismatch(
                "depth-to-color transform is not affine".to_string(),
            ));
        }

        Ok(Self {
            depth_scale: table.depth_units * NORMALIZATION,
            depth_focal_length: Vec2::from_array(table.depth_focal_length),
            depth_offset: Vec2::from_array(table.depth_offset),
            color_focal_length: Vec2::from_array(table.color_focal_length),
            color_offset: Vec2::from_array(table.color_offset),
            depth_distortion,
            color_distortion,
            depth_to_color,
        })
    }
}

/// Resolve the calibration for a camera identity
pub fn resolve(identity: &str) -> Result<CameraCalibration, CalibrationError> {
    let profile = CameraProfile::identify(identity)
        .ok_or_else(|| CalibrationError::UnsupportedCamera(identity.to_string()))?;
    profile.calibration()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_from_device_label() {
        assert_eq!(
            CameraProfile::identify("Intel RealSense 3D Camera SR300"),
            Some(CameraProfile::Sr300)
        );
        assert_eq!(
            CameraProfile::identify("intel realsense r200 depth"),
            Some(CameraProfile::R200)
        );
        assert_eq!(CameraProfile::identify("Integrated Webcam"), None);
    }

    #[test]
    fn test_all_profiles_build() {
        for profile in CameraProfile::ALL {
            let calibration = profile.calibration().unwrap();
            assert!(calibration.depth_scale > 0.0);
            assert!(calibration.depth_focal_length.min_element() > 0.0);
        }
    }

    #[test]
    fn test_translation_lives_in_last_column() {
        let calibration = resolve("SR300").unwrap();
        let translation = calibration.depth_to_color.w_axis.truncate();
        assert!((translation.x - 0.025_863_47).abs() < 1e-7);
    }

    #[test]
    fn test_malformed_table_rejected() {
        let mut table = profiles::R200;
        table.depth_distortion_coeffs = [0.5, 0.0, 0.0, 0.0, 0.0];
        assert!(matches!(
            CameraCalibration::from_table(&table),
            Err(CalibrationError::DistortionModelMismatch(_))
        ));
    }
}
