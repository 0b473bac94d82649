// SPDX-License-Identifier: GPL-3.0-only

//! Shared shader utilities
//!
//! WGSL helpers concatenated with shader-specific code at load time, and the
//! uniform blocks that feed them.

mod params;

pub use params::{CalibrationUniforms, ViewUniforms};

/// Lens distortion functions (WGSL)
///
/// Includes:
/// - `distort(point, coeffs, k3, model)` - ideal -> distorted (color path)
/// - `undistort(point, coeffs, k3, model)` - distorted -> ideal (depth path)
pub const DISTORTION_FUNCTIONS: &str = include_str!("distortion.wgsl");
