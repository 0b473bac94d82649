// SPDX-License-Identifier: GPL-3.0-only

//! Lens distortion models
//!
//! Both Brown-Conrady variants evaluate the same fixed polynomial on normalized
//! image coordinates (pixel minus principal point, divided by focal length):
//!
//! - radial factor `f = 1 + k1 r² + k2 r⁴ + k3 r⁶`
//! - tangential terms `2 p1 x y + p2 (r² + 2x²)` and `2 p2 x y + p1 (r² + 2y²)`
//!
//! They differ in which direction the polynomial describes. Modified
//! Brown-Conrady coefficients map an ideal ray to a distorted pixel (the color
//! sensor), inverse Brown-Conrady coefficients map a distorted pixel back to an
//! ideal ray (the depth sensor). Evaluating a model against its native
//! direction uses the first-order correction `2p - poly(p)`; no iterative
//! solver is involved.

use crate::errors::CalibrationError;
use glam::Vec2;

/// Distortion model tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum DistortionModel {
    /// Ideal pinhole, no distortion
    #[default]
    None = 0,
    /// Forward radial + tangential distortion (ideal -> distorted)
    ModifiedBrownConrady = 1,
    /// Correction polynomial (distorted -> ideal)
    InverseBrownConrady = 2,
}

impl DistortionModel {
    /// Name used in logs and the profile listing
    pub fn display_name(&self) -> &'static str {
        match self {
            DistortionModel::None => "none",
            DistortionModel::ModifiedBrownConrady => "modified Brown-Conrady",
            DistortionModel::InverseBrownConrady => "inverse Brown-Conrady",
        }
    }
}

/// A distortion model paired with its `[k1, k2, p1, p2, k3]` coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistortionSpec {
    model: DistortionModel,
    coeffs: [f32; 5],
}

impl DistortionSpec {
    /// No distortion
    pub const NONE: DistortionSpec = DistortionSpec {
        model: DistortionModel::None,
        coeffs: [0.0; 5],
    };

    /// Build a spec, rejecting coefficient sets the model cannot carry.
    ///
    /// A `None` model must come with all-zero coefficients and every
    /// coefficient must be finite.
    pub fn new(model: DistortionModel, coeffs: [f32; 5]) -> Result<Self, CalibrationError> {
        if let Some(bad) = coeffs.iter().find(|c| !c.is_finite()) {
            return Err(CalibrationError::DistortionModelMismatch(format!(
                "non-finite coefficient {} for {} model",
                bad,
                model.display_name()
            )));
        }
        if model == DistortionModel::None && coeffs.iter().any(|&c| c != 0.0) {
            return Err(CalibrationError::DistortionModelMismatch(format!(
                "model 'none' carries coefficients {:?}",
                coeffs
            )));
        }
        Ok(Self { model, coeffs })
    }

    pub fn model(&self) -> DistortionModel {
        self.model
    }

    pub fn coeffs(&self) -> [f32; 5] {
        self.coeffs
    }

    /// Apply distortion to an ideal normalized point (color path)
    pub fn distort(&self, point: Vec2) -> Vec2 {
        match self.model {
            DistortionModel::None => point,
            DistortionModel::ModifiedBrownConrady => modified_brown_conrady(point, &self.coeffs),
            DistortionModel::InverseBrownConrady => {
                2.0 * point - inverse_brown_conrady(point, &self.coeffs)
            }
        }
    }

    /// Remove distortion from a distorted normalized point (depth path)
    pub fn undistort(&self, point: Vec2) -> Vec2 {
        match self.model {
            DistortionModel::None => point,
            DistortionModel::InverseBrownConrady => inverse_brown_conrady(point, &self.coeffs),
            DistortionModel::ModifiedBrownConrady => {
                2.0 * point - modified_brown_conrady(point, &self.coeffs)
            }
        }
    }
}

fn radial_factor(r2: f32, c: &[f32; 5]) -> f32 {
    1.0 + c[0] * r2 + c[1] * r2 * r2 + c[4] * r2 * r2 * r2
}

/// Radial scaling first, then tangential terms on the scaled coordinates
fn modified_brown_conrady(point: Vec2, c: &[f32; 5]) -> Vec2 {
    let r2 = point.length_squared();
    let f = radial_factor(r2, c);
    let x = point.x * f;
    let y = point.y * f;
    Vec2::new(
        x + 2.0 * c[2] * x * y + c[3] * (r2 + 2.0 * x * x),
        y + 2.0 * c[3] * x * y + c[2] * (r2 + 2.0 * y * y),
    )
}

/// Radial and tangential terms both evaluated on the input coordinates
fn inverse_brown_conrady(point: Vec2, c: &[f32; 5]) -> Vec2 {
    let r2 = point.length_squared();
    let f = radial_factor(r2, c);
    let (x, y) = (point.x, point.y);
    Vec2::new(
        x * f + 2.0 * c[2] * x * y + c[3] * (r2 + 2.0 * x * x),
        y * f + 2.0 * c[3] * x * y + c[2] * (r2 + 2.0 * y * y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const COEFFS: [f32; 5] = [0.1, 0.05, 0.002, -0.003, 0.01];

    #[test]
    fn test_none_rejects_coefficients() {
        let result = DistortionSpec::new(DistortionModel::None, [0.1, 0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            result,
            Err(CalibrationError::DistortionModelMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_coefficients() {
        let result = DistortionSpec::new(
            DistortionModel::ModifiedBrownConrady,
            [f32::NAN, 0.0, 0.0, 0.0, 0.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_optical_axis_is_fixed_point() {
        for model in [
            DistortionModel::ModifiedBrownConrady,
            DistortionModel::InverseBrownConrady,
        ] {
            let spec = DistortionSpec::new(model, COEFFS).unwrap();
            assert_eq!(spec.distort(Vec2::ZERO), Vec2::ZERO);
            assert_eq!(spec.undistort(Vec2::ZERO), Vec2::ZERO);
        }
    }

    #[test]
    fn test_modified_radial_only() {
        let spec =
            DistortionSpec::new(DistortionModel::ModifiedBrownConrady, [0.1, 0.0, 0.0, 0.0, 0.0])
                .unwrap();
        // r² = 0.25, f = 1.025
        let out = spec.distort(Vec2::new(0.3, 0.4));
        assert!((out.x - 0.3075).abs() < 1e-6);
        assert!((out.y - 0.41).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_tangential_terms() {
        let spec =
            DistortionSpec::new(DistortionModel::InverseBrownConrady, [0.0, 0.0, 0.01, 0.02, 0.0])
                .unwrap();
        let p = Vec2::new(0.2, 0.1);
        let r2 = 0.05;
        let out = spec.undistort(p);
        let expected_x = 0.2 + 2.0 * 0.01 * 0.2 * 0.1 + 0.02 * (r2 + 2.0 * 0.04);
        let expected_y = 0.1 + 2.0 * 0.02 * 0.2 * 0.1 + 0.01 * (r2 + 2.0 * 0.01);
        assert!((out.x - expected_x).abs() < 1e-6);
        assert!((out.y - expected_y).abs() < 1e-6);
    }

    #[test]
    fn test_first_order_inverse_is_close() {
        let spec = DistortionSpec::new(DistortionModel::ModifiedBrownConrady, COEFFS).unwrap();
        let p = Vec2::new(0.1, -0.05);
        let back = spec.undistort(spec.distort(p));
        assert!((back - p).length() < 1e-4, "{:?} vs {:?}", back, p);
    }
}
