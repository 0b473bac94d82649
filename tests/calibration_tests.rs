// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the calibration registry and distortion models

use depthview::calibration::{CameraProfile, DistortionModel, DistortionSpec};
use depthview::{CalibrationError, resolve};
use glam::Vec2;

#[test]
fn test_sr300_depth_scale() {
    let calibration = resolve("SR300").unwrap();
    assert_eq!(
        calibration.depth_scale,
        0.000_124_986_647_279_001_772_4_f32 * 65535.0
    );
}

#[test]
fn test_unknown_camera_is_unsupported() {
    let err = resolve("XYZ999").unwrap_err();
    assert_eq!(err, CalibrationError::UnsupportedCamera("XYZ999".to_string()));
}

#[test]
fn test_resolve_from_device_labels() {
    // Device labels carry the model token somewhere in the string
    let sr300 = resolve("Intel(R) RealSense(TM) 3D Camera SR300 Depth").unwrap();
    assert_eq!(sr300, CameraProfile::Sr300.calibration().unwrap());

    let r200 = resolve("Intel RealSense R200 Depth").unwrap();
    assert_eq!(r200, CameraProfile::R200.calibration().unwrap());
}

#[test]
fn test_profiles_have_one_distorted_stream() {
    let sr300 = CameraProfile::Sr300.calibration().unwrap();
    assert_eq!(
        sr300.depth_distortion.model(),
        DistortionModel::InverseBrownConrady
    );
    assert_eq!(sr300.color_distortion.model(), DistortionModel::None);

    let r200 = CameraProfile::R200.calibration().unwrap();
    assert_eq!(r200.depth_distortion.model(), DistortionModel::None);
    assert_eq!(
        r200.color_distortion.model(),
        DistortionModel::ModifiedBrownConrady
    );
}

#[test]
fn test_extrinsics_are_rigid() {
    for profile in CameraProfile::ALL {
        let calibration = profile.calibration().unwrap();
        let rotation = glam::Mat3::from_mat4(calibration.depth_to_color);
        assert!((rotation.determinant() - 1.0).abs() < 1e-4, "{:?}", profile);
    }
}

/// Points within 0.25 of the optical axis
fn sample_points() -> Vec<Vec2> {
    let mut points = Vec::new();
    for ring in 0..=10 {
        let radius = 0.25 * ring as f32 / 10.0;
        for step in 0..16 {
            let angle = std::f32::consts::TAU * step as f32 / 16.0;
            points.push(Vec2::from_angle(angle) * radius);
        }
    }
    points
}

fn assert_round_trip(spec: &DistortionSpec) {
    for p in sample_points() {
        let back = spec.undistort(spec.distort(p));
        assert!(
            back.distance(p) < 1e-3,
            "{:?}: {:?} came back as {:?}",
            spec.model(),
            p,
            back
        );

        let forward = spec.distort(spec.undistort(p));
        assert!(forward.distance(p) < 1e-3);
    }
}

#[test]
fn test_inverse_brown_conrady_round_trip() {
    let sr300 = CameraProfile::Sr300.calibration().unwrap();
    assert_round_trip(&sr300.depth_distortion);
}

#[test]
fn test_modified_brown_conrady_round_trip() {
    let r200 = CameraProfile::R200.calibration().unwrap();
    assert_round_trip(&r200.color_distortion);
}

#[test]
fn test_none_model_is_identity() {
    let p = Vec2::new(0.2, -0.1);
    assert_eq!(DistortionSpec::NONE.distort(p), p);
    assert_eq!(DistortionSpec::NONE.undistort(p), p);
}

#[test]
fn test_mismatched_distortion_rejected() {
    let err = DistortionSpec::new(DistortionModel::None, [0.1, 0.0, 0.0, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, CalibrationError::DistortionModelMismatch(_)));
}

#[test]
fn test_principal_points_sit_inside_reference_resolution() {
    for profile in CameraProfile::ALL {
        let table = profile.table();
        for (offset, [width, height]) in [
            (table.depth_offset, table.depth_resolution),
            (table.color_offset, table.color_resolution),
        ] {
            let center = Vec2::new(width as f32, height as f32) * 0.5;
            let distance = (Vec2::from_array(offset) - center).abs();
            assert!(distance.max_element() < 30.0, "{:?}: {:?}", profile, offset);
        }
    }
}
