// SPDX-License-Identifier: GPL-3.0-only

//! Factory calibration tables for the supported RealSense cameras
//!
//! Intrinsics are in pixels of each stream's reference resolution, stored
//! per table: SR300 streams both run at 640x480, R200 depth at 480x360.
//!
//! `depth_to_color` is stored in GPU upload order: four columns of four
//! values, the last column holding the translation in meters.

use super::distortion::DistortionModel;

/// Literal calibration table for one camera family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileTable {
    /// Meters per raw 16-bit depth unit
    pub depth_units: f32,
    /// Depth stream size the depth intrinsics were measured at
    pub depth_resolution: [u32; 2],
    /// Color stream size the color intrinsics were measured at
    pub color_resolution: [u32; 2],
    pub depth_focal_length: [f32; 2],
    pub depth_offset: [f32; 2],
    pub color_focal_length: [f32; 2],
    pub color_offset: [f32; 2],
    pub depth_distortion_model: DistortionModel,
    pub depth_distortion_coeffs: [f32; 5],
    pub color_distortion_model: DistortionModel,
    pub color_distortion_coeffs: [f32; 5],
    pub depth_to_color: [f32; 16],
}

/// Intel RealSense SR300 (short range, coded light)
pub const SR300: ProfileTable = ProfileTable {
    depth_units: 0.000_124_986_647_279_001_772_4,
    depth_resolution: [640, 480],
    color_resolution: [640, 480],
    depth_focal_length: [475.900_726_318_359_375, 475.900_726_318_359_375],
    depth_offset: [310.743_988_037_109_375, 245.181_167_602_539_062_5],
    color_focal_length: [617.650_878_906_25, 617.650_878_906_25],
    color_offset: [312.073_974_609_375, 241.969_329_833_984_375],
    depth_distortion_model: DistortionModel::InverseBrownConrady,
    depth_distortion_coeffs: [
        0.146_557_062_864_303_588_87,
        0.078_352_205_455_303_192_139,
        0.002_611_372_387_036_681_175_2,
        0.002_921_880_921_348_929_405_2,
        0.066_788_062_453_269_958_496,
    ],
    color_distortion_model: DistortionModel::None,
    color_distortion_coeffs: [0.0; 5],
    depth_to_color: [
        0.999_983_251_094_818_115_23,
        0.002_231_199_527_159_333_229,
        0.005_339_783_150_702_714_92,
        0.0,
        -0.002_138_340_380_042_791_366_6,
        0.999_847_471_714_019_775_39,
        -0.017_333_013_936_877_250_671,
        0.0,
        -0.005_377_642_344_683_408_737_2,
        0.017_321_307_212_114_334_106,
        0.999_835_550_785_064_697_27,
        0.0,
        0.025_863_470_137_119_293_213,
        -0.000_202_390_760_304_406_285_29,
        0.003_815_136_859_193_444_252,
        1.0,
    ],
};

/// Intel RealSense R200 (long range, active stereo)
pub const R200: ProfileTable = ProfileTable {
    depth_units: 0.001,
    depth_resolution: [480, 360],
    color_resolution: [640, 480],
    depth_focal_length: [447.320_953_369_140_625, 447.320_953_369_140_625],
    depth_offset: [233.397_506_713_867_187_5, 179.261_886_596_679_687_5],
    color_focal_length: [627.963_012_695_312_5, 634.024_108_886_718_75],
    color_offset: [311.841_033_935_546_875, 229.751_327_514_648_437_5],
    depth_distortion_model: DistortionModel::None,
    depth_distortion_coeffs: [0.0; 5],
    color_distortion_model: DistortionModel::ModifiedBrownConrady,
    color_distortion_coeffs: [
        -0.078_357_703_983_783_721_924,
        0.041_351_985_186_338_424_683,
        -0.000_255_653_867_498_040_199_28,
        0.001_235_728_734_172_880_649_6,
        0.0,
    ],
    depth_to_color: [
        0.999_983_251_094_818_115_23,
        0.002_231_199_527_159_333_229,
        0.005_339_783_150_702_714_92,
        0.0,
        -0.002_138_340_380_042_791_366_6,
        0.999_847_471_714_019_775_39,
        -0.017_333_013_936_877_250_671,
        0.0,
        -0.005_377_642_344_683_408_737_2,
        0.017_321_307_212_114_334_106,
        0.999_835_550_785_064_697_27,
        0.0,
        -0.058_898_702_263_832_092_285,
        -0.000_202_838_957_193_307_578_56,
        -0.000_199_841_917_492_449_283_6,
        1.0,
    ],
};
