// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Orbit view limits and projection parameters
pub mod view {
    /// Yaw is clamped to +/- this many degrees
    pub const YAW_LIMIT_DEGREES: f32 = 120.0;
    /// Pitch is clamped to +/- this many degrees (prevents flipping over)
    pub const PITCH_LIMIT_DEGREES: f32 = 80.0;
    /// Depth (meters, in front of the sensor) the model rotates around
    pub const PIVOT_DEPTH: f32 = 0.5;
    /// Vertical field of view of the virtual camera
    pub const FIELD_OF_VIEW_DEGREES: f32 = 60.0;
    /// Near clip plane (meters)
    pub const NEAR_PLANE: f32 = 0.1;
    /// Far clip plane (meters)
    pub const FAR_PLANE: f32 = 20.0;
}

/// Depth sample encoding
pub mod depth {
    /// 16-bit depth units are delivered normalized into [0, 1]
    pub const NORMALIZATION: f32 = 65535.0;
}

/// Render loop timing
pub mod timing {
    use super::Duration;

    /// One iteration per display refresh (~60 Hz)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
    /// Default frame rate of the synthetic depth camera
    pub const SYNTHETIC_FPS: u32 = 30;
}

/// Terminal viewer
pub mod terminal {
    /// Approximate pixel size of one terminal cell, used to scale mouse drags
    pub const CELL_WIDTH_PIXELS: f32 = 8.0;
    pub const CELL_HEIGHT_PIXELS: f32 = 16.0;
}

/// Application name used for config and snapshot directories
pub const APP_NAME: &str = "depthview";
