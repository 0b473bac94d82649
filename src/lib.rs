// SPDX-License-Identifier: GPL-3.0-only

//! depthview - a depth camera point cloud viewer
//!
//! Turns a depth stream and its aligned color stream into a colored 3D point
//! cloud and lets the user orbit it with pointer drags.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`calibration`]: Camera profiles, intrinsics and lens distortion
//! - [`geometry`]: CPU unprojection of depth pixels (mirrors the vertex shader)
//! - [`view`]: Orbit controller and model-view-projection matrices
//! - [`backends`]: Color/depth stream sources and asynchronous acquisition
//! - [`renderer`]: Per-frame loop over a GPU render target
//! - [`shaders`]: wgpu point cloud pipeline and WGSL sources
//! - [`terminal`]: Interactive terminal front end
//! - [`config`]: User configuration handling

pub mod backends;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod errors;
pub mod geometry;
pub mod gpu;
pub mod renderer;
pub mod shaders;
pub mod snapshot;
pub mod terminal;
pub mod view;

// Re-export commonly used types
pub use calibration::{CameraCalibration, CameraProfile, DistortionModel, resolve};
pub use config::Config;
pub use errors::{AppError, AppResult, CalibrationError, RenderError, SourceError};
pub use renderer::{FrameGeometryCache, FrameOutcome, PointCloudRenderer, PointCloudTarget};
pub use view::{OrbitController, PointerEvent, ViewState};
