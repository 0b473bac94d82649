// SPDX-License-Identifier: GPL-3.0-only
//! Shader definitions and GPU processors
//!
//! The point cloud pipeline is the only GPU consumer; shared WGSL helpers and
//! uniform layouts live in `common`.

pub mod common;
mod gpu_processor;
pub mod point_cloud;

pub use common::{CalibrationUniforms, ViewUniforms};
pub use gpu_processor::{CachedDimensions, read_buffer_async};
pub use point_cloud::{PointCloudProcessor, RenderedFrame};
