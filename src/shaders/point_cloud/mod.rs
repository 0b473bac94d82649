// SPDX-License-Identifier: GPL-3.0-only

//! GPU point cloud rendering for 3D depth visualization
//!
//! Draws one point per depth pixel into an offscreen target, colored from the
//! aligned color frame, and reads the result back as RGBA.

mod processor;

pub use processor::{PointCloudProcessor, RenderedFrame};

use crate::shaders::common::DISTORTION_FUNCTIONS;
use std::sync::OnceLock;

/// Point cloud shader entry points
const POINT_CLOUD_MAIN_WGSL: &str = include_str!("point_cloud_main.wgsl");

/// Combined point cloud shader (main + distortion)
static POINT_CLOUD_SHADER_COMBINED: OnceLock<String> = OnceLock::new();

/// Get the combined point cloud shader source
pub fn point_cloud_shader() -> &'static str {
    POINT_CLOUD_SHADER_COMBINED
        .get_or_init(|| format!("{}\n\n{}", POINT_CLOUD_MAIN_WGSL, DISTORTION_FUNCTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validate that a WGSL shader compiles successfully using naga
    fn validate_shader(name: &str, source: &str) {
        let result = naga::front::wgsl::parse_str(source);
        match result {
            Ok(module) => {
                let info = naga::valid::Validator::new(
                    naga::valid::ValidationFlags::all(),
                    naga::valid::Capabilities::all(),
                )
                .validate(&module);

                if let Err(e) = info {
                    panic!("Shader '{}' validation failed: {:?}", name, e);
                }
            }
            Err(e) => {
                panic!("Shader '{}' parse failed: {:?}", name, e);
            }
        }
    }

    #[test]
    fn test_point_cloud_shader_validates() {
        validate_shader("point_cloud", point_cloud_shader());
    }

    #[test]
    fn test_shader_contains_entry_points() {
        let source = point_cloud_shader();
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
        assert!(source.contains("fn undistort"));
    }
}
