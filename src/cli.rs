// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the point cloud viewer
//!
//! This module provides command-line functionality for:
//! - Rendering a single point cloud frame to PNG
//! - Listing the built-in camera calibrations
//! - Unprojecting a single depth pixel

use clap::Args;
use depthview::backends::{self, CameraStreams};
use depthview::calibration::{self, CameraProfile};
use depthview::config::{Config, SourceConfig};
use depthview::geometry;
use depthview::renderer::{FrameOutcome, ViewerSession};
use depthview::shaders::PointCloudProcessor;
use depthview::snapshot;
use glam::{UVec2, Vec2};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Stream source overrides shared by the viewing commands
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Synthetic camera model or label (e.g., "SR300")
    #[arg(long, conflicts_with_all = ["color", "depth"])]
    pub camera: Option<String>,

    /// Color image (PNG/JPEG) to pair with --depth
    #[arg(long, requires = "depth")]
    pub color: Option<PathBuf>,

    /// 16-bit grayscale depth image to pair with --color
    #[arg(long, requires = "color")]
    pub depth: Option<PathBuf>,

    /// Camera label for file sources (selects the calibration)
    #[arg(long, default_value = "SR300")]
    pub label: String,
}

/// Apply command line source overrides to the loaded config
pub fn apply_source_args(config: &mut Config, args: &SourceArgs) {
    if let (Some(color), Some(depth)) = (&args.color, &args.depth) {
        config.source = SourceConfig::Files {
            color: color.clone(),
            depth: depth.clone(),
            camera_label: args.label.clone(),
        };
        return;
    }

    if let Some(camera) = &args.camera {
        if matches!(config.source, SourceConfig::Files { .. }) {
            config.source = SourceConfig::default_synthetic();
        }
        if let SourceConfig::Synthetic { camera: current, .. } = &mut config.source {
            *current = camera.clone();
        }
    }
}

/// Render one frame and save it as PNG
pub fn take_snapshot(
    config: Config,
    output: Option<PathBuf>,
    yaw: f32,
    pitch: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let streams = runtime.block_on(backends::open_streams(&config.source))?;
    println!("Using source: {}", streams.identity());

    let streams = runtime.block_on(wait_until_ready(streams, Duration::from_secs(5)))?;

    let processor = pollster::block_on(PointCloudProcessor::new(config.clear_color))?;
    let mut session = ViewerSession::with_streams(processor, streams);

    // Orbit to the requested angles with a synthetic drag
    let controller = session.controller_mut();
    controller.pointer_down(Vec2::ZERO);
    controller.pointer_move(Vec2::new(-yaw, pitch));
    controller.pointer_up(Vec2::new(-yaw, pitch));

    match session.tick()? {
        FrameOutcome::Drawn { points } => println!("Rendered {} points", points),
        FrameOutcome::UploadFailed(e) => return Err(e.into()),
        FrameOutcome::Cleared => return Err("Streams produced no frames".into()),
    }

    let frame = pollster::block_on(session.renderer().target().read_frame())?
        .ok_or("Nothing was rendered")?;

    let path = output.unwrap_or_else(|| snapshot::timestamped_path(&snapshot::default_snapshot_dir()));
    snapshot::save_png(&frame, &path)?;
    println!("Saved: {}", path.display());

    Ok(())
}

async fn wait_until_ready(
    streams: CameraStreams,
    timeout: Duration,
) -> Result<CameraStreams, Box<dyn std::error::Error>> {
    let start = Instant::now();
    while !streams.is_ready() {
        if start.elapsed() > timeout {
            return Err("Timed out waiting for frames".into());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(streams)
}

/// List the built-in camera calibrations
pub fn list_profiles() -> Result<(), Box<dyn std::error::Error>> {
    println!("Supported cameras:");
    println!();
    for profile in CameraProfile::ALL {
        let calibration = profile.calibration()?;
        let table = profile.table();
        println!("  {} ({})", profile.display_name(), profile.model_name());
        println!(
            "      Depth: {}x{}, focal {:.2} x {:.2}, center {:.2}, {:.2}, {}",
            table.depth_resolution[0],
            table.depth_resolution[1],
            calibration.depth_focal_length.x,
            calibration.depth_focal_length.y,
            calibration.depth_offset.x,
            calibration.depth_offset.y,
            calibration.depth_distortion.model().display_name()
        );
        println!(
            "      Color: {}x{}, focal {:.2} x {:.2}, center {:.2}, {:.2}, {}",
            table.color_resolution[0],
            table.color_resolution[1],
            calibration.color_focal_length.x,
            calibration.color_focal_length.y,
            calibration.color_offset.x,
            calibration.color_offset.y,
            calibration.color_distortion.model().display_name()
        );
        println!(
            "      Depth scale: {:.4} m per normalized unit",
            calibration.depth_scale
        );
        println!();
    }
    Ok(())
}

/// Unproject one depth pixel and print the 3D point and color pixel
pub fn project_pixel(
    camera: &str,
    x: u32,
    y: u32,
    raw: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let calibration = calibration::resolve(camera)?;
    let normalized = raw as f32 / depthview::constants::depth::NORMALIZATION;
    let point = geometry::project(UVec2::new(x, y), normalized, &calibration);

    println!(
        "position: ({:.4}, {:.4}, {:.4}) m",
        point.position.x, point.position.y, point.position.z
    );
    println!(
        "color pixel: ({:.2}, {:.2})",
        point.color_uv.x, point.color_uv.y
    );
    Ok(())
}
