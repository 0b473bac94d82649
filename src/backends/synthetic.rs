// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic depth camera
//!
//! Produces a moving sphere in front of a flat back wall, rendered with the
//! intrinsics of a known camera profile so the resulting point cloud has the
//! right shape. Useful without hardware and for demos.

use super::{CameraStreams, ColorFrame, DepthFrame, VideoSource};
use crate::calibration::CameraProfile;
use crate::calibration::profiles::ProfileTable;
use crate::constants::depth::NORMALIZATION;
use crate::errors::SourceError;
use glam::{Vec2, Vec3};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const WALL_DEPTH: f32 = 1.4;
const SPHERE_RADIUS: f32 = 0.2;
const SPHERE_DEPTH: f32 = 0.8;

/// Open a synthetic color + depth pair
///
/// Unknown camera names still open; the scene then uses SR300 intrinsics and
/// the stream label is the name as given, so calibration lookup fails the same
/// way it would for real hardware.
pub fn open(camera: &str, width: u32, height: u32, fps: u32) -> Result<CameraStreams, SourceError> {
    if width == 0 || height == 0 {
        return Err(SourceError::InvalidStream(format!(
            "synthetic resolution {}x{} is empty",
            width, height
        )));
    }

    let profile = CameraProfile::identify(camera);
    let label = match profile {
        Some(profile) => format!("{} (synthetic)", profile.display_name()),
        None => camera.to_string(),
    };
    let table = profile.unwrap_or(CameraProfile::Sr300).table();

    let (focal_length, offset) = scaled_depth_intrinsics(table, width, height);
    let frame_period = Duration::from_secs(1) / fps.max(1);
    let started = Instant::now();

    info!(label = %label, width, height, fps, "Opening synthetic depth camera");

    let depth = SyntheticDepthStream {
        label: label.clone(),
        width,
        height,
        focal_length,
        offset,
        depth_units: table.depth_units,
        clock: FrameClock::new(started, frame_period),
        cached: None,
    };
    let color = SyntheticColorStream {
        label,
        width,
        height,
        clock: FrameClock::new(started, frame_period),
        cached: None,
    };

    Ok(CameraStreams {
        depth: Box::new(depth),
        color: Box::new(color),
    })
}

/// Depth focal length and principal point rescaled from the table's
/// reference resolution to `width` x `height`
fn scaled_depth_intrinsics(table: &ProfileTable, width: u32, height: u32) -> (Vec2, Vec2) {
    let [base_width, base_height] = table.depth_resolution;
    let scale = Vec2::new(
        width as f32 / base_width as f32,
        height as f32 / base_height as f32,
    );
    (
        Vec2::from_array(table.depth_focal_length) * scale,
        Vec2::from_array(table.depth_offset) * scale,
    )
}

/// Maps wall-clock time to frame numbers
#[derive(Debug, Clone, Copy)]
struct FrameClock {
    started: Instant,
    period: Duration,
}

impl FrameClock {
    fn new(started: Instant, period: Duration) -> Self {
        Self { started, period }
    }

    /// The first frame is "decoded" one period after start
    fn is_ready(&self) -> bool {
        self.started.elapsed() >= self.period
    }

    fn frame_index(&self) -> u64 {
        (self.started.elapsed().as_nanos() / self.period.as_nanos().max(1)) as u64
    }

    fn frame_time(&self, index: u64) -> f32 {
        self.period.as_secs_f32() * index as f32
    }
}

struct SyntheticDepthStream {
    label: String,
    width: u32,
    height: u32,
    focal_length: Vec2,
    offset: Vec2,
    depth_units: f32,
    clock: FrameClock,
    cached: Option<(u64, DepthFrame)>,
}

impl SyntheticDepthStream {
    fn render(&self, time: f32) -> DepthFrame {
        let center = Vec3::new(0.15 * (time * 0.8).sin(), 0.0, SPHERE_DEPTH);
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let ray = (Vec2::new(x as f32, y as f32) - self.offset) / self.focal_length;
                let depth_m = scene_depth(ray, center);
                let raw = (depth_m / self.depth_units).round().min(NORMALIZATION);
                data.push(raw / NORMALIZATION);
            }
        }
        DepthFrame::new(self.width, self.height, data)
    }
}

/// Depth along the pixel ray (z, meters): sphere if hit, back wall otherwise
fn scene_depth(ray: Vec2, center: Vec3) -> f32 {
    let direction = ray.extend(1.0);
    let a = direction.length_squared();
    let b = direction.dot(center);
    let c = center.length_squared() - SPHERE_RADIUS * SPHERE_RADIUS;
    let discriminant = b * b - a * c;
    if discriminant >= 0.0 {
        let s = (b - discriminant.sqrt()) / a;
        if s > 0.0 {
            return s;
        }
    }
    WALL_DEPTH
}

impl VideoSource for SyntheticDepthStream {
    type Frame = DepthFrame;

    fn label(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        self.clock.is_ready()
    }

    fn latest_frame(&mut self) -> Option<DepthFrame> {
        if !self.is_ready() {
            return None;
        }
        let index = self.clock.frame_index();
        match &self.cached {
            Some((cached_index, frame)) if *cached_index == index => Some(frame.clone()),
            _ => {
                let frame = self.render(self.clock.frame_time(index));
                debug!(index, "Synthetic depth frame");
                self.cached = Some((index, frame.clone()));
                Some(frame)
            }
        }
    }
}

struct SyntheticColorStream {
    label: String,
    width: u32,
    height: u32,
    clock: FrameClock,
    cached: Option<(u64, ColorFrame)>,
}

impl SyntheticColorStream {
    fn render(&self, index: u64) -> ColorFrame {
        let shift = (index % 64) as u32;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                let checker = ((x + shift) / 32 + y / 32) % 2 == 0;
                data.push((x * 255 / self.width.max(1)) as u8);
                data.push((y * 255 / self.height.max(1)) as u8);
                data.push(if checker { 200 } else { 60 });
                data.push(255);
            }
        }
        ColorFrame::new(self.width, self.height, data)
    }
}

impl VideoSource for SyntheticColorStream {
    type Frame = ColorFrame;

    fn label(&self) -> &str {
        &self.label
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        self.clock.is_ready()
    }

    fn latest_frame(&mut self) -> Option<ColorFrame> {
        if !self.is_ready() {
            return None;
        }
        let index = self.clock.frame_index();
        match &self.cached {
            Some((cached_index, frame)) if *cached_index == index => Some(frame.clone()),
            _ => {
                let frame = self.render(index);
                self.cached = Some((index, frame.clone()));
                Some(frame)
            }
        }
    }
}
