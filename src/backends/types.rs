// SPDX-License-Identifier: GPL-3.0-only

//! Frame types shared by all video sources

use crate::constants::depth::NORMALIZATION;
use std::sync::Arc;

/// A decoded color frame, RGBA 8 bits per channel, tightly packed
#[derive(Debug, Clone)]
pub struct ColorFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl ColorFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    /// Expected byte length for the frame dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A decoded depth frame: one normalized sample per pixel
///
/// Samples are raw 16-bit sensor units divided by 65535, the same encoding a
/// float depth texture receives. Multiply by the calibration's depth scale to
/// get meters.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[f32]>,
}

impl DepthFrame {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    /// Normalize raw 16-bit sensor units
    pub fn from_raw_u16(width: u32, height: u32, raw: &[u16]) -> Self {
        let data: Vec<f32> = raw.iter().map(|&d| d as f32 / NORMALIZATION).collect();
        Self::new(width, height, data)
    }

    /// Frame where every pixel holds the same normalized sample
    pub fn constant(width: u32, height: u32, value: f32) -> Self {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Sample at (x, y), `None` outside the frame or past the end of the data
    pub fn sample(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}
