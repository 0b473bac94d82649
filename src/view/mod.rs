// SPDX-License-Identifier: GPL-3.0-only

//! Orbit view controller
//!
//! Pointer drags rotate the point cloud around a pivot half a meter in front
//! of the sensor. Yaw and pitch are accumulated in degrees and clamped so the
//! view can never flip over.

use crate::constants::view::{
    FAR_PLANE, FIELD_OF_VIEW_DEGREES, NEAR_PLANE, PITCH_LIMIT_DEGREES, PIVOT_DEPTH,
    YAW_LIMIT_DEGREES,
};
use glam::{Mat4, Vec2, Vec3};

/// Accumulated orbit rotation (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewState {
    pub yaw: f32,
    pub pitch: f32,
}

impl ViewState {
    /// Apply a pointer delta, keeping both angles inside their limits
    pub fn rotate_by(&mut self, delta: Vec2) {
        self.yaw = (self.yaw - delta.x).clamp(-YAW_LIMIT_DEGREES, YAW_LIMIT_DEGREES);
        self.pitch = (self.pitch + delta.y).clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
    }
}

/// Pointer input routed to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Vec2),
    Move(Vec2),
    Up(Vec2),
}

/// Drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Owns the view state and turns pointer drags into rotation
#[derive(Debug, Clone, Default)]
pub struct OrbitController {
    state: ViewState,
    drag: DragState,
    last_position: Vec2,
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.drag == DragState::Dragging
    }

    /// Dispatch one pointer event
    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(position) => self.pointer_down(position),
            PointerEvent::Move(position) => self.pointer_move(position),
            PointerEvent::Up(position) => self.pointer_up(position),
        }
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.drag = DragState::Dragging;
        self.last_position = position;
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        if self.drag != DragState::Dragging {
            return;
        }
        self.state.rotate_by(position - self.last_position);
        self.last_position = position;
    }

    pub fn pointer_up(&mut self, position: Vec2) {
        self.drag = DragState::Idle;
        self.last_position = position;
    }

    /// Last pointer position seen by a down, move-while-dragging, or up event
    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    /// Model-view-projection matrix for a viewport of `width` x `height`
    pub fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        view_projection(self.state, width, height)
    }
}

/// Rotation about the pivot for the given view state
pub fn model_matrix(state: ViewState) -> Mat4 {
    let pivot = Vec3::new(0.0, 0.0, PIVOT_DEPTH);
    Mat4::from_translation(pivot)
        * Mat4::from_rotation_x(state.pitch.to_radians())
        * Mat4::from_rotation_y(state.yaw.to_radians())
        * Mat4::from_translation(-pivot)
}

/// Camera at the sensor origin looking down +Z with -Y up (image rows grow downward)
pub fn view_matrix() -> Mat4 {
    Mat4::look_at_rh(Vec3::ZERO, Vec3::Z, Vec3::NEG_Y)
}

/// Perspective projection; clip-space depth maps to 0..1 as wgpu expects
pub fn projection_matrix(width: u32, height: u32) -> Mat4 {
    let aspect = width as f32 / height.max(1) as f32;
    Mat4::perspective_rh(
        FIELD_OF_VIEW_DEGREES.to_radians(),
        aspect,
        NEAR_PLANE,
        FAR_PLANE,
    )
}

pub fn view_projection(state: ViewState, width: u32, height: u32) -> Mat4 {
    projection_matrix(width, height) * view_matrix() * model_matrix(state)
}
