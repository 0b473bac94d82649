// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the orbit view controller

use depthview::view::{model_matrix, projection_matrix, view_matrix};
use depthview::{OrbitController, PointerEvent, ViewState};
use glam::{Mat4, Vec2};

fn drag(controller: &mut OrbitController, from: Vec2, to: Vec2) {
    controller.handle(PointerEvent::Down(from));
    controller.handle(PointerEvent::Move(to));
    controller.handle(PointerEvent::Up(to));
}

#[test]
fn test_large_drag_clamps_yaw() {
    let mut controller = OrbitController::new();
    drag(&mut controller, Vec2::ZERO, Vec2::new(10000.0, 0.0));
    assert_eq!(controller.state().yaw, -120.0);

    drag(&mut controller, Vec2::ZERO, Vec2::new(-20000.0, 0.0));
    assert_eq!(controller.state().yaw, 120.0);
}

#[test]
fn test_large_drag_clamps_pitch() {
    let mut controller = OrbitController::new();
    drag(&mut controller, Vec2::ZERO, Vec2::new(0.0, 500.0));
    assert_eq!(controller.state().pitch, 80.0);

    drag(&mut controller, Vec2::ZERO, Vec2::new(0.0, -1000.0));
    assert_eq!(controller.state().pitch, -80.0);
}

#[test]
fn test_angles_stay_in_range_for_any_drag() {
    let mut controller = OrbitController::new();
    controller.pointer_down(Vec2::ZERO);
    let mut position = Vec2::ZERO;
    for step in 0..200 {
        let delta = Vec2::new(
            ((step * 37) % 101) as f32 - 50.0,
            ((step * 53) % 67) as f32 - 33.0,
        );
        position += delta * 3.0;
        controller.pointer_move(position);
        let state = controller.state();
        assert!((-120.0..=120.0).contains(&state.yaw));
        assert!((-80.0..=80.0).contains(&state.pitch));
    }
}

#[test]
fn test_moves_without_press_are_ignored() {
    let mut controller = OrbitController::new();
    controller.handle(PointerEvent::Move(Vec2::new(40.0, 40.0)));
    assert_eq!(controller.state(), ViewState::default());

    // Release records the position but does not rotate
    controller.handle(PointerEvent::Up(Vec2::new(5.0, 6.0)));
    assert_eq!(controller.last_position(), Vec2::new(5.0, 6.0));
    assert_eq!(controller.state(), ViewState::default());
}

#[test]
fn test_rest_model_is_identity() {
    let model = model_matrix(ViewState::default());
    assert!(model.abs_diff_eq(Mat4::IDENTITY, 1e-6));
}

#[test]
fn test_rest_mvp_is_projection_times_view() {
    let controller = OrbitController::new();
    let mvp = controller.view_projection(640, 480);
    let expected = projection_matrix(640, 480) * view_matrix();
    assert!(mvp.abs_diff_eq(expected, 1e-6));
}
