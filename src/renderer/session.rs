// SPDX-License-Identifier: GPL-3.0-only

//! Viewer session: stream acquisition, pointer input and the frame loop
//!
//! The render loop starts before the streams exist. Each tick polls the
//! pending acquisition; once streams arrive their calibration is resolved and
//! uploaded, and from then on every tick renders their latest frames.

use super::{FrameOutcome, PointCloudRenderer, PointCloudTarget};
use crate::backends::{CameraStreams, StreamAcquisition};
use crate::errors::RenderError;
use crate::view::{OrbitController, PointerEvent};
use tracing::{error, info};

/// Where the session stands, for status display
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Streams still being opened
    Waiting,
    /// Streams attached
    Streaming { identity: String, calibrated: bool },
    /// Stream setup failed; the view stays cleared
    Failed(String),
}

pub struct ViewerSession<T> {
    renderer: PointCloudRenderer<T>,
    acquisition: Option<StreamAcquisition>,
    streams: Option<CameraStreams>,
    controller: OrbitController,
    status: SessionStatus,
}

impl<T: PointCloudTarget> ViewerSession<T> {
    /// Session whose streams are still being acquired
    pub fn new(target: T, acquisition: StreamAcquisition) -> Self {
        Self {
            renderer: PointCloudRenderer::new(target),
            acquisition: Some(acquisition),
            streams: None,
            controller: OrbitController::new(),
            status: SessionStatus::Waiting,
        }
    }

    /// Session over already-open streams
    pub fn with_streams(target: T, streams: CameraStreams) -> Self {
        let mut session = Self {
            renderer: PointCloudRenderer::new(target),
            acquisition: None,
            streams: None,
            controller: OrbitController::new(),
            status: SessionStatus::Waiting,
        };
        session.attach(streams);
        session
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut OrbitController {
        &mut self.controller
    }

    pub fn renderer(&self) -> &PointCloudRenderer<T> {
        &self.renderer
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.controller.handle(event);
    }

    /// One loop iteration: pick up finished acquisition, then render
    pub fn tick(&mut self) -> Result<FrameOutcome, RenderError> {
        self.poll_acquisition();
        self.renderer
            .render_frame(self.streams.as_mut(), &self.controller)
    }

    fn poll_acquisition(&mut self) {
        let Some(result) = self.acquisition.as_mut().and_then(StreamAcquisition::poll) else {
            return;
        };
        self.acquisition = None;

        match result {
            Ok(streams) => self.attach(streams),
            Err(e) => {
                error!(error = %e, "Could not open camera streams");
                self.status = SessionStatus::Failed(e.to_string());
            }
        }
    }

    fn attach(&mut self, streams: CameraStreams) {
        let identity = streams.identity().to_string();
        let calibrated = self.renderer.calibrate(&identity).is_ok();
        info!(identity = %identity, calibrated, "Streams attached");
        self.status = SessionStatus::Streaming {
            identity,
            calibrated,
        };
        self.streams = Some(streams);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::renderer::tests::{RecordingTarget, fixed_streams};
    use glam::Vec2;
    use std::path::PathBuf;

    #[test]
    fn test_with_streams_calibrates() {
        let streams = fixed_streams("Intel RealSense SR300 Depth", (8, 6), (8, 6), true);
        let mut session = ViewerSession::with_streams(RecordingTarget::default(), streams);
        assert_eq!(
            session.status(),
            &SessionStatus::Streaming {
                identity: "Intel RealSense SR300 Depth".to_string(),
                calibrated: true,
            }
        );
        assert!(session.tick().unwrap().is_drawn());
    }

    #[test]
    fn test_unknown_camera_still_renders() {
        let streams = fixed_streams("XYZ999", (8, 6), (8, 6), true);
        let mut session = ViewerSession::with_streams(RecordingTarget::default(), streams);
        assert!(matches!(
            session.status(),
            SessionStatus::Streaming {
                calibrated: false,
                ..
            }
        ));
        assert!(session.tick().unwrap().is_drawn());
    }

    #[test]
    fn test_pointer_drives_controller() {
        let streams = fixed_streams("SR300", (8, 6), (8, 6), true);
        let mut session = ViewerSession::with_streams(RecordingTarget::default(), streams);
        session.handle_pointer(PointerEvent::Down(Vec2::ZERO));
        session.handle_pointer(PointerEvent::Move(Vec2::new(10.0, 5.0)));
        session.handle_pointer(PointerEvent::Up(Vec2::new(10.0, 5.0)));

        let state = session.controller().state();
        assert_eq!(state.yaw, -10.0);
        assert_eq!(state.pitch, 5.0);
    }

    #[tokio::test]
    async fn test_acquisition_attaches_streams() {
        let acquisition = StreamAcquisition::spawn(
            &tokio::runtime::Handle::current(),
            SourceConfig::Synthetic {
                camera: "SR300".to_string(),
                width: 32,
                height: 24,
                fps: 100,
            },
        );
        let mut session = ViewerSession::new(RecordingTarget::default(), acquisition);

        let mut drawn = false;
        for _ in 0..200 {
            if session.tick().unwrap().is_drawn() {
                drawn = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert!(drawn);
        assert!(matches!(
            session.status(),
            SessionStatus::Streaming {
                calibrated: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_acquisition_keeps_clearing() {
        let acquisition = StreamAcquisition::spawn(
            &tokio::runtime::Handle::current(),
            SourceConfig::Files {
                color: PathBuf::from("/nonexistent/color.png"),
                depth: PathBuf::from("/nonexistent/depth.png"),
                camera_label: "SR300".to_string(),
            },
        );
        let mut session = ViewerSession::new(RecordingTarget::default(), acquisition);

        for _ in 0..200 {
            let outcome = session.tick().unwrap();
            assert!(matches!(outcome, FrameOutcome::Cleared));
            if matches!(session.status(), SessionStatus::Failed(_)) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert!(matches!(session.status(), SessionStatus::Failed(_)));
    }
}
