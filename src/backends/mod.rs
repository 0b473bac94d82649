// SPDX-License-Identifier: GPL-3.0-only

//! Video source abstraction
//!
//! A depth camera delivers two independent frame producers, color and depth.
//! Each reports its dimensions and whether it is ready, and hands out its most
//! recent decoded frame on demand. Opening the streams is asynchronous and
//! happens once at startup through [`StreamAcquisition`]; the render loop polls
//! it instead of blocking.

pub mod file_source;
pub mod synthetic;
mod types;

pub use types::{ColorFrame, DepthFrame};

use crate::config::SourceConfig;
use crate::errors::SourceError;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// One frame producer
pub trait VideoSource: Send {
    type Frame;

    /// Device label; the depth stream's label identifies the camera
    fn label(&self) -> &str;

    /// Current frame dimensions
    fn dimensions(&self) -> (u32, u32);

    /// True once the source has decoded its first frame
    fn is_ready(&self) -> bool;

    /// Most recent decoded frame, `None` while not ready
    fn latest_frame(&mut self) -> Option<Self::Frame>;
}

pub type ColorSource = Box<dyn VideoSource<Frame = ColorFrame>>;
pub type DepthSource = Box<dyn VideoSource<Frame = DepthFrame>>;

/// The color and depth streams of one camera
pub struct CameraStreams {
    pub depth: DepthSource,
    pub color: ColorSource,
}

impl CameraStreams {
    /// Identity string used to resolve the calibration
    pub fn identity(&self) -> &str {
        self.depth.label()
    }

    /// Both producers have frames available
    pub fn is_ready(&self) -> bool {
        self.color.is_ready() && self.depth.is_ready()
    }
}

impl std::fmt::Debug for CameraStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraStreams")
            .field("depth", &self.depth.label())
            .field("color", &self.color.label())
            .finish()
    }
}

/// Open the streams described by `config`
pub async fn open_streams(config: &SourceConfig) -> Result<CameraStreams, SourceError> {
    match config {
        SourceConfig::Synthetic {
            camera,
            width,
            height,
            fps,
        } => synthetic::open(camera, *width, *height, *fps),
        SourceConfig::Files {
            color,
            depth,
            camera_label,
        } => {
            let color = color.clone();
            let depth = depth.clone();
            let label = camera_label.clone();
            tokio::task::spawn_blocking(move || file_source::open(&color, &depth, &label))
                .await
                .map_err(|e| SourceError::Load(format!("Task join error: {}", e)))?
        }
    }
}

type AcquisitionResult = Result<CameraStreams, SourceError>;

/// One-shot stream setup running beside the render loop
///
/// The result is delivered exactly once through [`StreamAcquisition::poll`].
/// Dropping or cancelling aborts the task if it is still running.
pub struct StreamAcquisition {
    receiver: Option<oneshot::Receiver<AcquisitionResult>>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamAcquisition {
    /// Start opening the streams on `runtime`
    pub fn spawn(runtime: &tokio::runtime::Handle, config: SourceConfig) -> Self {
        let (sender, receiver) = oneshot::channel();
        let task = runtime.spawn(async move {
            let result = open_streams(&config).await;
            match &result {
                Ok(streams) => info!(identity = streams.identity(), "Streams opened"),
                Err(e) => warn!(error = %e, "Stream acquisition failed"),
            }
            let _ = sender.send(result);
        });

        Self {
            receiver: Some(receiver),
            task,
        }
    }

    /// Non-blocking check for the acquisition result
    ///
    /// Returns `Some` exactly once; afterwards always `None`.
    pub fn poll(&mut self) -> Option<AcquisitionResult> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.receiver = None;
                Some(Err(SourceError::Cancelled))
            }
        }
    }

    /// Still waiting for a result
    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    /// Abort the setup task
    pub fn cancel(&mut self) {
        self.task.abort();
    }
}

impl Drop for StreamAcquisition {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn synthetic_config() -> SourceConfig {
        SourceConfig::Synthetic {
            camera: "SR300".to_string(),
            width: 64,
            height: 48,
            fps: 30,
        }
    }

    #[tokio::test]
    async fn test_acquisition_delivers_once() {
        let mut acquisition =
            StreamAcquisition::spawn(&tokio::runtime::Handle::current(), synthetic_config());

        let mut result = None;
        for _ in 0..200 {
            if let Some(r) = acquisition.poll() {
                result = Some(r);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let streams = result.expect("acquisition timed out").unwrap();
        assert!(streams.identity().contains("SR300"));
        assert!(acquisition.poll().is_none());
        assert!(!acquisition.is_pending());
    }

    #[tokio::test]
    async fn test_failed_acquisition_is_reported() {
        let config = SourceConfig::Files {
            color: "/nonexistent/color.png".into(),
            depth: "/nonexistent/depth.png".into(),
            camera_label: "SR300".to_string(),
        };
        let streams = open_streams(&config).await;
        assert!(matches!(streams, Err(SourceError::Load(_))));
    }

    #[tokio::test]
    async fn test_cancelled_acquisition() {
        let mut acquisition =
            StreamAcquisition::spawn(&tokio::runtime::Handle::current(), synthetic_config());
        acquisition.cancel();
        // Either the task finished before the abort landed, or the channel closed
        for _ in 0..200 {
            if let Some(result) = acquisition.poll() {
                if let Err(e) = result {
                    assert_eq!(e, SourceError::Cancelled);
                }
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cancelled acquisition never resolved");
    }
}
