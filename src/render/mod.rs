//! Two-pass video rendering.
//!
//! Per tick the orchestrator encodes the video plane twice: an RGB-shift
//! effect pass into a fixed-size offscreen target, then a composite pass that
//! samples that target onto the current drawable through the camera's
//! model-view-projection transform.

pub mod bridge;
pub mod camera;
pub mod passes;
pub mod pipelines;
pub mod plane;
pub mod targets;

pub use bridge::TextureBridge;
pub use camera::CameraOrientation;
pub use passes::PassOrchestrator;
pub use pipelines::RenderPipelines;
pub use plane::VideoPlane;
pub use targets::{FrameContext, IntermediateTarget};

use crate::frame::PixelFormat;
use thiserror::Error;

/// Recoverable per-frame failures.
///
/// These are logged and swallowed at the frame loop: a failed texture upload
/// leaves the previously bound texture in place, a missing drawable skips the
/// frame. They never propagate out of a tick.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("drawable unavailable: {0}")]
    DrawableUnavailable(#[from] wgpu::SurfaceError),

    #[error("frame data is {actual} bytes, expected {expected} for {width}x{height}")]
    FrameSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    #[error("unsupported pixel format {0:?}, expected BGRA")]
    UnsupportedFormat(PixelFormat),
}
