//! Webcam capture backends.

mod nokhwa_backend;

pub use nokhwa_backend::NokhwaCapture;

use crate::frame::VideoFrame;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Trait for webcam capture backends.
pub trait CaptureBackend {
    /// Returns a list of available camera devices.
    fn list_devices() -> Result<Vec<CameraInfo>>
    where
        Self: Sized;

    /// Opens the camera with the specified configuration.
    fn open(config: CaptureConfig) -> Result<Self>
    where
        Self: Sized;

    /// Captures a single frame from the camera.
    fn capture_frame(&mut self) -> Result<VideoFrame>;

    /// Returns the current frame dimensions.
    fn frame_size(&self) -> (u32, u32);
}

/// Information about a camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index
    pub index: u32,
    /// Human-readable name
    pub name: String,
}

/// Configuration for camera capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Camera device index
    pub device_index: u32,
    /// Desired frame width
    pub width: u32,
    /// Desired frame height
    pub height: u32,
    /// Desired frame rate
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

/// Captures frames on a worker thread so the render thread never blocks on
/// the camera. Only the most recent frame is kept; older frames are dropped.
///
/// Frames are converted to BGRA on the worker before publication.
pub struct AsyncCapture {
    latest: Arc<Mutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
    frame_size: (u32, u32),
    worker: Option<JoinHandle<()>>,
}

impl AsyncCapture {
    /// Opens the camera and starts the capture worker.
    pub fn new(config: CaptureConfig) -> Result<Self> {
        let mut backend = NokhwaCapture::open(config)?;
        let frame_size = backend.frame_size();

        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));

        let mailbox = latest.clone();
        let run_flag = running.clone();
        let worker = std::thread::Builder::new()
            .name("prism-capture".to_string())
            .spawn(move || {
                while run_flag.load(Ordering::SeqCst) {
                    match backend.capture_frame() {
                        Ok(frame) => {
                            let bgra = frame.to_bgra();
                            *mailbox.lock().unwrap() = Some(bgra);
                        }
                        Err(e) => {
                            tracing::warn!("Capture error: {}", e);
                        }
                    }
                }
            })?;

        Ok(Self {
            latest,
            running,
            frame_size,
            worker: Some(worker),
        })
    }

    /// Takes the most recent frame, if a new one has arrived since the last
    /// call. Non-blocking.
    pub fn get_latest_frame(&mut self) -> Option<VideoFrame> {
        self.latest.lock().unwrap().take()
    }

    /// Returns the camera's frame dimensions.
    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }
}

impl Drop for AsyncCapture {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
