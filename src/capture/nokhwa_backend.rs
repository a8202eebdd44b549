//! Nokhwa-based webcam capture backend.

use super::{CameraInfo, CaptureBackend, CaptureConfig};
use crate::frame::{PixelFormat, VideoFrame};
use anyhow::Result;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

/// Webcam capture using the nokhwa library.
pub struct NokhwaCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl CaptureBackend for NokhwaCapture {
    fn list_devices() -> Result<Vec<CameraInfo>> {
        let devices = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;
        Ok(devices
            .into_iter()
            .map(|d| CameraInfo {
                index: d.index().as_index().unwrap_or(0),
                name: d.human_name().to_string(),
            })
            .collect())
    }

    fn open(config: CaptureConfig) -> Result<Self> {
        // Some cameras reject "Closest" outright when the hint is far from
        // anything they support, so try a ladder of known-good formats.
        // macOS built-in cameras speak NV12/YUYV, USB webcams usually MJPEG.
        let requested = Resolution::new(config.width, config.height);
        let seed_formats = vec![
            CameraFormat::new(requested, FrameFormat::NV12, config.fps),
            CameraFormat::new(requested, FrameFormat::YUYV, config.fps),
            CameraFormat::new(requested, FrameFormat::MJPEG, config.fps),
            CameraFormat::new(Resolution::new(1280, 720), FrameFormat::NV12, 30),
            CameraFormat::new(Resolution::new(1280, 720), FrameFormat::YUYV, 30),
            CameraFormat::new(Resolution::new(1280, 720), FrameFormat::MJPEG, 30),
            // VGA fallback (last resort)
            CameraFormat::new(Resolution::new(640, 480), FrameFormat::YUYV, 30),
            CameraFormat::new(Resolution::new(640, 480), FrameFormat::MJPEG, 30),
        ];

        let mut camera = None;
        for seed in seed_formats {
            let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(seed));
            let idx = CameraIndex::Index(config.device_index);

            if let Ok(mut cam) = Camera::new(idx, requested) {
                // Creating the object isn't enough for some drivers; the
                // stream has to actually open.
                if cam.open_stream().is_ok() {
                    tracing::info!("Verified connection with seed format: {:?}", seed);
                    camera = Some(cam);
                    break;
                }
            }
        }

        let camera = camera.ok_or_else(|| {
            anyhow::anyhow!(
                "Could not connect to and open stream on camera index {} with any standard format.",
                config.device_index
            )
        })?;

        let resolution = camera.resolution();
        tracing::info!("Camera opened with resolution: {}", resolution);

        Ok(Self {
            camera,
            width: resolution.width(),
            height: resolution.height(),
        })
    }

    fn capture_frame(&mut self) -> Result<VideoFrame> {
        let frame = self.camera.frame()?;
        let decoded = frame.decode_image::<RgbFormat>()?;
        let rgb_data = decoded.into_raw();

        Ok(VideoFrame::from_data(
            self.width,
            self.height,
            PixelFormat::Rgb,
            rgb_data,
        ))
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
