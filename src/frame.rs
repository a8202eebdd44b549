//! Video frame types and pixel format conversions.

/// Supported pixel formats for video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// BGRA with 8 bits per channel (32 bits per pixel).
    /// The render pipeline's fixed texture format.
    Bgra,
    /// RGBA with 8 bits per channel (32 bits per pixel)
    Rgba,
    /// RGB with 8 bits per channel (24 bits per pixel)
    Rgb,
}

impl PixelFormat {
    /// Returns the number of bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Bgra => 4,
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
        }
    }
}

/// A video frame containing image data.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format of the frame data
    pub format: PixelFormat,
    /// Raw pixel data
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Creates a new black video frame with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = (width as usize) * (height as usize) * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0; size],
        }
    }

    /// Creates a video frame from existing data.
    pub fn from_data(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Number of bytes `data` must hold for this frame's dimensions and format.
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * self.format.bytes_per_pixel()
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Converts this frame to BGRA format.
    pub fn to_bgra(&self) -> VideoFrame {
        if self.format == PixelFormat::Bgra {
            return self.clone();
        }

        let pixel_count = (self.width as usize) * (self.height as usize);
        let mut bgra_data = vec![0u8; pixel_count * 4];

        match self.format {
            PixelFormat::Rgba => {
                for i in 0..pixel_count {
                    bgra_data[i * 4] = self.data[i * 4 + 2];
                    bgra_data[i * 4 + 1] = self.data[i * 4 + 1];
                    bgra_data[i * 4 + 2] = self.data[i * 4];
                    bgra_data[i * 4 + 3] = self.data[i * 4 + 3];
                }
            }
            PixelFormat::Rgb => {
                for i in 0..pixel_count {
                    bgra_data[i * 4] = self.data[i * 3 + 2];
                    bgra_data[i * 4 + 1] = self.data[i * 3 + 1];
                    bgra_data[i * 4 + 2] = self.data[i * 3];
                    bgra_data[i * 4 + 3] = 255;
                }
            }
            PixelFormat::Bgra => unreachable!(),
        }

        VideoFrame {
            width: self.width,
            height: self.height,
            format: PixelFormat::Bgra,
            data: bgra_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_bgra_conversion() {
        let rgb_data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let frame = VideoFrame::from_data(2, 2, PixelFormat::Rgb, rgb_data);
        let bgra_frame = frame.to_bgra();

        assert_eq!(bgra_frame.format, PixelFormat::Bgra);
        assert_eq!(bgra_frame.data.len(), 16);
        // Check first pixel (red)
        assert_eq!(&bgra_frame.data[0..4], &[0, 0, 255, 255]);
        // Check second pixel (green)
        assert_eq!(&bgra_frame.data[4..8], &[0, 255, 0, 255]);
    }

    #[test]
    fn test_rgba_to_bgra_swizzle() {
        let rgba_data = vec![10, 20, 30, 40];
        let frame = VideoFrame::from_data(1, 1, PixelFormat::Rgba, rgba_data);
        let bgra_frame = frame.to_bgra();

        assert_eq!(&bgra_frame.data, &[30, 20, 10, 40]);
    }

    #[test]
    fn test_expected_len() {
        let frame = VideoFrame::new(1280, 720, PixelFormat::Bgra);
        assert_eq!(frame.expected_len(), 1280 * 720 * 4);
        assert_eq!(frame.data.len(), frame.expected_len());
    }

    #[test]
    fn test_aspect_ratio() {
        let frame = VideoFrame::new(1920, 1080, PixelFormat::Bgra);
        assert!((frame.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }
}
