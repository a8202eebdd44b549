//! Render pass targets: the fixed offscreen texture and the per-tick drawable.

use super::FrameError;
use crate::gpu::Viewport;

/// The offscreen texture the effect pass renders into and the composite pass
/// samples from.
///
/// Allocated once at setup with a fixed resolution; drawable resizes never
/// touch it. The two resolutions are decoupled by design.
pub struct IntermediateTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl IntermediateTarget {
    pub const WIDTH: u32 = 1280;
    pub const HEIGHT: u32 = 720;
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

    pub fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Intermediate Target"),
            size: wgpu::Extent3d {
                width: Self::WIDTH,
                height: Self::HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Per-tick token wrapping the acquired drawable.
///
/// Constructed fresh each tick and consumed by [`present`](Self::present), so
/// a pass can never be encoded against a retired, already-presented drawable.
pub struct FrameContext {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl FrameContext {
    /// Acquires the current drawable. Failure is a recoverable per-frame
    /// condition; the caller skips the tick and tries again on the next one.
    pub fn acquire(viewport: &Viewport) -> Result<Self, FrameError> {
        let surface_texture = viewport.surface().get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (width, height) = viewport.size();

        Ok(Self {
            surface_texture,
            view,
            width,
            height,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width over height of this tick's drawable.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Presents the drawable, consuming the context. The next tick must
    /// acquire a fresh one.
    pub fn present(self) {
        self.surface_texture.present();
    }
}
