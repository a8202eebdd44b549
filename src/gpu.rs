//! Shared GPU context and window surface handling.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Shared GPU resources used by multiple components.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
}

impl GpuContext {
    /// Initialize GPU context compatible with the given window surface.
    /// If window is None, initializes for headless/offscreen use.
    pub fn new(window: Option<&Arc<Window>>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // If we have a window, we need a surface to ensure adapter compatibility
        let surface = if let Some(window) = window {
            Some(instance.create_surface(window.clone())?)
        } else {
            None
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface.as_ref(),
            force_fallback_adapter: false,
        }))
        .map_err(|_| anyhow!("Failed to obtain GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Prism Device"),
                required_features: wgpu::Features::empty(),
                required_limits: if surface.is_some() {
                    wgpu::Limits::default()
                } else {
                    wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            },
        ))?;

        Ok(Self {
            device,
            queue,
            instance,
            adapter,
        })
    }
}

/// The window surface and its configuration.
///
/// Resizing reconfigures only the surface; offscreen render targets are
/// decoupled from the drawable resolution and never follow it.
pub struct Viewport {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl Viewport {
    /// Creates and configures a surface for the given window.
    pub fn new(gpu: &GpuContext, window: Arc<Window>) -> Result<Self> {
        let surface = gpu.instance.create_surface(window.clone())?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&gpu.adapter);
        // The pipeline's fixed format is BGRA; prefer it for the surface too.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| **f == wgpu::TextureFormat::Bgra8Unorm)
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        Ok(Self { surface, config })
    }

    /// Resizes the surface.
    pub fn resize(&mut self, gpu: &GpuContext, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&gpu.device, &self.config);
        }
    }

    pub fn surface(&self) -> &wgpu::Surface<'static> {
        &self.surface
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Width over height of the current drawable.
    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}
