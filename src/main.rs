//! Prism: real-time two-pass webcam compositor CLI.

use anyhow::Result;
use clap::Parser;
use prism::capture::{AsyncCapture, CaptureBackend, CaptureConfig, NokhwaCapture};
use prism::gpu::{GpuContext, Viewport};
use prism::render::{
    CameraOrientation, FrameContext, PassOrchestrator, TextureBridge, VideoPlane,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Real-time webcam compositor with an interactive 3D viewing plane.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(about = "Composite webcam video through a two-pass GPU pipeline")]
struct Args {
    /// Camera device index
    #[arg(short, long, default_value = "0")]
    input: u32,

    /// Capture width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Capture height
    #[arg(long, default_value = "720")]
    height: u32,

    /// Target frames per second
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Start with the RGB shift effect enabled
    #[arg(long)]
    effect: bool,

    /// List available cameras and exit
    #[arg(long)]
    list_devices: bool,
}

/// Everything the render tick needs, constructed together after the window
/// exists so no GPU handle is ever half-initialized.
struct RenderState {
    gpu: GpuContext,
    viewport: Viewport,
    capture: AsyncCapture,
    plane: VideoPlane,
    bridge: TextureBridge,
    orchestrator: PassOrchestrator,
    camera: CameraOrientation,
}

impl RenderState {
    fn new(args: &Args, window: Arc<Window>) -> Result<Self> {
        let gpu = GpuContext::new(Some(&window))?;
        let viewport = Viewport::new(&gpu, window)?;

        info!("Opening camera device {}...", args.input);
        let capture = AsyncCapture::new(CaptureConfig {
            device_index: args.input,
            width: args.width,
            height: args.height,
            fps: args.fps,
        })?;
        let (cam_w, cam_h) = capture.frame_size();
        info!("Camera opened successfully at {}x{} (async capture)", cam_w, cam_h);

        let plane = VideoPlane::new(&gpu.device, &gpu.queue);
        let mut orchestrator = PassOrchestrator::new(&gpu.device, viewport.format())?;
        orchestrator.set_effect_enabled(args.effect);

        Ok(Self {
            gpu,
            viewport,
            capture,
            plane,
            bridge: TextureBridge::new(),
            orchestrator,
            camera: CameraOrientation::new(),
        })
    }
}

/// Application state for the event loop.
struct PrismApp {
    args: Args,
    window: Option<Arc<Window>>,
    state: Option<RenderState>,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    last_frame_time: Instant,
    frame_duration: Duration,
    frame_count: u32,
    fps_last_time: Instant,
}

impl PrismApp {
    fn new(args: Args) -> Self {
        let frame_duration = Duration::from_secs_f64(1.0 / args.fps as f64);
        Self {
            args,
            window: None,
            state: None,
            dragging: false,
            last_cursor: None,
            last_frame_time: Instant::now(),
            frame_duration,
            frame_count: 0,
            fps_last_time: Instant::now(),
        }
    }

    /// One driver tick: pull the latest video frame, refresh the plane, then
    /// encode both passes against a freshly acquired drawable.
    fn render_tick(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };

        self.frame_count += 1;
        let elapsed = self.fps_last_time.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            debug!("[Perf] Rendering at {:.2} FPS", fps);
            self.frame_count = 0;
            self.fps_last_time = Instant::now();
        }

        if let Some(frame) = state.capture.get_latest_frame() {
            state
                .plane
                .transform_mut()
                .fit_to_view(frame.aspect_ratio(), state.viewport.aspect_ratio());

            match state.bridge.acquire(&state.gpu.device, &state.gpu.queue, &frame) {
                Ok(texture) => state.plane.bind_texture(texture),
                Err(e) => {
                    // Keep the previous texture bound; stale beats black.
                    warn!("Frame conversion failed: {}", e);
                }
            }
        }

        let frame_ctx = match FrameContext::acquire(&state.viewport) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("Skipping frame: {}", e);
                return;
            }
        };

        state
            .orchestrator
            .render_frame(&state.gpu, &state.plane, &frame_ctx, &state.camera);
        frame_ctx.present();
    }
}

impl ApplicationHandler for PrismApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title("Prism - Webcam Compositor")
            .with_inner_size(winit::dpi::PhysicalSize::new(self.args.width, self.args.height));

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.window = Some(window.clone());

                match RenderState::new(&self.args, window) {
                    Ok(state) => {
                        self.state = Some(state);
                        info!("Renderer initialized; drag to orbit, space toggles the effect");
                    }
                    Err(e) => {
                        error!("Initialization error: {}", e);
                        event_loop.exit();
                    }
                }
            }
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    let gpu = &state.gpu;
                    state.viewport.resize(gpu, size);
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = button_state == ElementState::Pressed;
                if !self.dragging {
                    self.last_cursor = None;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let (Some(last), Some(state)) = (self.last_cursor, &mut self.state) {
                        let dx = (position.x - last.x) as f32;
                        let dy = (position.y - last.y) as f32;
                        state.camera.pan(dx, dy);
                    }
                    self.last_cursor = Some(position);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Space)
                {
                    if let Some(state) = &mut self.state {
                        let enabled = !state.orchestrator.effect_enabled();
                        state.orchestrator.set_effect_enabled(enabled);
                        info!("RGB shift effect {}", if enabled { "on" } else { "off" });
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if now.duration_since(self.last_frame_time) >= self.frame_duration {
                    self.render_tick();
                    self.last_frame_time = now;
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if args.list_devices {
        println!("Available cameras:");
        match NokhwaCapture::list_devices() {
            Ok(devices) => {
                for device in devices {
                    println!("  [{}] {}", device.index, device.name);
                }
            }
            Err(e) => {
                eprintln!("Failed to list devices: {}", e);
            }
        }
        return Ok(());
    }

    info!("Starting Prism...");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PrismApp::new(args);
    event_loop.run_app(&mut app)?;

    Ok(())
}
