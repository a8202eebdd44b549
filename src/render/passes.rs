//! Per-frame orchestration of the two render passes.

use super::camera::{projection_matrix, CameraOrientation};
use super::pipelines::RenderPipelines;
use super::plane::VideoPlane;
use super::targets::{FrameContext, IntermediateTarget};
use crate::gpu::GpuContext;
use anyhow::Result;
use wgpu::util::DeviceExt;

/// Mid-gray clear for the drawable, RGBA.
const COMPOSITE_CLEAR: [f64; 4] = [0.5, 0.5, 0.5, 1.0];

/// Which texture a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Intermediate,
    Drawable,
}

/// Which texture a pass samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlaneTexture,
    Intermediate,
}

/// Load action for a pass's color attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadAction {
    Load,
    Clear([f64; 4]),
}

/// Everything needed to encode one render pass, as plain data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassPlan {
    pub label: &'static str,
    pub target: TargetKind,
    pub target_extent: (u32, u32),
    pub load: LoadAction,
    pub source: SourceKind,
    /// Scalar bound to the effect pass's fragment stage; None for passes
    /// without an effect flag.
    pub effect_flag: Option<f32>,
    pub vertex_count: u32,
    pub instance_count: u32,
}

/// The fixed two-pass sequence for one frame, encoding order first to last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub rgb_shift: PassPlan,
    pub composite: PassPlan,
}

impl FramePlan {
    pub fn passes(&self) -> [&PassPlan; 2] {
        [&self.rgb_shift, &self.composite]
    }
}

/// Describes the frame's two passes for the given plane geometry, effect
/// state, and drawable size. Pure; the orchestrator encodes exactly what the
/// plan says.
pub fn plan_frame(vertex_count: u32, effect_enabled: bool, drawable_extent: (u32, u32)) -> FramePlan {
    // One instance per triangle, so the quad draws twice. Redundant for a
    // two-triangle plane, but kept: output parity matters more than saving
    // one instance.
    let instance_count = vertex_count / 3;

    FramePlan {
        rgb_shift: PassPlan {
            label: "rgb shift",
            target: TargetKind::Intermediate,
            target_extent: (IntermediateTarget::WIDTH, IntermediateTarget::HEIGHT),
            // Prior contents persist across frames instead of clearing.
            // Deliberate: successive passes layer into one reused texture.
            load: LoadAction::Load,
            source: SourceKind::PlaneTexture,
            effect_flag: Some(if effect_enabled { 1.0 } else { 0.0 }),
            vertex_count,
            instance_count,
        },
        composite: PassPlan {
            label: "composite",
            target: TargetKind::Drawable,
            target_extent: drawable_extent,
            load: LoadAction::Clear(COMPOSITE_CLEAR),
            source: SourceKind::Intermediate,
            effect_flag: None,
            vertex_count,
            instance_count,
        },
    }
}

/// Encodes the frame's two passes in strict order on one command buffer.
///
/// Pass 1 renders the plane's video texture through the rgb-shift pipeline
/// into the intermediate target; pass 2 samples that target through the
/// composite pipeline onto the drawable, under the live camera transform.
pub struct PassOrchestrator {
    pipelines: RenderPipelines,
    intermediate: IntermediateTarget,
    effect_enabled: bool,
    effect_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
}

impl PassOrchestrator {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let pipelines = RenderPipelines::new(device, surface_format)?;
        let intermediate = IntermediateTarget::new(device);

        let effect_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Effect Flag Buffer"),
            contents: bytemuck::cast_slice(&[0.0f32; 4]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Composite Uniform Buffer"),
            contents: bytemuck::cast_slice(&[0.0f32; 16]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            pipelines,
            intermediate,
            effect_enabled: false,
            effect_buffer,
            uniform_buffer,
        })
    }

    /// Sets the effect flag; read at the start of the next frame's encoding.
    pub fn set_effect_enabled(&mut self, enabled: bool) {
        self.effect_enabled = enabled;
    }

    pub fn effect_enabled(&self) -> bool {
        self.effect_enabled
    }

    pub fn intermediate(&self) -> &IntermediateTarget {
        &self.intermediate
    }

    /// Encodes and submits both passes for this tick.
    pub fn render_frame(
        &self,
        gpu: &GpuContext,
        plane: &VideoPlane,
        frame: &FrameContext,
        camera: &CameraOrientation,
    ) {
        let plan = plan_frame(plane.vertex_count(), self.effect_enabled, frame.extent());

        let flag = plan
            .rgb_shift
            .effect_flag
            .expect("rgb shift pass carries the effect flag");
        gpu.queue.write_buffer(
            &self.effect_buffer,
            0,
            bytemuck::cast_slice(&[flag, 0.0, 0.0, 0.0]),
        );

        let uniforms = plane.transform().uniforms_for(
            camera.world_matrix(),
            projection_matrix(frame.aspect_ratio()),
        );
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let plane_view = plane.texture_view();

        let rgb_shift_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("RGB Shift Bind Group"),
            layout: self.pipelines.rgb_shift_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        self.source_view(&plan.rgb_shift, &plane_view),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(plane.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.effect_buffer.as_entire_binding(),
                },
            ],
        });

        let composite_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: self.pipelines.composite_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        self.source_view(&plan.composite, &plane_view),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(plane.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.encode_pass(
            &mut encoder,
            &plan.rgb_shift,
            self.pipelines.rgb_shift(),
            &rgb_shift_group,
            plane,
            frame,
        );
        self.encode_pass(
            &mut encoder,
            &plan.composite,
            self.pipelines.composite(),
            &composite_group,
            plane,
            frame,
        );

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn source_view<'a>(
        &'a self,
        plan: &PassPlan,
        plane_view: &'a wgpu::TextureView,
    ) -> &'a wgpu::TextureView {
        match plan.source {
            SourceKind::PlaneTexture => plane_view,
            SourceKind::Intermediate => self.intermediate.view(),
        }
    }

    fn target_view<'a>(&'a self, plan: &PassPlan, frame: &'a FrameContext) -> &'a wgpu::TextureView {
        match plan.target {
            TargetKind::Intermediate => self.intermediate.view(),
            TargetKind::Drawable => frame.view(),
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        plan: &PassPlan,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        plane: &VideoPlane,
        frame: &FrameContext,
    ) {
        let load = match plan.load {
            LoadAction::Load => wgpu::LoadOp::Load,
            LoadAction::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(plan.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target_view(plan, frame),
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.set_vertex_buffer(0, plane.vertex_buffer().slice(..));
        render_pass.draw(0..plan.vertex_count, 0..plan.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_passes_in_fixed_order() {
        let plan = plan_frame(6, false, (800, 600));

        assert_eq!(plan.rgb_shift.target, TargetKind::Intermediate);
        assert_eq!(plan.rgb_shift.source, SourceKind::PlaneTexture);
        assert_eq!(plan.composite.target, TargetKind::Drawable);
        assert_eq!(plan.composite.source, SourceKind::Intermediate);
    }

    #[test]
    fn test_effect_pass_keeps_prior_contents() {
        // Regression pin: the effect pass loads instead of clearing, so the
        // intermediate texture accumulates across frames.
        let plan = plan_frame(6, false, (800, 600));

        assert_eq!(plan.rgb_shift.load, LoadAction::Load);
        assert_eq!(
            plan.composite.load,
            LoadAction::Clear([0.5, 0.5, 0.5, 1.0])
        );
    }

    #[test]
    fn test_one_instance_per_triangle() {
        let plan = plan_frame(6, false, (800, 600));

        for pass in plan.passes() {
            assert_eq!(pass.vertex_count, 6);
            assert_eq!(pass.instance_count, 2);
        }
    }

    #[test]
    fn test_intermediate_extent_survives_drawable_resizes() {
        for drawable in [(640, 480), (1920, 1080), (333, 777)] {
            let plan = plan_frame(6, false, drawable);

            assert_eq!(plan.rgb_shift.target_extent, (1280, 720));
            assert_eq!(plan.composite.target_extent, drawable);
        }
    }

    #[test]
    fn test_composite_always_sources_intermediate() {
        // Three-frame sequence: every frame composites exactly once, always
        // sampling the intermediate target rather than the incoming frame.
        for _ in 0..3 {
            let plan = plan_frame(6, false, (1024, 768));

            let composite_passes: Vec<_> = plan
                .passes()
                .into_iter()
                .filter(|p| p.target == TargetKind::Drawable)
                .collect();
            assert_eq!(composite_passes.len(), 1);
            assert_eq!(composite_passes[0].source, SourceKind::Intermediate);
        }
    }

    #[test]
    fn test_effect_flag_follows_mid_sequence_toggle() {
        // Toggle the effect on at frame 2 of 3.
        let toggles = [false, true, true];
        let flags: Vec<f32> = toggles
            .iter()
            .map(|&on| plan_frame(6, on, (1024, 768)).rgb_shift.effect_flag.unwrap())
            .collect();

        assert_eq!(flags, vec![0.0, 1.0, 1.0]);
        // The composite pass never carries the flag.
        assert_eq!(plan_frame(6, true, (1024, 768)).composite.effect_flag, None);
    }
}
