//! Compiled pipeline states for the two render passes.

use super::plane::PlaneVertex;
use super::targets::IntermediateTarget;
use anyhow::{bail, Result};
use std::borrow::Cow;
use tracing::info;

/// RGB-shift effect pass: pass-through vertex transform, fragment offsets the
/// red and blue channels when the effect flag is set.
pub const RGB_SHIFT_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}

struct EffectParams {
    enabled: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var t_video: texture_2d<f32>;
@group(0) @binding(1) var s_video: sampler;
@group(0) @binding(2) var<uniform> params: EffectParams;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 0.0, 1.0);
    out.tex_coords = in.tex_coords;
    return out;
}

@fragment
fn fs_main(@location(0) tex_coords: vec2<f32>) -> @location(0) vec4<f32> {
    let shift = vec2<f32>(0.01, 0.0);
    let base = textureSample(t_video, s_video, tex_coords);
    let r = textureSample(t_video, s_video, tex_coords + shift).r;
    let b = textureSample(t_video, s_video, tex_coords - shift).b;
    let shifted = vec4<f32>(r, base.g, b, base.a);
    return mix(base, shifted, step(0.5, params.enabled));
}
"#;

/// Composite pass: full model-view-projection vertex transform, straight
/// texture sample.
pub const COMPOSITE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) tex_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}

struct Uniforms {
    mvp: mat4x4<f32>,
}

@group(0) @binding(0) var t_video: texture_2d<f32>;
@group(0) @binding(1) var s_video: sampler;
@group(0) @binding(2) var<uniform> uniforms: Uniforms;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp * vec4<f32>(in.position, 0.0, 1.0);
    out.tex_coords = in.tex_coords;
    return out;
}

@fragment
fn fs_main(@location(0) tex_coords: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(t_video, s_video, tex_coords);
}
"#;

/// The two pipeline states, compiled once at setup and immutable afterwards.
///
/// Compilation failure of either pipeline is fatal: the renderer cannot run
/// with a missing pipeline, so construction reports the error and aborts
/// setup instead of limping along.
pub struct RenderPipelines {
    rgb_shift: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    rgb_shift_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
}

impl RenderPipelines {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self> {
        // Shader and pipeline validation errors arrive asynchronously; scope
        // them so a bad pipeline fails construction instead of panicking on
        // first use.
        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let rgb_shift_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("RGB Shift Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(RGB_SHIFT_SHADER)),
        });

        let composite_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(COMPOSITE_SHADER)),
        });

        let rgb_shift_layout = Self::bind_group_layout(
            device,
            "RGB Shift Bind Group Layout",
            // Effect flag buffer feeds the fragment stage
            wgpu::ShaderStages::FRAGMENT,
        );
        let composite_layout = Self::bind_group_layout(
            device,
            "Composite Bind Group Layout",
            // MVP buffer feeds the vertex stage
            wgpu::ShaderStages::VERTEX,
        );

        let rgb_shift = Self::pipeline(
            device,
            "rgb shift",
            &rgb_shift_module,
            &rgb_shift_layout,
            IntermediateTarget::FORMAT,
        );
        let composite = Self::pipeline(
            device,
            "composite",
            &composite_module,
            &composite_layout,
            surface_format,
        );

        if let Some(error) = pollster::block_on(error_scope.pop()) {
            bail!("Failed to create pipeline state: {error}");
        }
        info!("Compiled rgb shift and composite pipelines");

        Ok(Self {
            rgb_shift,
            composite,
            rgb_shift_layout,
            composite_layout,
        })
    }

    fn bind_group_layout(
        device: &wgpu::Device,
        label: &str,
        uniform_visibility: wgpu::ShaderStages,
    ) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: uniform_visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }

    fn pipeline(
        device: &wgpu::Device,
        label: &str,
        module: &wgpu::ShaderModule,
        bind_group_layout: &wgpu::BindGroupLayout,
        target_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[PlaneVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    pub fn rgb_shift(&self) -> &wgpu::RenderPipeline {
        &self.rgb_shift
    }

    pub fn composite(&self) -> &wgpu::RenderPipeline {
        &self.composite
    }

    pub fn rgb_shift_layout(&self) -> &wgpu::BindGroupLayout {
        &self.rgb_shift_layout
    }

    pub fn composite_layout(&self) -> &wgpu::BindGroupLayout {
        &self.composite_layout
    }
}
