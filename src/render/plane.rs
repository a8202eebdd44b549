//! The video plane: a textured quad with a per-frame transform.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

/// Vertex for the video quad.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl PlaneVertex {
    /// Six vertices forming the quad's two triangles, drawn unindexed.
    pub const VERTICES: &'static [PlaneVertex] = &[
        PlaneVertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] },
        PlaneVertex { position: [1.0, -1.0], tex_coords: [1.0, 1.0] },
        PlaneVertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },
        PlaneVertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },
        PlaneVertex { position: [-1.0, 1.0], tex_coords: [0.0, 0.0] },
        PlaneVertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] },
    ];

    /// Returns the vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlaneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Per-draw uniform block for the composite pass's vertex stage.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub mvp: [[f32; 4]; 4],
}

/// The plane's scale and position, updated once per incoming frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneTransform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub position_z: f32,
}

impl PlaneTransform {
    /// World z position for a full-screen video plane.
    pub const WORLD_Z_FULL_VIDEO: f32 = -1.456;

    /// Fits the video into the view without distortion: a source wider than
    /// the view is pillarboxed by stretching x, otherwise letterboxed by
    /// stretching y. Always drops the plane to the full-video depth.
    pub fn fit_to_view(&mut self, source_aspect: f32, view_aspect: f32) {
        if source_aspect > view_aspect {
            self.scale_x = source_aspect;
            self.scale_y = 1.0;
        } else {
            self.scale_x = 1.0;
            self.scale_y = 1.0 / source_aspect;
        }
        self.position_z = Self::WORLD_Z_FULL_VIDEO;
    }

    /// Local model matrix: translate to depth, then scale.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, self.position_z))
            * Mat4::from_scale(Vec3::new(self.scale_x, self.scale_y, 1.0))
    }

    /// Combines the plane's local transform with the supplied world and
    /// projection matrices into one uniform block. Pure function of the
    /// current state.
    pub fn uniforms_for(&self, world: Mat4, projection: Mat4) -> Uniforms {
        let mvp = projection * world * self.model_matrix();
        Uniforms {
            mvp: mvp.to_cols_array_2d(),
        }
    }
}

impl Default for PlaneTransform {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            position_z: Self::WORLD_Z_FULL_VIDEO,
        }
    }
}

/// The single renderable entity: a textured quad holding the latest video
/// texture and the transform that fits it to the view.
///
/// All GPU handles are supplied at construction; the texture starts as a 1x1
/// black placeholder and is swapped for converted video frames as they
/// arrive.
pub struct VideoPlane {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    transform: PlaneTransform,
    texture: wgpu::Texture,
    sampler: wgpu::Sampler,
}

impl VideoPlane {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Video Plane Vertex Buffer"),
            contents: bytemuck::cast_slice(PlaneVertex::VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let texture = Self::placeholder_texture(device, queue);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Video Plane Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            vertex_buffer,
            vertex_count: PlaneVertex::VERTICES.len() as u32,
            transform: PlaneTransform::default(),
            texture,
            sampler,
        }
    }

    /// A 1x1 black texture bound until the first video frame converts.
    fn placeholder_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Video Plane Placeholder"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Bgra8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0, 0, 0, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        texture
    }

    /// Replaces the bound video texture. Called only after a successful
    /// frame conversion, so a failed conversion leaves the previous
    /// (stale but valid) texture in place.
    pub fn bind_texture(&mut self, texture: wgpu::Texture) {
        self.texture = texture;
    }

    pub fn texture_view(&self) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn transform(&self) -> &PlaneTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut PlaneTransform {
        &mut self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_source_scales_x() {
        let mut transform = PlaneTransform::default();
        transform.fit_to_view(16.0 / 9.0, 4.0 / 3.0);

        assert!((transform.scale_x - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(transform.scale_y, 1.0);
        assert_eq!(transform.position_z, PlaneTransform::WORLD_Z_FULL_VIDEO);
    }

    #[test]
    fn test_narrow_source_scales_y() {
        let mut transform = PlaneTransform::default();
        transform.fit_to_view(4.0 / 3.0, 16.0 / 9.0);

        assert_eq!(transform.scale_x, 1.0);
        assert!((transform.scale_y - 3.0 / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_equal_aspects_take_letterbox_branch() {
        // a_s == a_v falls into the else branch: (1.0, 1/a_s)
        let mut transform = PlaneTransform::default();
        transform.fit_to_view(1.0, 1.0);

        assert_eq!(transform.scale_x, 1.0);
        assert_eq!(transform.scale_y, 1.0);
    }

    #[test]
    fn test_fit_always_sets_full_video_depth() {
        let mut transform = PlaneTransform {
            scale_x: 2.0,
            scale_y: 2.0,
            position_z: 0.0,
        };
        transform.fit_to_view(1.5, 1.5);
        assert_eq!(transform.position_z, -1.456);
    }

    #[test]
    fn test_uniforms_are_byte_identical_across_calls() {
        let mut transform = PlaneTransform::default();
        transform.fit_to_view(16.0 / 9.0, 4.0 / 3.0);

        let world = Mat4::from_rotation_x(0.3) * Mat4::from_rotation_y(-1.2);
        let projection = crate::render::camera::projection_matrix(4.0 / 3.0);

        let a = transform.uniforms_for(world, projection);
        let b = transform.uniforms_for(world, projection);

        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }

    #[test]
    fn test_uniforms_depend_on_camera_orientation() {
        let transform = PlaneTransform::default();
        let projection = crate::render::camera::projection_matrix(1.0);

        let still = transform.uniforms_for(Mat4::IDENTITY, projection);
        let panned = transform.uniforms_for(Mat4::from_rotation_y(0.5), projection);

        assert_ne!(still, panned);
    }

    #[test]
    fn test_quad_is_two_triangles() {
        assert_eq!(PlaneVertex::VERTICES.len(), 6);
        // Both triangles share the (-1,-1) / (1,1) diagonal
        assert_eq!(PlaneVertex::VERTICES[2].position, PlaneVertex::VERTICES[3].position);
        assert_eq!(PlaneVertex::VERTICES[0].position, PlaneVertex::VERTICES[5].position);
    }
}
