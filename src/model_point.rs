//! # Point Cloud Model Module
//!
//! GPU side of a point cloud. Each point is expanded into a camera facing quad
//! (four vertices, two triangles) that the point shader textures with the
//! round sprite.
//!
//! Key components:
//! - `PointVertex`: one point with position, color and world-space size
//! - `QuadPointVertex`: one corner of a billboard quad
//! - `QuadPointModel`: uploaded vertex and index buffers
//! - `DrawQuadPoints` trait: render pass helper

use wgpu::util::DeviceExt;

use crate::model_mesh::Vertex;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

/// Billboard vertex for rendering points as camera-facing quads
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadPointVertex {
    pub position: [f32; 3], // Center position of the point
    pub color: [f32; 3],
    pub corner: [f32; 2], // Corner offset (-1,-1 to 1,1)
    pub size: f32,
}

const CORNERS: [[f32; 2]; 4] = [
    [-1.0, -1.0], // Bottom-left
    [1.0, -1.0],  // Bottom-right
    [-1.0, 1.0],  // Top-left
    [1.0, 1.0],   // Top-right
];

impl Vertex for QuadPointVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<QuadPointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

impl QuadPointVertex {
    /// Converts a single point into 4 quad vertices
    pub fn from_point(point: &PointVertex) -> [Self; 4] {
        CORNERS.map(|corner| Self {
            position: point.position,
            color: point.color,
            corner,
            size: point.size,
        })
    }

    pub fn points_to_quads(points: &[PointVertex]) -> Vec<Self> {
        points.iter().flat_map(Self::from_point).collect()
    }
}

/// Two counter-clockwise triangles per quad.
pub fn quad_indices(point_count: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(point_count * 6);
    for i in 0..point_count {
        let base = (i * 4) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
    }
    indices
}

pub struct QuadPointModel {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl QuadPointModel {
    pub fn new(device: &wgpu::Device, name: &str, points: &[PointVertex]) -> Self {
        let quad_vertices = QuadPointVertex::points_to_quads(points);
        let indices = quad_indices(points.len());

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Quad Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Quad Index Buffer", name)),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: String::from(name),
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// A trait for drawing billboard-based points (rendered as quads)
pub trait DrawQuadPoints<'a> {
    fn draw_quad_points(
        &mut self,
        quad_model: &'a QuadPointModel,
        camera_bind_group: &'a wgpu::BindGroup,
        material_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawQuadPoints<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_quad_points(
        &mut self,
        quad_model: &'b QuadPointModel,
        camera_bind_group: &'b wgpu::BindGroup,
        material_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, quad_model.vertex_buffer.slice(..));
        self.set_index_buffer(quad_model.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]);
        self.set_bind_group(1, material_bind_group, &[]);
        self.draw_indexed(0..quad_model.num_indices, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quads_share_the_point_attributes() {
        let point = PointVertex {
            position: [1.0, 2.0, 3.0],
            color: [0.5, 0.25, 0.75],
            size: 0.07,
        };
        let quad = QuadPointVertex::from_point(&point);
        for (vertex, corner) in quad.iter().zip(CORNERS) {
            assert_eq!(vertex.position, point.position);
            assert_eq!(vertex.color, point.color);
            assert_eq!(vertex.size, point.size);
            assert_eq!(vertex.corner, corner);
        }
    }

    #[test]
    fn indices_address_each_quad() {
        let indices = quad_indices(3);
        assert_eq!(indices.len(), 18);
        assert_eq!(&indices[6..12], &[4, 5, 6, 5, 7, 6]);
        assert_eq!(indices.iter().max(), Some(&11));
    }

    #[test]
    fn vertex_layout_matches_struct_size() {
        let layout = QuadPointVertex::desc();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.len(), 4);
    }
}
