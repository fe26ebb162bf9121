//! # Mesh Model Module
//!
//! GPU side of the solid tube meshes. Vertices only carry a position and a
//! normal; the matcap shader derives everything else from the view space normal.
//!
//! Key components:
//! - `Vertex` trait: buffer layout shared by every vertex type
//! - `MeshVertex`: position + normal
//! - `SolidModel`: uploaded vertex and index buffers
//! - `DrawSolid` trait: render pass helper

use wgpu::util::DeviceExt;

use crate::shape_star::TubeMesh;

/// A common trait for all vertex types that can be used with WGPU rendering.
///
/// This trait provides a single method `desc()` that returns the vertex buffer layout
/// required by the GPU pipeline to interpret the vertex data correctly.
pub trait Vertex {
    /// Returns the buffer layout description for this vertex type
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
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
            ],
        }
    }
}

impl MeshVertex {
    pub fn from_tube(mesh: &TubeMesh) -> Vec<Self> {
        mesh.positions
            .iter()
            .zip(&mesh.normals)
            .map(|(position, normal)| Self {
                position: *position,
                normal: *normal,
            })
            .collect()
    }
}

pub struct SolidModel {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl SolidModel {
    pub fn new(device: &wgpu::Device, name: &str, mesh: &TubeMesh) -> Self {
        let vertices = MeshVertex::from_tube(mesh);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            name: String::from(name),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
        }
    }

    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

pub trait DrawSolid<'a> {
    fn draw_solid(
        &mut self,
        model: &'a SolidModel,
        camera_bind_group: &'a wgpu::BindGroup,
        material_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawSolid<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_solid(
        &mut self,
        model: &'b SolidModel,
        camera_bind_group: &'b wgpu::BindGroup,
        material_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, model.vertex_buffer.slice(..));
        self.set_index_buffer(model.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, camera_bind_group, &[]); // Camera at group 0
        self.set_bind_group(1, material_bind_group, &[]); // Matcap + model at group 1
        self.draw_indexed(0..model.num_elements, 0, 0..1);
    }
}
