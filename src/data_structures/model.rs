//! Vertex layout and CPU-side mesh data.

use crate::{
    error::{Error, Result},
    math::{Vector2, Vector3},
};

/// Describes how a vertex type is laid out in a GPU vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Interleaved position, normal and texture coordinate: eight floats per vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    pub const FLOATS: usize = 8;

    pub fn new(position: Vector3, normal: Vector3, tex_coords: Vector2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            tex_coords: tex_coords.into(),
        }
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // vertex_position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // vertex_normal
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // texture_coords
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Triangle list geometry of one object.
///
/// Indices are local to `vertices` and wind counter-clockwise for front faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Builds a mesh, rejecting vertex counts a `u16` index cannot address.
    pub fn new(vertices: Vec<ModelVertex>, indices: Vec<u16>) -> Result<Self> {
        if vertices.len() > u16::MAX as usize + 1 {
            return Err(Error::MeshTooLarge {
                vertices: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Flattened attribute buffer, eight floats per vertex.
    pub fn object_buffer(&self) -> Vec<f32> {
        bytemuck::cast_slice(&self.vertices).to_vec()
    }
}
