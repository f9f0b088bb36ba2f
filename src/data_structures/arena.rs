//! Shared vertex/index storage for every object of a scene.
//!
//! Objects append their meshes once, in scene order, and keep the returned
//! [`MeshRange`]. Indices stay local to each mesh; the range's `base_vertex` is added by
//! the GPU at draw time, so each object only has to fit the `u16` index range on its own.

use std::ops::Range;

use crate::{
    data_structures::model::{Mesh, ModelVertex},
    error::{Error, Result},
};

/// Where one object's geometry lives inside the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshRange {
    pub first_index: u32,
    pub index_count: u32,
    pub base_vertex: i32,
}

impl MeshRange {
    pub fn indices(&self) -> Range<u32> {
        self.first_index..self.first_index + self.index_count
    }
}

#[derive(Debug, Default)]
pub struct MeshArena {
    vertices: Vec<ModelVertex>,
    indices: Vec<u16>,
    ranges: Vec<MeshRange>,
    dirty: bool,
}

impl MeshArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `mesh` behind everything stored so far.
    pub fn append(&mut self, mesh: &Mesh) -> Result<MeshRange> {
        let base_vertex = i32::try_from(self.vertices.len()).map_err(|_| Error::MeshTooLarge {
            vertices: self.vertices.len(),
        })?;
        let range = MeshRange {
            first_index: self.indices.len() as u32,
            index_count: mesh.indices.len() as u32,
            base_vertex,
        };
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend_from_slice(&mesh.indices);
        self.ranges.push(range);
        self.dirty = true;
        Ok(range)
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn ranges(&self) -> &[MeshRange] {
        &self.ranges
    }

    /// True when data was appended since the last GPU upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }
}
