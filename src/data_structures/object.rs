//! Scene objects: a shape placed in the world.
//!
//! An [`Object3d`] owns its transform and keeps the model matrix in sync with it. Every
//! setter rebuilds the matrix before returning, so [`Object3d::model_matrix`] is never stale.

use crate::{
    data_structures::{
        arena::{MeshArena, MeshRange},
        model::Mesh,
        shapes::{Drawable, Shape},
    },
    error::Result,
    math::{Matrix4, Vector3},
    render::DrawCall,
};

#[derive(Debug)]
pub struct Object3d {
    position: Vector3,
    rotation: Vector3,
    /// Stored and settable but not applied to the model matrix or the mesh.
    scale: Vector3,
    model_matrix: Matrix4,
    shape: Shape,
    texture: Option<String>,
    range: Option<MeshRange>,
}

impl Object3d {
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::one(),
            model_matrix: Matrix4::identity(),
            shape: shape.into(),
            texture: None,
            range: None,
        }
    }

    pub fn at(mut self, position: Vector3) -> Self {
        self.set_position(position);
        self
    }

    /// Path of the image sampled by this object, relative to the asset root.
    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.update_model_matrix();
    }

    /// Euler angles in radians, applied X then Y then Z.
    pub fn rotation(&self) -> Vector3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vector3) {
        self.rotation = rotation;
        self.update_model_matrix();
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
        self.update_model_matrix();
    }

    pub fn model_matrix(&self) -> Matrix4 {
        self.model_matrix
    }

    /// Inverse transpose of the model matrix, used to carry normals into world space.
    pub fn normal_matrix(&self) -> Result<Matrix4> {
        Ok(self.model_matrix.invert()?.transpose())
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    /// Where this object's geometry lives in the arena, once initialised.
    pub fn range(&self) -> Option<MeshRange> {
        self.range
    }

    pub fn mesh(&self) -> Result<Mesh> {
        self.shape.mesh()
    }

    /// Appends this object's mesh to the arena. Must be called exactly once per object;
    /// a second call appends the geometry again.
    pub fn initialize(&mut self, arena: &mut MeshArena) -> Result<MeshRange> {
        let range = arena.append(&self.mesh()?)?;
        self.range = Some(range);
        Ok(range)
    }

    /// Advances the self-animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let spin = self.shape.angular_velocity();
        if spin != Vector3::zero() {
            self.set_rotation(self.rotation + spin * dt);
        }
    }

    /// Draw descriptor for the current transform, or `None` when the object has no
    /// geometry in the arena.
    pub fn draw_info(&self, slot: usize) -> Result<Option<DrawCall>> {
        let Some(range) = self.range.filter(|range| range.index_count > 0) else {
            return Ok(None);
        };
        Ok(Some(DrawCall {
            slot,
            range,
            uniform: ObjectUniform {
                model: self.model_matrix.to_array(),
                normal: self.normal_matrix()?.to_array(),
            },
        }))
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.shape.resize(width, height);
    }

    fn update_model_matrix(&mut self) {
        self.model_matrix = Matrix4::rotation_x(self.rotation.x)
            * Matrix4::rotation_y(self.rotation.y)
            * Matrix4::rotation_z(self.rotation.z)
            * Matrix4::translation(self.position);
    }
}

/// Per-object uniform block, bound with a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl Default for ObjectUniform {
    fn default() -> Self {
        let identity = Matrix4::identity().to_array();
        Self {
            model: identity,
            normal: identity,
        }
    }
}
