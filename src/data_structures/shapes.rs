//! Concrete drawable shapes and the capability trait they share.
//!
//! [`Shape`] is a closed set of variants dispatched through [`Drawable`]. New kinds of
//! geometry plug in through [`Shape::Custom`] without touching the renderer.

use std::fmt::Debug;

use crate::{
    data_structures::{
        model::{Mesh, ModelVertex},
        terrain::Terrain,
    },
    error::Result,
    math::{Vector2, Vector3},
};

/// Capabilities every piece of scene geometry exposes to the renderer.
pub trait Drawable {
    /// Interleaved vertex data. Shapes without geometry keep the empty default.
    fn vertices(&self) -> Vec<ModelVertex> {
        Vec::new()
    }

    /// Triangle indices into [`Drawable::vertices`].
    fn indices(&self) -> Vec<u16> {
        Vec::new()
    }

    /// Spin applied per second of elapsed time, in radians per axis.
    fn angular_velocity(&self) -> Vector3 {
        Vector3::zero()
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn mesh(&self) -> Result<Mesh> {
        Mesh::new(self.vertices(), self.indices())
    }
}

/// Axis-aligned box with flat per-face normals: 24 vertices, 36 indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Cube {
    pub size: Vector3,
    pub spin: Vector3,
}

impl Cube {
    pub const DEFAULT_SPIN: Vector3 = Vector3::new(1.0, 1.0, 1.0);

    pub fn new(size: Vector3) -> Self {
        Self {
            size,
            spin: Self::DEFAULT_SPIN,
        }
    }

    pub fn with_spin(mut self, spin: Vector3) -> Self {
        self.spin = spin;
        self
    }
}

impl Default for Cube {
    fn default() -> Self {
        Self::new(Vector3::one())
    }
}

impl Drawable for Cube {
    fn vertices(&self) -> Vec<ModelVertex> {
        let Vector3 { x, y, z } = self.size * 0.5;
        // (position, normal) per face, corners listed counter-clockwise from the outside
        let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
            // front
            ([[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]], [0.0, 0.0, 1.0]),
            // back
            ([[-x, -y, -z], [-x, y, -z], [x, y, -z], [x, -y, -z]], [0.0, 0.0, -1.0]),
            // top
            ([[-x, y, -z], [-x, y, z], [x, y, z], [x, y, -z]], [0.0, 1.0, 0.0]),
            // bottom
            ([[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]], [0.0, -1.0, 0.0]),
            // right
            ([[x, -y, -z], [x, y, -z], [x, y, z], [x, -y, z]], [1.0, 0.0, 0.0]),
            // left
            ([[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]], [-1.0, 0.0, 0.0]),
        ];
        let tex_coords = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        faces
            .iter()
            .flat_map(|(corners, normal)| {
                corners
                    .iter()
                    .zip(tex_coords)
                    .map(move |(position, tex_coords)| ModelVertex {
                        position: *position,
                        normal: *normal,
                        tex_coords,
                    })
            })
            .collect()
    }

    fn indices(&self) -> Vec<u16> {
        (0..6u16)
            .flat_map(|face| {
                let base = face * 4;
                [base, base + 1, base + 2, base, base + 2, base + 3]
            })
            .collect()
    }

    fn angular_velocity(&self) -> Vector3 {
        self.spin
    }
}

/// Single upward-facing quad in the XZ plane: 4 vertices, 6 indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub size: Vector2,
    pub spin: f32,
}

impl Plane {
    pub const DEFAULT_SPIN: f32 = 0.3;

    pub fn new(size: Vector2) -> Self {
        Self {
            size,
            spin: Self::DEFAULT_SPIN,
        }
    }

    pub fn with_spin(mut self, spin: f32) -> Self {
        self.spin = spin;
        self
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Vector2::one())
    }
}

impl Drawable for Plane {
    fn vertices(&self) -> Vec<ModelVertex> {
        let Vector2 { x, y } = self.size * 0.5;
        let up = Vector3::unit_y();
        vec![
            ModelVertex::new(Vector3::new(-x, 0.0, -y), up, Vector2::new(0.0, 0.0)),
            ModelVertex::new(Vector3::new(-x, 0.0, y), up, Vector2::new(0.0, 1.0)),
            ModelVertex::new(Vector3::new(x, 0.0, y), up, Vector2::new(1.0, 1.0)),
            ModelVertex::new(Vector3::new(x, 0.0, -y), up, Vector2::new(1.0, 0.0)),
        ]
    }

    fn indices(&self) -> Vec<u16> {
        vec![0, 1, 2, 0, 2, 3]
    }

    fn angular_velocity(&self) -> Vector3 {
        Vector3::new(0.0, self.spin, 0.0)
    }
}

/// The geometry variants a scene object can carry.
pub enum Shape {
    Cube(Cube),
    Plane(Plane),
    Terrain(Terrain),
    Custom(Box<dyn Drawable>),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Cube(_) => "cube",
            Shape::Plane(_) => "plane",
            Shape::Terrain(_) => "terrain",
            Shape::Custom(_) => "custom",
        }
    }

    fn as_drawable(&self) -> &dyn Drawable {
        match self {
            Shape::Cube(cube) => cube,
            Shape::Plane(plane) => plane,
            Shape::Terrain(terrain) => terrain,
            Shape::Custom(custom) => custom.as_ref(),
        }
    }

    fn as_drawable_mut(&mut self) -> &mut dyn Drawable {
        match self {
            Shape::Cube(cube) => cube,
            Shape::Plane(plane) => plane,
            Shape::Terrain(terrain) => terrain,
            Shape::Custom(custom) => custom.as_mut(),
        }
    }
}

impl Drawable for Shape {
    fn vertices(&self) -> Vec<ModelVertex> {
        self.as_drawable().vertices()
    }

    fn indices(&self) -> Vec<u16> {
        self.as_drawable().indices()
    }

    fn angular_velocity(&self) -> Vector3 {
        self.as_drawable().angular_velocity()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.as_drawable_mut().resize(width, height)
    }

    fn mesh(&self) -> Result<Mesh> {
        self.as_drawable().mesh()
    }
}

impl Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Cube(cube) => f.debug_tuple("Cube").field(cube).finish(),
            Shape::Plane(plane) => f.debug_tuple("Plane").field(plane).finish(),
            Shape::Terrain(terrain) => f.debug_tuple("Terrain").field(terrain).finish(),
            Shape::Custom(_) => f.write_str("Custom(dyn Drawable)"),
        }
    }
}

impl From<Cube> for Shape {
    fn from(cube: Cube) -> Self {
        Shape::Cube(cube)
    }
}

impl From<Plane> for Shape {
    fn from(plane: Plane) -> Self {
        Shape::Plane(plane)
    }
}

impl From<Terrain> for Shape {
    fn from(terrain: Terrain) -> Self {
        Shape::Terrain(terrain)
    }
}
