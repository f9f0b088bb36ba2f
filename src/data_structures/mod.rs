//! Scene data: vertices, meshes, shapes, objects and their GPU-side counterparts.
//!
//! - `model` contains the vertex layout and CPU-side [`model::Mesh`]
//! - `shapes` contains the [`shapes::Drawable`] capability and the built-in shapes
//! - `terrain` builds terrain meshes from heightmaps
//! - `object` places a shape in the world with an always up-to-date model matrix
//! - `arena` collects every object's geometry into one shared buffer
//! - `texture` contains GPU texture wrapper and creation utilities

pub mod arena;
pub mod model;
pub mod object;
pub mod shapes;
pub mod terrain;
pub mod texture;
