//! Linear algebra used by objects, camera and renderer.
//!
//! - `vector` contains `Vector2`, `Vector3` and `Vector4`
//! - `matrix` contains the row-major `Matrix4`

pub mod matrix;
pub mod vector;

pub use matrix::Matrix4;
pub use vector::{Vector2, Vector3, Vector4};

/// Determinant magnitude below which a matrix is treated as singular.
pub const EPSILON: f32 = 1e-6;

pub fn to_radians(degrees: f32) -> f32 {
    degrees * (std::f32::consts::PI / 180.0)
}

pub fn to_degrees(radians: f32) -> f32 {
    radians * (180.0 / std::f32::consts::PI)
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

pub fn is_power_of_two(value: u32) -> bool {
    value >= 1 && (value & (value - 1)) == 0
}
