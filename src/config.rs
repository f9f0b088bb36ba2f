//! Tunable constants of a scene, gathered in one place.
//!
//! There is no file format; adjust the fields in code before calling [`crate::flow::run`].

use std::time::Duration;

use crate::{
    data_structures::terrain::Terrain,
    math::{Vector3, to_radians},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Canvas element id the renderer attaches to on wasm.
    pub canvas_id: String,
    pub title: String,
    /// Directory (natively) or URL prefix (wasm) that asset paths are resolved against.
    pub asset_root: String,
    pub clear_color: wgpu::Color,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub terrain_max_height: f32,
    pub resize_debounce: Duration,
    pub double_click: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Vector3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees, clamped to +-89.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse travel.
    pub sensitivity: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            canvas_id: "canvas".to_string(),
            title: "webgl-scene".to_string(),
            asset_root: "assets".to_string(),
            clear_color: wgpu::Color::BLACK,
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            terrain_max_height: Terrain::DEFAULT_MAX_HEIGHT,
            resize_debounce: Duration::from_millis(200),
            double_click: Duration::from_millis(300),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 6.0, 22.0),
            yaw: -90.0,
            pitch: 0.0,
            fov: to_radians(45.0),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            speed: 30.0,
            sensitivity: 0.2,
        }
    }
}
