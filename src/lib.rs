//! webgl-scene
//!
//! A small renderer for primitive 3D scenes: spinning cubes, planes and a heightmap
//! terrain under a free-fly camera. It runs natively and in the browser (WebGL2 through
//! wgpu). All geometry shares one vertex/index buffer and every object is drawn with the
//! same shader program.
//!
//! High-level modules
//! - `math`: vectors and the row-major `Matrix4`
//! - `camera`: camera, input controller and camera uniform
//! - `data_structures`: vertices, shapes, terrain, scene objects, mesh arena, textures
//! - `render`: the per-frame draw loop and its GPU seam (`Backend`)
//! - `context`: the wgpu implementation of that seam
//! - `pipelines`: the scene shader program
//! - `resources`: async image and heightmap loading
//! - `flow`: window and event loop
//! - `config`, `time`, `error`: tunables, frame timing and the error taxonomy
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod math;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use camera::{Camera, CameraController};
pub use config::SceneConfig;
pub use data_structures::{
    object::Object3d,
    shapes::{Cube, Drawable, Plane, Shape},
    terrain::{Heightmap, Terrain},
};
pub use error::{Error, Result};
pub use flow::{StopHandle, run, run_until_stopped};
pub use math::{Matrix4, Vector2, Vector3, Vector4};
pub use render::{Backend, DrawCall, FrameReport, Presentation, Renderer};
