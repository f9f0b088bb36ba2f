//! Render pipelines. The scene is drawn with a single pipeline; see [`scene`].

pub mod scene;
