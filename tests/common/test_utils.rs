use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, RgbaImage};
use webgl_scene::{
    Backend, Camera, Error, Object3d, Presentation, Renderer,
    camera::CameraUniform,
    config::CameraConfig,
    data_structures::arena::MeshArena,
    error::Result,
    render::DrawCall,
    resources::Assets,
};

/// One call the renderer made into its backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UploadMeshes { vertices: usize, indices: usize },
    CreateTexture { slot: usize, label: String },
    UploadTexture { slot: usize, label: String, size: (u32, u32) },
    Resize(u32, u32),
    BeginFrame(CameraUniform),
    Draw(DrawCall),
    EndFrame,
}

/// A backend that records every call instead of touching a GPU.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<Command>,
    /// Draws into this texture slot are refused.
    pub failing_slot: Option<usize>,
    /// Returned from every `end_frame`.
    pub presentation: Presentation,
    textures: usize,
}

impl RecordingBackend {
    pub fn draws(&self) -> Vec<DrawCall> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::Draw(call) => Some(*call),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| matches(c)).count()
    }
}

impl Backend for RecordingBackend {
    fn upload_meshes(&mut self, arena: &MeshArena) -> Result<()> {
        self.commands.push(Command::UploadMeshes {
            vertices: arena.vertices().len(),
            indices: arena.indices().len(),
        });
        Ok(())
    }

    fn create_texture(&mut self, label: &str) -> Result<usize> {
        let slot = self.textures;
        self.textures += 1;
        self.commands.push(Command::CreateTexture {
            slot,
            label: label.to_string(),
        });
        Ok(slot)
    }

    fn upload_texture(&mut self, slot: usize, image: &RgbaImage, label: &str) -> Result<()> {
        self.commands.push(Command::UploadTexture {
            slot,
            label: label.to_string(),
            size: image.dimensions(),
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.commands.push(Command::Resize(width, height));
    }

    fn begin_frame(&mut self, globals: &CameraUniform) -> Result<()> {
        self.commands.push(Command::BeginFrame(*globals));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<()> {
        if self.failing_slot == Some(call.slot) {
            return Err(Error::ResourceNotFound(format!("texture slot {}", call.slot)));
        }
        self.commands.push(Command::Draw(*call));
        Ok(())
    }

    fn end_frame(&mut self) -> Result<Presentation> {
        self.commands.push(Command::EndFrame);
        Ok(self.presentation)
    }
}

/// A fresh, empty asset directory unique to one test.
pub fn asset_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("webgl-scene-{test}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_png(dir: &PathBuf, name: &str, image: RgbaImage) {
    DynamicImage::ImageRgba8(image)
        .save_with_format(dir.join(name), ImageFormat::Png)
        .unwrap();
}

pub fn renderer(assets: &PathBuf, objects: Vec<Object3d>) -> Renderer<RecordingBackend> {
    let camera = Camera::new(&CameraConfig::default(), 16.0 / 9.0);
    let mut renderer = Renderer::new(
        RecordingBackend::default(),
        camera,
        Assets::new(assets.to_string_lossy()),
    );
    renderer.add_objects(objects).unwrap();
    renderer
}
