//! The per-frame draw loop over an ordered list of scene objects.
//!
//! [`Renderer`] owns the objects, the camera and the shared [`MeshArena`]. It talks to the
//! GPU only through the [`Backend`] trait, which [`crate::context::Context`] implements
//! with wgpu. Every object's geometry lives in one shared vertex/index buffer pair, and
//! each frame issues one [`DrawCall`] per object, sliced out of that buffer by its
//! [`MeshRange`].
//!
//! # Frame order
//!
//! 1. every object's `update(dt)`, in insertion order
//! 2. camera globals pushed with [`Backend::begin_frame`]
//! 3. one [`Backend::draw`] per object with geometry, in insertion order
//! 4. [`Backend::end_frame`], reached even when single objects failed
//!
//! Draw order is insertion order; occlusion relies on the depth test. The object list is
//! fixed once [`Renderer::initialize`] has run.

use futures::future;
use image::RgbaImage;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::{
        arena::{MeshArena, MeshRange},
        object::{Object3d, ObjectUniform},
        shapes::Shape,
    },
    error::{Error, Result},
    resources::Assets,
    time::{FrameClock, FrameStats},
};

/// Everything the backend needs to draw one object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall {
    /// Texture slot handed out by [`Backend::create_texture`].
    pub slot: usize,
    pub range: MeshRange,
    pub uniform: ObjectUniform,
}

/// The GPU seam of the renderer.
pub trait Backend {
    /// Replaces the shared vertex/index buffers with the arena's contents.
    fn upload_meshes(&mut self, arena: &MeshArena) -> Result<()>;
    /// Allocates a texture slot showing the 1x1 placeholder.
    fn create_texture(&mut self, label: &str) -> Result<usize>;
    /// Swaps the placeholder in `slot` for the real image.
    fn upload_texture(&mut self, slot: usize, image: &RgbaImage, label: &str) -> Result<()>;
    fn resize(&mut self, width: u32, height: u32);
    fn begin_frame(&mut self, globals: &CameraUniform) -> Result<()>;
    fn draw(&mut self, call: &DrawCall) -> Result<()>;
    fn end_frame(&mut self) -> Result<Presentation>;
}

/// What became of a finished frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Presentation {
    #[default]
    Presented,
    /// Nothing was shown, e.g. the surface is not configured yet or timed out.
    Dropped,
    /// The surface is lost or outdated; the owner has to resize before the next frame.
    SurfaceLost,
}

/// An object left out of a frame, and why.
#[derive(Debug)]
pub struct SkippedDraw {
    pub index: usize,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct FrameReport {
    pub drawn: usize,
    pub skipped: Vec<SkippedDraw>,
    pub presentation: Presentation,
}

impl FrameReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug)]
pub struct Renderer<B: Backend> {
    backend: B,
    camera: Camera,
    assets: Assets,
    arena: MeshArena,
    objects: Vec<Object3d>,
    texture_slots: Vec<usize>,
    clock: FrameClock,
    stats: FrameStats,
    initialized: bool,
    load_failures: Vec<Error>,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B, camera: Camera, assets: Assets) -> Self {
        Self {
            backend,
            camera,
            assets,
            arena: MeshArena::new(),
            objects: Vec::new(),
            texture_slots: Vec::new(),
            clock: FrameClock::new(),
            stats: FrameStats::new(),
            initialized: false,
            load_failures: Vec::new(),
        }
    }

    /// Appends an object to the scene. Objects can only be added before
    /// [`Renderer::initialize`]; afterwards this returns [`Error::AlreadyInitialized`].
    pub fn add_object(&mut self, object: Object3d) -> Result<&mut Self> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.objects.push(object);
        Ok(self)
    }

    pub fn add_objects(
        &mut self,
        objects: impl IntoIterator<Item = Object3d>,
    ) -> Result<&mut Self> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.objects.extend(objects);
        Ok(self)
    }

    /// Loads everything the scene depends on and uploads it. This is the join point:
    /// no frame should be drawn before it returns.
    ///
    /// A heightmap that cannot be loaded aborts initialisation. A texture that cannot be
    /// loaded is logged and recorded in [`Renderer::load_failures`]; its object keeps the
    /// placeholder. Must be called exactly once.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.initialized = true;

        self.resolve_heightmaps().await?;
        self.load_textures().await?;

        for object in &mut self.objects {
            object.initialize(&mut self.arena)?;
        }
        if self.arena.is_dirty() {
            self.backend.upload_meshes(&self.arena)?;
            self.arena.mark_uploaded();
        }

        log::info!(
            "scene initialised: {} objects, {} vertices, {} indices",
            self.objects.len(),
            self.arena.vertices().len(),
            self.arena.indices().len()
        );
        self.clock.reset();
        Ok(())
    }

    async fn resolve_heightmaps(&mut self) -> Result<()> {
        let pending: Vec<(usize, String, f32)> = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(index, object)| match object.shape() {
                Shape::Terrain(terrain) => terrain
                    .pending_source()
                    .map(|source| (index, source.to_string(), terrain.max_height())),
                _ => None,
            })
            .collect();

        let assets = &self.assets;
        let heightmaps = future::try_join_all(
            pending
                .iter()
                .map(|(_, source, max_height)| assets.load_heightmap(source, *max_height)),
        )
        .await?;

        for ((index, source, _), heightmap) in pending.into_iter().zip(heightmaps) {
            log::debug!(
                "heightmap {source}: {}x{}",
                heightmap.width(),
                heightmap.depth()
            );
            if let Shape::Terrain(terrain) = self.objects[index].shape_mut() {
                terrain.resolve(heightmap)?;
            }
        }
        Ok(())
    }

    async fn load_textures(&mut self) -> Result<()> {
        self.texture_slots = self
            .objects
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let label = format!("{} #{index}", object.shape().kind());
                self.backend.create_texture(&label)
            })
            .collect::<Result<_>>()?;

        let assets = &self.assets;
        let loads = future::join_all(self.objects.iter().map(|object| async move {
            match object.texture() {
                Some(path) => Some((path.to_string(), assets.load_image(path).await)),
                None => None,
            }
        }))
        .await;

        for (index, load) in loads.into_iter().enumerate() {
            let Some((path, image)) = load else { continue };
            let slot = self.texture_slots[index];
            let uploaded =
                image.and_then(|image| self.backend.upload_texture(slot, &image, &path));
            if let Err(error) = uploaded {
                log::error!("object {index} keeps its placeholder texture: {error}");
                self.load_failures.push(error);
            }
        }
        Ok(())
    }

    /// Texture loads that failed during [`Renderer::initialize`].
    pub fn load_failures(&self) -> &[Error] {
        &self.load_failures
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        self.clock.tick().dt
    }

    /// Samples the clock and runs one frame.
    pub fn frame(&mut self) -> Result<FrameReport> {
        let dt = self.tick();
        self.frame_with(dt)
    }

    /// Updates and draws one frame, timing it into [`Renderer::stats`].
    pub fn frame_with(&mut self, dt: f32) -> Result<FrameReport> {
        self.stats.begin();
        self.update(dt);
        let report = self.draw();
        if let Some(sample) = self.stats.end() {
            log::debug!("{:.1} fps, {:.2} ms per frame", sample.fps, sample.ms);
        }
        report
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn update(&mut self, dt: f32) {
        for object in &mut self.objects {
            object.update(dt);
        }
    }

    /// Draws every object in insertion order. Objects whose draw data cannot be computed,
    /// or that the backend refuses, are skipped and listed in the report; the rest of the
    /// frame still runs.
    pub fn draw(&mut self) -> Result<FrameReport> {
        let mut globals = CameraUniform::new();
        globals.update(&self.camera)?;
        self.backend.begin_frame(&globals)?;

        let mut report = FrameReport::default();
        for (index, object) in self.objects.iter().enumerate() {
            let slot = self.texture_slots.get(index).copied().unwrap_or(index);
            let drawn = object.draw_info(slot).and_then(|call| match call {
                Some(call) => self.backend.draw(&call).map(|()| true),
                None => Ok(false),
            });
            match drawn {
                Ok(true) => report.drawn += 1,
                Ok(false) => {}
                Err(error) => {
                    log::error!(
                        "skipping {} #{index} this frame: {error}",
                        object.shape().kind()
                    );
                    report.skipped.push(SkippedDraw { index, error });
                }
            }
        }

        report.presentation = self.backend.end_frame()?;
        Ok(report)
    }

    /// Updates the viewport, the camera aspect and every object's resize hook.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.backend.resize(width, height);
        self.camera.resize(width, height);
        for object in &mut self.objects {
            object.resize(width, height);
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn objects(&self) -> &[Object3d] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [Object3d] {
        &mut self.objects
    }

    pub fn arena(&self) -> &MeshArena {
        &self.arena
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
