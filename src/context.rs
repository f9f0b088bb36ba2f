//! wgpu device, surface and the scene's GPU resources.
//!
//! [`Context`] is the [`Backend`] the renderer draws through on real hardware. Draw calls
//! are collected between `begin_frame` and `end_frame`. `end_frame` writes all per-object
//! uniforms into one dynamic-offset buffer and then records a single render pass.

use std::{mem, sync::Arc};

use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::CameraUniform,
    config::SceneConfig,
    data_structures::{arena::MeshArena, model::ModelVertex, object::ObjectUniform, texture},
    error::{Error, Result},
    pipelines::scene::{FRAGMENT_SHADER, ScenePipeline, VERTEX_SHADER},
    render::{Backend, DrawCall, Presentation},
};

/// Objects the per-object uniform buffer holds before it has to grow.
const INITIAL_OBJECT_CAPACITY: usize = 16;

#[derive(Debug)]
struct TextureSlot {
    #[allow(unused)]
    texture: texture::Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
struct ObjectUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) is_surface_configured: bool,
    clear_color: wgpu::Color,
    pipeline: ScenePipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    objects: ObjectUniforms,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    textures: Vec<TextureSlot>,
    pending: Vec<DrawCall>,
}

impl Context {
    pub async fn new(window: Arc<Window>, scene: &SceneConfig) -> Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| Error::ContextCreationFailure(format!("surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::ContextCreationFailure(format!("adapter: {e}")))?;
        log::info!("adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| Error::ContextCreationFailure(format!("device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an sRGB surface; anything else comes out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                Error::ContextCreationFailure("surface supports no formats".to_string())
            })?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let pipeline =
            ScenePipeline::new(&device, config.format, VERTEX_SHADER, FRAGMENT_SHADER).await?;

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pipeline.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
            label: Some("globals_bind_group"),
        });

        let objects = create_object_uniforms(&device, &pipeline, INITIAL_OBJECT_CAPACITY);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            is_surface_configured: false,
            clear_color: scene.clear_color,
            pipeline,
            globals_buffer,
            globals_bind_group,
            objects,
            vertex_buffer: None,
            index_buffer: None,
            textures: Vec::new(),
            pending: Vec::new(),
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn create_texture_slot(&self, texture: texture::Texture, label: &str) -> Result<TextureSlot> {
        let sampler = texture
            .sampler
            .as_ref()
            .ok_or_else(|| Error::ResourceNotFound(format!("sampler for {label}")))?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.pipeline.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(label),
        });
        Ok(TextureSlot {
            texture,
            bind_group,
        })
    }

    fn create_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer> {
        let max = self.device.limits().max_buffer_size;
        if contents.len() as u64 > max {
            return Err(Error::BufferCreationFailure(format!(
                "{label}: {} bytes exceeds the device limit of {max}",
                contents.len()
            )));
        }
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            }))
    }

    fn write_object_uniforms(&mut self) {
        if self.pending.len() > self.objects.capacity {
            let capacity = self.pending.len().next_power_of_two();
            log::debug!("growing object uniform buffer to {capacity} entries");
            self.objects = create_object_uniforms(&self.device, &self.pipeline, capacity);
        }
        let stride = self.objects.stride as usize;
        let mut staging = vec![0u8; stride * self.pending.len()];
        for (chunk, call) in staging.chunks_mut(stride).zip(&self.pending) {
            chunk[..mem::size_of::<ObjectUniform>()]
                .copy_from_slice(bytemuck::bytes_of(&call.uniform));
        }
        self.queue.write_buffer(&self.objects.buffer, 0, &staging);
    }
}

fn create_object_uniforms(
    device: &wgpu::Device,
    pipeline: &ScenePipeline,
    capacity: usize,
) -> ObjectUniforms {
    let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
    let stride = wgpu::util::align_to(mem::size_of::<ObjectUniform>() as u64, alignment);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Object Uniform Buffer"),
        size: stride * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &pipeline.object_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(mem::size_of::<ObjectUniform>() as u64),
            }),
        }],
        label: Some("object_bind_group"),
    });
    ObjectUniforms {
        buffer,
        bind_group,
        stride,
        capacity,
    }
}

impl Backend for Context {
    fn upload_meshes(&mut self, arena: &MeshArena) -> Result<()> {
        if arena.indices().is_empty() {
            self.vertex_buffer = None;
            self.index_buffer = None;
            return Ok(());
        }
        self.vertex_buffer = Some(self.create_buffer(
            "Scene Vertex Buffer",
            bytemuck::cast_slice(arena.vertices()),
            wgpu::BufferUsages::VERTEX,
        )?);
        self.index_buffer = Some(self.create_buffer(
            "Scene Index Buffer",
            bytemuck::cast_slice(arena.indices()),
            wgpu::BufferUsages::INDEX,
        )?);
        log::debug!(
            "uploaded {} vertices and {} indices",
            arena.vertices().len(),
            arena.indices().len()
        );
        Ok(())
    }

    fn create_texture(&mut self, label: &str) -> Result<usize> {
        let placeholder = texture::Texture::create_placeholder(&self.device, &self.queue, label);
        let slot = self.create_texture_slot(placeholder, label)?;
        self.textures.push(slot);
        Ok(self.textures.len() - 1)
    }

    fn upload_texture(&mut self, slot: usize, image: &RgbaImage, label: &str) -> Result<()> {
        if slot >= self.textures.len() {
            return Err(Error::ResourceNotFound(format!("texture slot {slot}")));
        }
        let texture = texture::Texture::from_image(&self.device, &self.queue, image, label)?;
        self.textures[slot] = self.create_texture_slot(texture, label)?;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.is_surface_configured = true;
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    fn begin_frame(&mut self, globals: &CameraUniform) -> Result<()> {
        self.pending.clear();
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[*globals]));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<()> {
        if call.slot >= self.textures.len() {
            return Err(Error::ResourceNotFound(format!("texture slot {}", call.slot)));
        }
        self.pending.push(*call);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<Presentation> {
        if !self.is_surface_configured {
            return Ok(Presentation::Dropped);
        }
        self.write_object_uniforms();

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            // the owner reconfigures through Renderer::resize
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated");
                return Ok(Presentation::SurfaceLost);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, dropping frame");
                return Ok(Presentation::Dropped);
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
                return Ok(Presentation::Dropped);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some(vertex_buffer), Some(index_buffer)) =
                (&self.vertex_buffer, &self.index_buffer)
            {
                render_pass.set_pipeline(&self.pipeline.pipeline);
                render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

                let vertex_size = mem::size_of::<ModelVertex>() as u64;
                for (i, call) in self.pending.iter().enumerate() {
                    let offset = (i as u64 * self.objects.stride) as wgpu::DynamicOffset;
                    render_pass.set_bind_group(1, &self.objects.bind_group, &[offset]);
                    render_pass.set_bind_group(2, &self.textures[call.slot].bind_group, &[]);
                    // WebGL2 has no base vertex, so the offset goes into the buffer binding
                    let first_vertex = call.range.base_vertex as u64 * vertex_size;
                    render_pass.set_vertex_buffer(0, vertex_buffer.slice(first_vertex..));
                    render_pass.draw_indexed(call.range.indices(), 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(Presentation::Presented)
    }
}

/// Looks up the canvas the scene renders into.
#[cfg(target_arch = "wasm32")]
pub fn find_canvas(canvas_id: &str) -> Result<web_sys::HtmlCanvasElement> {
    use wasm_bindgen::JsCast;

    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| Error::ContextCreationFailure("no browser document".to_string()))?;
    let element = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| Error::ResourceNotFound(format!("canvas with id \"{canvas_id}\"")))?;
    element.dyn_into::<web_sys::HtmlCanvasElement>().map_err(|_| {
        Error::ResourceNotFound(format!("element \"{canvas_id}\" is not a canvas"))
    })
}
