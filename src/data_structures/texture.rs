//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources, with helpers
//! for the depth target, the 1x1 placeholder every object samples until its image arrives,
//! and image upload following the sampling policy in [`SamplerPolicy`].

use image::{RgbaImage, imageops};

use crate::{
    error::{Error, Result},
    math::is_power_of_two,
};

/// How an uploaded image is sampled.
///
/// Power-of-two images get a full mip chain with repeat addressing. Anything else gets a
/// single level sampled with clamp-to-edge and linear filtering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerPolicy {
    Mipmapped { levels: u32 },
    ClampLinear,
}

impl SamplerPolicy {
    pub fn for_size(width: u32, height: u32) -> Self {
        if is_power_of_two(width) && is_power_of_two(height) {
            Self::Mipmapped {
                levels: width.max(height).ilog2() + 1,
            }
        } else {
            Self::ClampLinear
        }
    }

    pub fn mip_level_count(&self) -> u32 {
        match self {
            Self::Mipmapped { levels } => *levels,
            Self::ClampLinear => 1,
        }
    }

    fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        match self {
            Self::Mipmapped { .. } => wgpu::SamplerDescriptor {
                label: Some("mipmapped sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            },
            Self::ClampLinear => wgpu::SamplerDescriptor {
                label: Some("clamped sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            },
        }
    }
}

/// Every level of the image for `policy`, starting with the image itself.
///
/// Each level halves the previous one (never below 1x1), filtered on the CPU since WebGL2
/// has no mipmap generation exposed through wgpu.
pub fn mip_chain(img: &RgbaImage, policy: SamplerPolicy) -> Vec<RgbaImage> {
    let mut levels = Vec::with_capacity(policy.mip_level_count() as usize);
    levels.push(img.clone());
    for _ in 1..policy.mip_level_count() {
        let Some(previous) = levels.last() else { break };
        let width = (previous.width() / 2).max(1);
        let height = (previous.height() / 2).max(1);
        let next = imageops::resize(previous, width, height, imageops::FilterType::Triangle);
        levels.push(next);
    }
    levels
}

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
    /// Opaque black, shown until an object's image has been uploaded.
    pub const PLACEHOLDER_TEXEL: [u8; 4] = [0, 0, 0, 255];

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// A 1x1 opaque texture so draws never sample an incomplete resource.
    pub fn create_placeholder(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(Self::PLACEHOLDER_TEXEL));
        Self::upload(device, queue, &img, label, SamplerPolicy::ClampLinear)
    }

    /// Uploads `img` with the sampler and mip chain its dimensions call for.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: &str,
    ) -> Result<Self> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::image_load(label, "image has no pixels"));
        }
        let policy = SamplerPolicy::for_size(width, height);
        log::debug!("uploading {label} ({width}x{height}, {policy:?})");
        Ok(Self::upload(device, queue, img, label, policy))
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: &str,
        policy: SamplerPolicy,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: img.width(),
            height: img.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: policy.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in mip_chain(img, policy).iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                level,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width()),
                    rows_per_image: Some(level.height()),
                },
                wgpu::Extent3d {
                    width: level.width(),
                    height: level.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&policy.sampler_descriptor()));

        Self {
            texture,
            view,
            sampler,
        }
    }
}
