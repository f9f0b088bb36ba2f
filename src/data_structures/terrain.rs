//! Heightmap terrain.
//!
//! Every grid cell becomes a "pinwheel": four corner vertices plus a centroid at the
//! mean corner height, fanned into four triangles.
//!
//! ```text
//!      0----1
//!      |\  /|
//!      | \/4|
//!      | /\ |
//!      |/  \|
//!      2----3
//! ```
//!
//! All normals point straight up, so the terrain is shaded flat regardless of slope.

use image::{DynamicImage, GenericImageView};

use crate::{
    data_structures::{model::ModelVertex, shapes::Drawable},
    error::{Error, Result},
    math::{Vector2, Vector3},
};

/// Height samples on a `width` x `depth` grid, row-major along x.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    width: u32,
    depth: u32,
    samples: Vec<f32>,
}

impl Heightmap {
    /// Samples the red channel of every pixel, mapping `0..=255` onto `0..=max_height`.
    pub fn from_image(img: &DynamicImage, max_height: f32) -> Self {
        let (width, depth) = img.dimensions();
        let rgba = img.to_rgba8();
        let samples = rgba
            .pixels()
            .map(|pixel| pixel.0[0] as f32 * max_height / 255.0)
            .collect();
        Self {
            width,
            depth,
            samples,
        }
    }

    /// Decodes an encoded image (PNG, JPEG, ...) and samples it.
    pub fn from_bytes(bytes: &[u8], label: &str, max_height: f32) -> Result<Self> {
        let img = image::load_from_memory(bytes).map_err(|e| Error::image_load(label, e))?;
        Ok(Self::from_image(&img, max_height))
    }

    pub fn from_samples(width: u32, depth: u32, samples: Vec<f32>) -> Result<Self> {
        if samples.len() != width as usize * depth as usize {
            return Err(Error::image_load(
                "heightmap samples",
                format!(
                    "expected {} samples for a {width}x{depth} grid, got {}",
                    width as usize * depth as usize,
                    samples.len()
                ),
            ));
        }
        Ok(Self {
            width,
            depth,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Height at grid point `(x, z)`, or `None` outside the grid.
    pub fn height(&self, x: u32, z: u32) -> Option<f32> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        self.samples.get((z * self.width + x) as usize).copied()
    }

    /// Unchecked lookup for the mesh builder, which only walks cells inside the grid.
    fn sample(&self, x: u32, z: u32) -> f32 {
        self.samples[(z * self.width + x) as usize]
    }

    fn cells(&self) -> (u32, u32) {
        (self.width.saturating_sub(1), self.depth.saturating_sub(1))
    }
}

/// Static terrain mesh derived from a [`Heightmap`].
///
/// A terrain created with [`Terrain::new`] is pending until the renderer resolves its
/// heightmap; until then it has no geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    source: Option<String>,
    max_height: f32,
    heightmap: Option<Heightmap>,
    vertices: Vec<ModelVertex>,
    indices: Vec<u16>,
}

impl Terrain {
    pub const DEFAULT_MAX_HEIGHT: f32 = 10.0;

    pub fn new(heightmap_source: impl Into<String>, max_height: f32) -> Self {
        Self {
            source: Some(heightmap_source.into()),
            max_height,
            heightmap: None,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Builds the mesh right away. `max_height` reports the tallest sample.
    pub fn from_heightmap(heightmap: Heightmap) -> Result<Self> {
        let max_height = heightmap.samples.iter().copied().fold(0.0, f32::max);
        let mut terrain = Self {
            source: None,
            max_height,
            heightmap: None,
            vertices: Vec::new(),
            indices: Vec::new(),
        };
        terrain.resolve(heightmap)?;
        Ok(terrain)
    }

    /// Where the heightmap still has to be loaded from, if anywhere.
    pub fn pending_source(&self) -> Option<&str> {
        match self.heightmap {
            Some(_) => None,
            None => self.source.as_deref(),
        }
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn heightmap(&self) -> Option<&Heightmap> {
        self.heightmap.as_ref()
    }

    /// Installs the heightmap and builds the mesh from it.
    pub fn resolve(&mut self, heightmap: Heightmap) -> Result<()> {
        let (vertices, indices) = build_mesh(&heightmap)?;
        self.vertices = vertices;
        self.indices = indices;
        self.heightmap = Some(heightmap);
        Ok(())
    }
}

impl Drawable for Terrain {
    fn vertices(&self) -> Vec<ModelVertex> {
        self.vertices.clone()
    }

    fn indices(&self) -> Vec<u16> {
        self.indices.clone()
    }
}

fn build_mesh(heightmap: &Heightmap) -> Result<(Vec<ModelVertex>, Vec<u16>)> {
    let (cells_across, cells_deep) = heightmap.cells();
    let cell_count = cells_across as usize * cells_deep as usize;
    let vertex_count = cell_count * 5;
    if vertex_count > u16::MAX as usize + 1 {
        return Err(Error::MeshTooLarge {
            vertices: vertex_count,
        });
    }

    let up = Vector3::unit_y();
    let mut vertices = Vec::with_capacity(vertex_count);
    let mut indices = Vec::with_capacity(cell_count * 12);

    for z in 0..cells_deep {
        for x in 0..cells_across {
            let h00 = heightmap.sample(x, z);
            let h01 = heightmap.sample(x + 1, z);
            let h10 = heightmap.sample(x, z + 1);
            let h11 = heightmap.sample(x + 1, z + 1);
            let hm = (h00 + h01 + h10 + h11) / 4.0;

            let (x0, x1) = (x as f32, (x + 1) as f32);
            let (z0, z1) = (z as f32, (z + 1) as f32);
            let (u0, u1) = (x0 / cells_across as f32, x1 / cells_across as f32);
            let (v0, v1) = (z0 / cells_deep as f32, z1 / cells_deep as f32);

            let ndx = vertices.len() as u16;
            vertices.extend([
                ModelVertex::new(Vector3::new(x0, h00, z0), up, Vector2::new(u0, v0)),
                ModelVertex::new(Vector3::new(x1, h01, z0), up, Vector2::new(u1, v0)),
                ModelVertex::new(Vector3::new(x0, h10, z1), up, Vector2::new(u0, v1)),
                ModelVertex::new(Vector3::new(x1, h11, z1), up, Vector2::new(u1, v1)),
                ModelVertex::new(
                    Vector3::new((x0 + x1) / 2.0, hm, (z0 + z1) / 2.0),
                    up,
                    Vector2::new((u0 + u1) / 2.0, (v0 + v1) / 2.0),
                ),
            ]);
            #[rustfmt::skip]
            indices.extend([
                ndx, ndx + 4, ndx + 1,
                ndx, ndx + 2, ndx + 4,
                ndx + 2, ndx + 3, ndx + 4,
                ndx + 1, ndx + 4, ndx + 3,
            ]);
        }
    }

    Ok((vertices, indices))
}
