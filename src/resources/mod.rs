//! Loading of images and heightmaps from outside the program.
//!
//! Natively paths resolve against a directory on disk. On wasm they resolve against the
//! page origin and are fetched over HTTP.

use image::RgbaImage;

use crate::{
    data_structures::terrain::Heightmap,
    error::{Error, Result},
};

/// Where asset paths are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assets {
    root: String,
}

impl Assets {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub async fn load_binary(&self, file_name: &str) -> Result<Vec<u8>> {
        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = self.format_url(file_name)?;
            let response = reqwest::get(url)
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|e| Error::ResourceNotFound(format!("{file_name}: {e}")))?;
            response
                .bytes()
                .await
                .map_err(|e| Error::ResourceNotFound(format!("{file_name}: {e}")))?
                .to_vec()
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            let path = std::path::Path::new(&self.root).join(file_name);
            tokio::fs::read(path).await?
        };

        Ok(data)
    }

    /// Loads and decodes an image. Any failure along the way is an image load failure.
    pub async fn load_image(&self, file_name: &str) -> Result<RgbaImage> {
        let bytes = self
            .load_binary(file_name)
            .await
            .map_err(|e| Error::image_load(file_name, e))?;
        let img = image::load_from_memory(&bytes).map_err(|e| Error::image_load(file_name, e))?;
        Ok(img.to_rgba8())
    }

    pub async fn load_heightmap(&self, file_name: &str, max_height: f32) -> Result<Heightmap> {
        let bytes = self
            .load_binary(file_name)
            .await
            .map_err(|e| Error::image_load(file_name, e))?;
        Heightmap::from_bytes(&bytes, file_name, max_height)
    }

    #[cfg(target_arch = "wasm32")]
    fn format_url(&self, file_name: &str) -> Result<reqwest::Url> {
        let origin = web_sys::window()
            .ok_or_else(|| Error::ResourceNotFound("window".to_string()))?
            .location()
            .origin()
            .map_err(|_| Error::ResourceNotFound("window.location.origin".to_string()))?;
        let base = reqwest::Url::parse(&format!("{}/{}/", origin, self.root.trim_matches('/')))
            .map_err(|e| Error::ResourceNotFound(format!("{origin}: {e}")))?;
        base.join(file_name)
            .map_err(|e| Error::ResourceNotFound(format!("{file_name}: {e}")))
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new("assets")
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use image::{DynamicImage, ImageFormat, Rgba};

    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("webgl-scene-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn missing_image_is_an_image_load_failure() {
        let assets = Assets::new(scratch_dir("missing").to_string_lossy());
        match assets.load_image("nope.png").await {
            Err(Error::ImageLoadFailure { source_path, .. }) => assert_eq!(source_path, "nope.png"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrupt_image_is_an_image_load_failure() {
        let dir = scratch_dir("corrupt");
        std::fs::write(dir.join("broken.png"), b"not a png").unwrap();
        let assets = Assets::new(dir.to_string_lossy());
        assert!(matches!(
            assets.load_image("broken.png").await,
            Err(Error::ImageLoadFailure { .. })
        ));
    }

    #[tokio::test]
    async fn heightmap_is_read_from_red_channel() {
        let dir = scratch_dir("heightmap");
        let img = RgbaImage::from_fn(3, 2, |x, _| Rgba([if x == 2 { 255 } else { 0 }, 9, 9, 255]));
        DynamicImage::ImageRgba8(img)
            .save_with_format(dir.join("hm.png"), ImageFormat::Png)
            .unwrap();

        let assets = Assets::new(dir.to_string_lossy());
        let heightmap = assets.load_heightmap("hm.png", 10.0).await.unwrap();
        assert_eq!((heightmap.width(), heightmap.depth()), (3, 2));
        assert_eq!(heightmap.height(2, 1), Some(10.0));
        assert_eq!(heightmap.height(0, 0), Some(0.0));
    }
}
