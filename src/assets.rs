//! Filesystem storage for product images.
//!
//! Files live under `<media root>/products/<product id>/<uuid>.<ext>` and are
//! addressed by URLs of the form `/media/products/<product id>/<uuid>.<ext>`.
//! Every stored image is normalized at upload time: flattened onto white,
//! capped in width and re-encoded, so what lands on disk is bounded no matter
//! what the client sent.

use std::{
    io::{Cursor, ErrorKind},
    path::{Component, Path, PathBuf},
};

use image::{
    DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilter, PngEncoder},
        webp::WebPEncoder,
    },
    imageops::FilterType,
};
use tokio::{
    fs,
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
};
use uuid::Uuid;

use crate::{
    config::MediaConfig,
    error::{AppError, AppResult},
};

/// URL prefix under which the media root is served.
pub const MEDIA_URL_PREFIX: &str = "/media";

const PRODUCTS_DIR: &str = "products";

const JPEG_QUALITY: u8 = 85;

#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    max_image_size_mb: u64,
    allowed_extensions: Vec<String>,
    max_image_width: u32,
}

impl AssetStore {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            root: config.root,
            max_image_size_mb: config.max_image_size_mb,
            allowed_extensions: config
                .allowed_extensions
                .into_iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            max_image_width: config.max_image_width.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the media root if it does not exist yet.
    pub async fn ensure_root(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|err| {
            AppError::Storage(format!(
                "failed to create media root {}: {err}",
                self.root.display()
            ))
        })
    }

    pub fn product_dir(&self, product_id: i32) -> PathBuf {
        self.root.join(PRODUCTS_DIR).join(product_id.to_string())
    }

    fn max_bytes(&self) -> u64 {
        self.max_image_size_mb * 1024 * 1024
    }

    /// Check the extension against the allow-list and, when the size is
    /// known up front, against the configured maximum.
    pub fn validate_image(&self, filename: &str, declared_size: Option<u64>) -> AppResult<()> {
        let allowed = extension_of(filename)
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false);
        if !allowed {
            return Err(AppError::Validation(format!(
                "Extension not allowed for '{filename}'. Use: {}",
                self.allowed_extensions.join(", ")
            )));
        }

        if let Some(size) = declared_size {
            if size > self.max_bytes() {
                return Err(self.too_large());
            }
        }

        Ok(())
    }

    fn too_large(&self) -> AppError {
        AppError::Validation(format!(
            "Image exceeds the maximum size of {}MB",
            self.max_image_size_mb
        ))
    }

    /// Store an image for `product_id` and return its public URL.
    ///
    /// The bytes are written under a fresh UUID name that keeps the original
    /// extension, then normalized in place. If anything fails after the file
    /// was created, the file is removed before the error is returned.
    pub async fn save_image<R>(&self, product_id: i32, reader: R, filename: &str) -> AppResult<String>
    where
        R: AsyncRead + Unpin,
    {
        self.validate_image(filename, None)?;
        let ext = extension_of(filename)
            .ok_or_else(|| AppError::Validation(format!("Missing extension for '{filename}'")))?;

        let dir = self.product_dir(product_id);
        fs::create_dir_all(&dir).await.map_err(|err| {
            AppError::Storage(format!("failed to create {}: {err}", dir.display()))
        })?;

        let stored_name = format!("{}.{ext}", Uuid::new_v4());
        let path = dir.join(&stored_name);

        if let Err(err) = self.write_and_normalize(&path, reader, &ext).await {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
                Err(cleanup) => tracing::warn!(
                    error = %cleanup,
                    path = %path.display(),
                    "failed to remove partially written image"
                ),
            }
            return Err(err);
        }

        tracing::debug!(product_id, path = %path.display(), "image stored");
        Ok(format!(
            "{MEDIA_URL_PREFIX}/{PRODUCTS_DIR}/{product_id}/{stored_name}"
        ))
    }

    async fn write_and_normalize<R>(&self, path: &Path, reader: R, ext: &str) -> AppResult<()>
    where
        R: AsyncRead + Unpin,
    {
        let limit = self.max_bytes();
        let mut file = fs::File::create(path).await?;
        let written = tokio::io::copy(&mut reader.take(limit + 1), &mut file).await?;
        file.flush().await?;
        drop(file);

        if written > limit {
            return Err(self.too_large());
        }
        if written == 0 {
            return Err(AppError::Validation("Empty file provided".into()));
        }

        let path = path.to_path_buf();
        let ext = ext.to_string();
        let max_width = self.max_image_width;
        tokio::task::spawn_blocking(move || normalize_image(&path, &ext, max_width))
            .await
            .map_err(|err| AppError::Internal(anyhow::anyhow!("image task failed: {err}")))?
    }

    /// Remove the file behind `url`. Never fails: a missing file is already
    /// the desired end state and other I/O errors are only logged.
    pub async fn delete_image(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            tracing::warn!(url, "image url does not point into the media root");
            return;
        };

        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "image deleted"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "failed to delete image")
            }
        }
    }

    /// Remove the whole image directory of a product, best-effort.
    pub async fn delete_all_images(&self, product_id: i32) {
        let dir = self.product_dir(product_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(product_id, "product images deleted"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(
                error = %err,
                path = %dir.display(),
                "failed to delete product image directory"
            ),
        }
    }

    /// Map a stored URL back to its path on disk. URLs outside the media
    /// prefix or with anything but plain path segments map to nothing.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url
            .strip_prefix(MEDIA_URL_PREFIX)?
            .strip_prefix('/')?;
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

fn normalize_image(path: &Path, ext: &str, max_width: u32) -> AppResult<()> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|err| AppError::Validation(format!("Invalid image file: {err}")))?;

    let img = flatten_alpha(img);
    let img = if img.width() > max_width {
        let height = (u64::from(img.height()) * u64::from(max_width) / u64::from(img.width()))
            .max(1) as u32;
        img.resize_exact(max_width, height, FilterType::Lanczos3)
    } else {
        img
    };

    let encoded = encode(&img, ext)?;
    std::fs::write(path, encoded)?;
    Ok(())
}

/// Composite images with an alpha channel onto an opaque white background.
fn flatten_alpha(img: DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img;
    }

    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        let blend = |channel: u8| {
            ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(rgb)
}

fn encode(img: &DynamicImage, ext: &str) -> AppResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let result = match ext {
            "jpg" | "jpeg" => img
                .to_rgb8()
                .write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY)),
            "png" => img.write_with_encoder(PngEncoder::new_with_quality(
                &mut cursor,
                CompressionType::Best,
                PngFilter::Adaptive,
            )),
            "webp" => img
                .to_rgb8()
                .write_with_encoder(WebPEncoder::new_lossless(&mut cursor)),
            other => {
                let format = ImageFormat::from_extension(other).ok_or_else(|| {
                    AppError::Validation(format!("Unsupported image format: {other}"))
                })?;
                img.write_to(&mut cursor, format)
            }
        };
        result.map_err(|err| AppError::Storage(format!("failed to encode image: {err}")))?;
    }
    Ok(buffer)
}
