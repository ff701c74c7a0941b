// src/media/image_codec.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Neither side of a persisted picture exceeds this.
pub const MAX_EDGE: u32 = 1200;
pub const JPEG_QUALITY: u8 = 80;

#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Decode `src` (any supported format), normalize and write a baseline JPEG to `dest`.
    async fn reencode_jpeg(&self, src: &Path, dest: &Path) -> Result<()>;
}

/// RGB, bounded to [`MAX_EDGE`], quality [`JPEG_QUALITY`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegCodec;

impl JpegCodec {
    pub fn reencode_blocking(src: &Path, dest: &Path) -> Result<()> {
        let bytes = std::fs::read(src).with_context(|| format!("reading {}", src.display()))?;
        let img = image::load_from_memory(&bytes).context("decoding image")?;
        let rgb = bound_to_edge(img).to_rgb8();

        let file = File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
        let mut w = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut w, JPEG_QUALITY)
            .encode_image(&rgb)
            .context("encoding jpeg")?;
        w.flush()?;
        Ok(())
    }
}

/// Downscale (aspect kept, Lanczos3) only when a side exceeds [`MAX_EDGE`].
pub fn bound_to_edge(img: DynamicImage) -> DynamicImage {
    if img.width() > MAX_EDGE || img.height() > MAX_EDGE {
        img.resize(MAX_EDGE, MAX_EDGE, FilterType::Lanczos3)
    } else {
        img
    }
}

#[async_trait]
impl ImageCodec for JpegCodec {
    async fn reencode_jpeg(&self, src: &Path, dest: &Path) -> Result<()> {
        let (src, dest): (PathBuf, PathBuf) = (src.into(), dest.into());
        tokio::task::spawn_blocking(move || Self::reencode_blocking(&src, &dest))
            .await
            .context("image task aborted")?
    }
}
