use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::EngineResult;
use crate::foundation::math::premultiply_rgba8_in_place;

#[derive(Clone, Debug)]
/// Decoded raster image in premultiplied RGBA8 form.
pub(crate) struct PreparedImage {
    /// Width in pixels.
    pub(crate) width: u32,
    /// Height in pixels.
    pub(crate) height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub(crate) rgba8_premul: Arc<Vec<u8>>,
}

/// Decode an image file held in memory (PNG, JPEG, WebP, ...).
pub(crate) fn decode_image(bytes: &[u8]) -> EngineResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}
