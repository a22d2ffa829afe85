use std::sync::Arc;

use kurbo::Affine;

use crate::assets::color::parse_color;
use crate::assets::decode::decode_image;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{EngineError, EngineResult};
use crate::foundation::math::premul_over_in_place;
use crate::render::frame::FrameRGBA;
use crate::render::layout::{
    TEXT_BG_OPACITY, TEXT_PAD_X, TEXT_PAD_Y, contain_rect, image_overlay_rect, text_box_rect,
};
use crate::render::text::{TextBlock, TextBrushRgba8, TextLayoutEngine};
use crate::timeline::model::{ImageOverlay, TextOverlay, TimeRange};

/// Overlay resolved to pixels: decoded image or shaped text, with its destination.
pub(crate) enum PreparedOverlay {
    Image {
        range: TimeRange,
        rect: Rect,
        paint: vello_cpu::Image,
        width: u32,
        height: u32,
    },
    Text {
        range: TimeRange,
        box_rect: Rect,
        background: [u8; 4],
        color: TextBrushRgba8,
        block: TextBlock,
    },
}

impl PreparedOverlay {
    fn range(&self) -> TimeRange {
        match self {
            Self::Image { range, .. } | Self::Text { range, .. } => *range,
        }
    }

    /// Whether the overlay is drawn at local time `t` (bounds inclusive).
    pub(crate) fn is_active(&self, t: f64) -> bool {
        self.range().contains(t)
    }
}

/// Draws time-bounded overlays onto canvas-sized frames with `vello_cpu`.
///
/// Active overlays are rendered in list order into one transparent scratch surface, which is then
/// composited over the frame.
pub(crate) struct OverlayCompositor {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    scratch: vello_cpu::Pixmap,
    text: TextLayoutEngine,
}

impl OverlayCompositor {
    pub(crate) fn new(canvas: Canvas, text: TextLayoutEngine) -> EngineResult<Self> {
        let (w, h) = canvas_u16(canvas)?;
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            scratch: vello_cpu::Pixmap::new(w, h),
            text,
        })
    }

    /// Decode the overlay image once and compute its destination rectangle.
    pub(crate) fn prepare_image(
        &self,
        overlay: &ImageOverlay,
        bytes: &[u8],
    ) -> EngineResult<PreparedOverlay> {
        let prepared = decode_image(bytes)?;
        let rect = image_overlay_rect(
            self.canvas,
            prepared.width,
            prepared.height,
            overlay.position,
            overlay.scale,
        );
        let pixmap =
            pixmap_from_premul_bytes(&prepared.rgba8_premul, prepared.width, prepared.height)?;
        Ok(PreparedOverlay::Image {
            range: overlay.time_range,
            rect,
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: prepared.width,
            height: prepared.height,
        })
    }

    /// Shape and measure the text and place its background box.
    pub(crate) fn prepare_text(&mut self, overlay: &TextOverlay) -> EngineResult<PreparedOverlay> {
        let [r, g, b, a] = parse_color(&overlay.font_color)
            .map_err(|e| EngineError::validation(format!("fontColor: {e}")))?;
        let background = parse_color(&overlay.background_color)
            .map_err(|e| EngineError::validation(format!("backgroundColor: {e}")))?;
        let color = TextBrushRgba8 { r, g, b, a };
        if !self.text.has_font() {
            tracing::debug!(text = %overlay.text, "no font loaded; drawing the text box only");
        }
        let block = self
            .text
            .layout(&overlay.text, overlay.font_size, overlay.font_weight, color)?;
        let box_rect = text_box_rect(self.canvas, block.width, block.height, overlay.position);
        Ok(PreparedOverlay::Text {
            range: overlay.time_range,
            box_rect,
            background,
            color,
            block,
        })
    }

    /// Draw every overlay active at `t` onto `frame`; returns whether anything was drawn.
    pub(crate) fn apply(
        &mut self,
        frame: &mut FrameRGBA,
        t: f64,
        overlays: &[PreparedOverlay],
    ) -> EngineResult<bool> {
        if !overlays.iter().any(|o| o.is_active(t)) {
            return Ok(false);
        }
        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(EngineError::validation(format!(
                "frame size {}x{} does not match canvas {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }

        self.ctx.reset();
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        for overlay in overlays.iter().filter(|o| o.is_active(t)) {
            match overlay {
                PreparedOverlay::Image {
                    rect,
                    paint,
                    width,
                    height,
                    ..
                } => {
                    if *width == 0 || *height == 0 {
                        continue;
                    }
                    let tr = Affine::translate((rect.x0, rect.y0))
                        * Affine::scale_non_uniform(
                            rect.width() / f64::from(*width),
                            rect.height() / f64::from(*height),
                        );
                    self.ctx.set_transform(affine_to_cpu(tr));
                    self.ctx.set_paint(paint.clone());
                    self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        0.0,
                        0.0,
                        f64::from(*width),
                        f64::from(*height),
                    ));
                }
                PreparedOverlay::Text {
                    box_rect,
                    background,
                    color,
                    block,
                    ..
                } => {
                    let [r, g, b, a] = *background;
                    let bg_alpha = (f32::from(a) * TEXT_BG_OPACITY).round() as u8;
                    self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                    self.ctx
                        .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, bg_alpha));
                    self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        box_rect.x0,
                        box_rect.y0,
                        box_rect.x1,
                        box_rect.y1,
                    ));

                    let (Some(layout), Some(font)) = (block.layout.as_ref(), self.text.font_data())
                    else {
                        continue;
                    };
                    let tr = Affine::translate((box_rect.x0 + TEXT_PAD_X, box_rect.y0 + TEXT_PAD_Y));
                    self.ctx.set_transform(affine_to_cpu(tr));
                    self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        color.r, color.g, color.b, color.a,
                    ));
                    for line in layout.lines() {
                        for item in line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                                continue;
                            };
                            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            self.ctx
                                .glyph_run(font)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                }
            }
        }
        self.ctx.flush();

        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.scratch);
        if !premul_over_in_place(&mut frame.data, self.scratch.data_as_u8_slice()) {
            return Err(EngineError::validation(
                "overlay surface size does not match frame",
            ));
        }
        Ok(true)
    }
}

/// Fit a decoded frame onto the canvas: identical sizes pass through, others are letterboxed
/// ("contain") over `background`.
pub(crate) fn fit_base_frame(
    frame: FrameRGBA,
    canvas: Canvas,
    background: [u8; 4],
) -> EngineResult<FrameRGBA> {
    if frame.width == canvas.width && frame.height == canvas.height {
        return Ok(frame);
    }

    let src = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
        .ok_or_else(|| EngineError::decode("decoded frame has an unexpected byte length"))?;
    let dst_rect = contain_rect(canvas, src.width(), src.height());
    let w = (dst_rect.width().round() as u32).clamp(1, canvas.width);
    let h = (dst_rect.height().round() as u32).clamp(1, canvas.height);
    let resized = image::imageops::resize(&src, w, h, image::imageops::FilterType::Triangle);

    let mut out = FrameRGBA::solid(canvas.width, canvas.height, background);
    let x0 = ((canvas.width - w) / 2) as usize;
    let y0 = ((canvas.height - h) / 2) as usize;
    let stride = canvas.width as usize * 4;
    let row_len = w as usize * 4;
    for (row, src_row) in resized.as_raw().chunks_exact(row_len).enumerate() {
        let off = (y0 + row) * stride + x0 * 4;
        out.data[off..off + row_len].copy_from_slice(src_row);
    }
    out.premultiplied = frame.premultiplied;
    Ok(out)
}

/// Solid canvas-sized frame in premultiplied form.
pub(crate) fn solid_frame(canvas: Canvas, rgba: [u8; 4]) -> FrameRGBA {
    FrameRGBA::solid(canvas.width, canvas.height, rgba)
}

fn canvas_u16(canvas: Canvas) -> EngineResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| EngineError::validation("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| EngineError::validation("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> EngineResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| EngineError::validation("overlay image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| EngineError::validation("overlay image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(EngineError::validation("overlay image byte length mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
