use std::path::{Path, PathBuf};

use crate::foundation::error::{EngineError, EngineResult};
use crate::timeline::model::FontWeight;

/// Locations probed for a font when none is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    /// Red channel.
    pub(crate) r: u8,
    /// Green channel.
    pub(crate) g: u8,
    /// Blue channel.
    pub(crate) b: u8,
    /// Alpha channel.
    pub(crate) a: u8,
}

/// Laid-out text plus its measured size in pixels.
pub(crate) struct TextBlock {
    /// Shaped layout; `None` when no font is available.
    pub(crate) layout: Option<parley::Layout<TextBrushRgba8>>,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

struct LoadedFont {
    family_name: String,
    data: vello_cpu::peniko::FontData,
}

/// Stateful helper for building Parley text layouts from one font file.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font: Option<LoadedFont>,
}

impl TextLayoutEngine {
    /// Load the configured font, or the first system font found.
    ///
    /// An explicitly configured font that cannot be read is a configuration error. Without any
    /// font, text boxes are still sized from an estimate and drawn without glyphs.
    pub(crate) fn new(font_path: Option<&Path>) -> EngineResult<Self> {
        let mut engine = Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            font: None,
        };

        match font_path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    EngineError::config(format!("failed to read font '{}': {e}", path.display()))
                })?;
                engine.register(bytes).map_err(|e| {
                    EngineError::config(format!("font '{}': {e}", path.display()))
                })?;
            }
            None => {
                let found = SYSTEM_FONT_CANDIDATES
                    .iter()
                    .map(PathBuf::from)
                    .find_map(|p| std::fs::read(&p).ok().map(|b| (p, b)));
                match found {
                    Some((path, bytes)) => {
                        if engine.register(bytes).is_ok() {
                            tracing::debug!(font = %path.display(), "loaded system font");
                        }
                    }
                    None => {
                        tracing::warn!("no font found; text overlays render without glyphs");
                    }
                }
            }
        }
        Ok(engine)
    }

    /// Whether glyphs can be rendered.
    pub(crate) fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Font handle for glyph drawing.
    pub(crate) fn font_data(&self) -> Option<&vello_cpu::peniko::FontData> {
        self.font.as_ref().map(|f| &f.data)
    }

    fn register(&mut self, bytes: Vec<u8>) -> Result<(), String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| "no font families registered from font bytes".to_string())?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| "registered font family has no name".to_string())?
            .to_string();

        self.font = Some(LoadedFont {
            family_name,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        });
        Ok(())
    }

    /// Shape and measure plain text; newlines start new lines.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        weight: FontWeight,
        brush: TextBrushRgba8,
    ) -> EngineResult<TextBlock> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(EngineError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let Some(font) = self.font.as_ref() else {
            let (width, height) = estimate_text_size(text, size_px);
            return Ok(TextBlock {
                layout: None,
                width,
                height,
            });
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(weight.0)),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let width = f64::from(layout.width());
        let height = f64::from(layout.height());
        Ok(TextBlock {
            layout: Some(layout),
            width,
            height,
        })
    }
}

/// Size estimate used when no font is available: `0.6·size` per character, `1.2·size` per line.
pub(crate) fn estimate_text_size(text: &str, size_px: f32) -> (f64, f64) {
    let size = f64::from(size_px);
    let lines: Vec<&str> = text.split('\n').collect();
    let longest = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    (0.6 * size * longest as f64, 1.2 * size * lines.len() as f64)
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
