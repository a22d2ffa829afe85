use crate::foundation::core::{Canvas, Rect};
use crate::timeline::model::{ImagePosition, TextPosition};

/// Distance between anchored overlays and the canvas edge.
pub(crate) const EDGE_PAD: f64 = 20.0;
/// Horizontal padding inside a text background box.
pub(crate) const TEXT_PAD_X: f64 = 24.0;
/// Vertical padding inside a text background box.
pub(crate) const TEXT_PAD_Y: f64 = 16.0;
/// Opacity applied to text background colors.
pub(crate) const TEXT_BG_OPACITY: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    Center,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

fn place(canvas: Canvas, w: f64, h: f64, anchor: Anchor) -> Rect {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let (x, y) = match anchor {
        Anchor::TopLeft => (EDGE_PAD, EDGE_PAD),
        Anchor::TopCenter => ((cw - w) / 2.0, EDGE_PAD),
        Anchor::TopRight => (cw - w - EDGE_PAD, EDGE_PAD),
        Anchor::Center => ((cw - w) / 2.0, (ch - h) / 2.0),
        Anchor::BottomLeft => (EDGE_PAD, ch - h - EDGE_PAD),
        Anchor::BottomCenter => ((cw - w) / 2.0, ch - h - EDGE_PAD),
        Anchor::BottomRight => (cw - w - EDGE_PAD, ch - h - EDGE_PAD),
    };
    Rect::new(x, y, x + w, y + h)
}

/// Destination rectangle of an image overlay.
///
/// Width is `canvas.width * scale` with the image aspect ratio kept; `full-screen` covers the canvas.
pub(crate) fn image_overlay_rect(
    canvas: Canvas,
    image_w: u32,
    image_h: u32,
    position: ImagePosition,
    scale: f64,
) -> Rect {
    if position == ImagePosition::FullScreen {
        return Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));
    }
    let w = f64::from(canvas.width) * scale;
    let h = if image_w == 0 {
        0.0
    } else {
        w * f64::from(image_h) / f64::from(image_w)
    };
    let anchor = match position {
        ImagePosition::TopLeft => Anchor::TopLeft,
        ImagePosition::TopRight => Anchor::TopRight,
        ImagePosition::BottomLeft => Anchor::BottomLeft,
        ImagePosition::BottomRight => Anchor::BottomRight,
        ImagePosition::Center | ImagePosition::FullScreen => Anchor::Center,
    };
    place(canvas, w, h, anchor)
}

/// Background box of a text overlay whose measured text is `text_w × text_h`.
pub(crate) fn text_box_rect(canvas: Canvas, text_w: f64, text_h: f64, position: TextPosition) -> Rect {
    let w = text_w + 2.0 * TEXT_PAD_X;
    let h = text_h + 2.0 * TEXT_PAD_Y;
    let anchor = match position {
        TextPosition::TopLeft => Anchor::TopLeft,
        TextPosition::TopRight => Anchor::TopRight,
        TextPosition::BottomLeft => Anchor::BottomLeft,
        TextPosition::BottomRight => Anchor::BottomRight,
        TextPosition::TopCenter => Anchor::TopCenter,
        TextPosition::BottomCenter => Anchor::BottomCenter,
        TextPosition::Center | TextPosition::FullScreen => Anchor::Center,
    };
    place(canvas, w, h, anchor)
}

/// Largest rectangle with the source aspect ratio centered inside the canvas.
pub(crate) fn contain_rect(canvas: Canvas, src_w: u32, src_h: u32) -> Rect {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    if src_w == 0 || src_h == 0 {
        return Rect::new(0.0, 0.0, cw, ch);
    }
    let s = (cw / f64::from(src_w)).min(ch / f64::from(src_h));
    let w = f64::from(src_w) * s;
    let h = f64::from(src_h) * s;
    let x = (cw - w) / 2.0;
    let y = (ch - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
