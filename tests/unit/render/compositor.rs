use std::io::Cursor;

use super::*;
use crate::timeline::model::{FontWeight, ImagePosition, TextPosition};

const CANVAS: Canvas = Canvas {
    width: 64,
    height: 64,
};

fn compositor() -> OverlayCompositor {
    OverlayCompositor::new(CANVAS, TextLayoutEngine::new(None).unwrap()).unwrap()
}

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= tol)
}

#[test]
fn image_overlay_respects_time_window() {
    let mut comp = compositor();
    let overlay = ImageOverlay {
        asset_id: "logo".to_string(),
        display_name: String::new(),
        position: ImagePosition::TopLeft,
        time_range: TimeRange::new(2.0, 4.0).unwrap(),
        scale: 0.25,
    };
    let prepared = vec![comp.prepare_image(&overlay, &png(2, 2, [0, 255, 0, 255])).unwrap()];

    for (t, expect) in [(1.0, false), (2.0, true), (3.0, true), (4.0, true), (4.5, false)] {
        let mut frame = solid_frame(CANVAS, [0, 0, 255, 255]);
        let drawn = comp.apply(&mut frame, t, &prepared).unwrap();
        assert_eq!(drawn, expect, "t={t}");
        let inside = frame.pixel(28, 28).unwrap();
        if expect {
            assert!(close(inside, [0, 255, 0, 255], 2), "t={t}: {inside:?}");
        } else {
            assert_eq!(inside, [0, 0, 255, 255], "t={t}");
        }
        assert_eq!(frame.pixel(5, 5).unwrap(), [0, 0, 255, 255]);
    }
}

#[test]
fn text_background_is_sixty_percent_opaque() {
    let mut comp = compositor();
    let overlay = TextOverlay {
        text: String::new(),
        position: TextPosition::Center,
        time_range: TimeRange::new(0.0, 1.0).unwrap(),
        font_size: 16.0,
        font_color: "#ffffff".to_string(),
        background_color: "#ff0000".to_string(),
        font_weight: FontWeight::NORMAL,
    };
    let prepared = vec![comp.prepare_text(&overlay).unwrap()];
    let mut frame = solid_frame(CANVAS, [0, 0, 255, 255]);
    assert!(comp.apply(&mut frame, 0.5, &prepared).unwrap());

    let px = frame.pixel(32, 32).unwrap();
    assert!(close(px, [153, 0, 102, 255], 3), "{px:?}");
    assert_eq!(frame.pixel(0, 0).unwrap(), [0, 0, 255, 255]);
}

#[test]
fn later_overlays_draw_over_earlier_ones() {
    let mut comp = compositor();
    let range = TimeRange::new(0.0, 1.0).unwrap();
    let under = ImageOverlay {
        asset_id: "a".to_string(),
        display_name: String::new(),
        position: ImagePosition::FullScreen,
        time_range: range,
        scale: 1.0,
    };
    let over = ImageOverlay {
        position: ImagePosition::Center,
        scale: 0.5,
        ..under.clone()
    };
    let prepared = vec![
        comp.prepare_image(&under, &png(4, 4, [255, 0, 0, 255])).unwrap(),
        comp.prepare_image(&over, &png(4, 4, [0, 255, 0, 255])).unwrap(),
    ];
    let mut frame = solid_frame(CANVAS, [0, 0, 0, 255]);
    comp.apply(&mut frame, 0.0, &prepared).unwrap();
    assert!(close(frame.pixel(32, 32).unwrap(), [0, 255, 0, 255], 2));
    assert!(close(frame.pixel(2, 2).unwrap(), [255, 0, 0, 255], 2));
}

#[test]
fn fit_base_frame_letterboxes_mismatched_aspect() {
    let src = FrameRGBA::solid(4, 2, [255, 0, 0, 255]);
    let out = fit_base_frame(src, Canvas { width: 8, height: 8 }, [0, 0, 0, 255]).unwrap();
    assert_eq!((out.width, out.height), (8, 8));
    assert_eq!(out.pixel(4, 0).unwrap(), [0, 0, 0, 255]);
    assert_eq!(out.pixel(4, 4).unwrap(), [255, 0, 0, 255]);

    let same = FrameRGBA::solid(8, 8, [1, 2, 3, 255]);
    let passed = fit_base_frame(same.clone(), Canvas { width: 8, height: 8 }, [0; 4]).unwrap();
    assert_eq!(passed, same);
}
