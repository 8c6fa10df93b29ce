use std::sync::Arc;

use super::*;
use crate::assets::decode::pixmap_from_premul_bytes;

fn solid_image(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    let bytes: Vec<u8> = std::iter::repeat_n(px, (w * h) as usize).flatten().collect();
    PreparedImage {
        location: "solid.png".to_string(),
        width: w,
        height: h,
        pixmap: Arc::new(pixmap_from_premul_bytes(&bytes, w, h).unwrap()),
    }
}

fn pixel(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

#[test]
fn rejects_oversized_or_empty_surfaces() {
    assert!(CpuSurface::new(70_000, 10).is_err());
    assert!(CpuSurface::new(0, 10).is_err());
}

#[test]
fn fill_covers_every_pixel() {
    let mut s = CpuSurface::new(8, 4).unwrap();
    s.clear();
    s.fill(Rgba8::base_fill());
    let frame = s.finish();
    assert_eq!((frame.width, frame.height), (8, 4));
    assert_eq!(pixel(&frame, 0, 0), [0x0a, 0x0f, 0x22, 0xff]);
    assert_eq!(pixel(&frame, 7, 3), [0x0a, 0x0f, 0x22, 0xff]);
}

#[test]
fn image_lands_inside_its_destination() {
    let mut s = CpuSurface::new(16, 16).unwrap();
    s.fill(Rgba8::new(0, 0, 0, 255));
    let red = solid_image(2, 2, [255, 0, 0, 255]);
    s.draw_image(&red, Rect::new(8.0, 8.0, 16.0, 16.0), Affine::IDENTITY);
    let frame = s.finish();
    assert_eq!(pixel(&frame, 2, 2), [0, 0, 0, 255]);
    assert_eq!(pixel(&frame, 12, 12), [255, 0, 0, 255]);
}

#[test]
fn transform_applies_to_destination() {
    let mut s = CpuSurface::new(16, 16).unwrap();
    let green = solid_image(1, 1, [0, 255, 0, 255]);
    s.draw_image(
        &green,
        Rect::new(0.0, 0.0, 4.0, 4.0),
        Affine::translate((8.0, 0.0)) * Affine::scale(2.0),
    );
    let frame = s.finish();
    assert_eq!(pixel(&frame, 12, 4), [0, 255, 0, 255]);
    assert_eq!(pixel(&frame, 4, 4)[3], 0);
    assert_eq!(pixel(&frame, 12, 12)[3], 0);
}

#[test]
fn clear_discards_earlier_draws() {
    let mut s = CpuSurface::new(4, 4).unwrap();
    s.fill(Rgba8::new(255, 255, 255, 255));
    s.clear();
    let frame = s.finish();
    assert!(frame.data.iter().all(|&b| b == 0));
}
