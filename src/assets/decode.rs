use std::sync::Arc;

use crate::assets::source::AssetError;

/// Decoded raster image, ready to paint.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Location the image was loaded from.
    pub location: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied pixels.
    pub pixmap: Arc<vello_cpu::Pixmap>,
}

/// Decode PNG/JPEG/... bytes into a premultiplied pixmap.
pub fn decode_image(bytes: &[u8], location: &str) -> Result<PreparedImage, AssetError> {
    let decode_err = |message: String| AssetError::Decode {
        location: location.to_string(),
        message,
    };

    let dyn_img = image::load_from_memory(bytes).map_err(|e| decode_err(e.to_string()))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_rgba8_in_place(&mut data);

    let pixmap = pixmap_from_premul_bytes(&data, width, height).map_err(decode_err)?;
    Ok(PreparedImage {
        location: location.to_string(),
        width,
        height,
        pixmap: Arc::new(pixmap),
    })
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> Result<vello_cpu::Pixmap, String> {
    let w: u16 = width
        .try_into()
        .map_err(|_| format!("image width {width} exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| format!("image height {height} exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err("image has zero area".to_string());
    }
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err("pixmap byte len mismatch".to_string());
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
