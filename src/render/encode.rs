use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::foundation::error::{RascalsError, RascalsResult};
use crate::render::surface::FrameRGBA;

/// Encode a straight-alpha frame as PNG bytes.
pub fn encode_png(frame: &FrameRGBA) -> RascalsResult<Vec<u8>> {
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.data.len() != expected {
        return Err(RascalsError::render(format!(
            "frame data is {} bytes, {}x{} needs {expected}",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let mut out = Vec::new();
    image::write_buffer_with_format(
        &mut Cursor::new(&mut out),
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| RascalsError::render(format!("png encode failed: {e}")))?;
    Ok(out)
}

/// `data:image/png;base64,...` URL for encoded PNG bytes.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Write encoded PNG bytes to `path`, creating parent directories.
pub fn write_png(path: &Path, png: &[u8]) -> RascalsResult<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
