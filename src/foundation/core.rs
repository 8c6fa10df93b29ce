pub use kurbo::{Affine, Point, Rect, Vec2};

/// Smallest token id in the collection.
pub const TOKEN_MIN: u32 = 1;
/// Largest token id in the collection.
pub const TOKEN_MAX: u32 = 3333;

/// Clamp any integer token id into `[TOKEN_MIN, TOKEN_MAX]`.
pub fn clamp_token(id: i64) -> u32 {
    id.clamp(i64::from(TOKEN_MIN), i64::from(TOKEN_MAX)) as u32
}

/// Parse user/URL input into a clamped token id.
///
/// Blank, non-numeric and zero input map to [`TOKEN_MIN`]; fractional input is truncated.
pub fn parse_token(raw: &str) -> u32 {
    let s = raw.trim();
    if let Ok(n) = s.parse::<i64>() {
        return if n == 0 { TOKEN_MIN } else { clamp_token(n) };
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.trunc() != 0.0 => {
            clamp_token(f.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
        }
        _ => TOKEN_MIN,
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Default base fill drawn under every composite.
    pub const fn base_fill() -> Self {
        Self::new(0x0a, 0x0f, 0x22, 0xff)
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
