use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, Rect, Rgba8};

/// Raster output of one composite: straight-alpha RGBA8, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Drawing target of fixed pixel dimensions.
///
/// Draw calls are applied in order; later calls paint over earlier ones.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Cover the whole surface with `color`.
    fn fill(&mut self, color: Rgba8);

    /// Paint `image` stretched into `dest`, with `dest` expressed in the space mapped to surface
    /// pixels by `transform`.
    fn draw_image(&mut self, image: &PreparedImage, dest: Rect, transform: Affine);
}

/// One call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear,
    Fill(Rgba8),
    Image {
        location: String,
        dest: Rect,
        transform: Affine,
    },
}

/// Surface that only records the calls made against it.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Locations of the drawn images, in draw order.
    pub fn drawn_locations(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { location, .. } => Some(location.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill(&mut self, color: Rgba8) {
        self.commands.push(DrawCommand::Fill(color));
    }

    fn draw_image(&mut self, image: &PreparedImage, dest: Rect, transform: Affine) {
        self.commands.push(DrawCommand::Image {
            location: image.location.clone(),
            dest,
            transform,
        });
    }
}
