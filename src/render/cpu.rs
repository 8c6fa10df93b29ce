use crate::assets::decode::{PreparedImage, unpremultiply_rgba8_in_place};
use crate::foundation::core::{Affine, Rect, Rgba8};
use crate::foundation::error::{RascalsError, RascalsResult};
use crate::render::surface::{FrameRGBA, Surface};

/// CPU raster surface backed by `vello_cpu`.
///
/// Draw calls are recorded into one render context and rasterized by [`CpuSurface::finish`].
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> RascalsResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| RascalsError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| RascalsError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(RascalsError::render("surface has zero area"));
        }
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
        })
    }

    /// Rasterize everything drawn so far into straight-alpha RGBA8.
    pub fn finish(&mut self) -> FrameRGBA {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        let mut data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data,
        }
    }
}

impl Surface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn clear(&mut self) {
        self.ctx.reset();
    }

    fn fill(&mut self, color: Rgba8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
    }

    fn draw_image(&mut self, image: &PreparedImage, dest: Rect, transform: Affine) {
        if image.width == 0 || image.height == 0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let local = transform
            * Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);

        self.ctx.set_transform(affine_to_cpu(local));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(image.pixmap.clone()),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        });
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
