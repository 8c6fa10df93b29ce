use std::sync::Arc;

use crate::assets::cache::ImageCache;
use crate::assets::source::AssetError;
use crate::composition::layers::{
    BACKGROUND_LAYER, BODY_LAYER, OVERLAY_FOLDER, character_layers, is_drawable, layer_location,
};
use crate::composition::scene::{BackgroundMode, Scene};
use crate::foundation::core::{Affine, Rect, Rgba8};
use crate::foundation::error::{RascalsError, RascalsResult};
use crate::metadata::resolver::TraitRecord;
use crate::presets::resolve::resolve;
use crate::presets::table::{PresetTable, ResolvedPreset};
use crate::render::surface::Surface;

/// Side length of the square canvas trait art is authored on.
pub const AUTHORING_SIZE: f64 = 2048.0;

/// Asset layout and fill color used for every composite.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositorSettings {
    pub layers_base: String,
    pub custom_backgrounds_base: String,
    pub base_fill: Rgba8,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            layers_base: "assets/layers".to_string(),
            custom_backgrounds_base: "assets/costumbackgrounds".to_string(),
            base_fill: Rgba8::base_fill(),
        }
    }
}

/// How a planned image is placed on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Scaled to cover the whole surface, centered; sized from the image itself.
    Cover,
    /// Stretched into `dest` under `transform`.
    Fixed { dest: Rect, transform: Affine },
}

/// One image the composite will draw, in draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedDraw {
    pub location: String,
    pub placement: Placement,
}

/// What a composite actually did.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeReport {
    /// Locations drawn, in draw order.
    pub drawn: Vec<String>,
    /// Locations that failed to load and were left out.
    pub skipped: Vec<(String, AssetError)>,
    pub preset: ResolvedPreset,
}

/// `max(W, H) / 2048`: the factor mapping the authoring canvas onto a surface.
pub fn cover_scale(width: u32, height: u32) -> f64 {
    f64::from(width.max(height)) / AUTHORING_SIZE
}

/// Character transform: authoring canvas bottom-center anchored at the surface bottom-center,
/// shifted by the preset offsets and scaled by `cover_scale × preset.scale`.
pub fn character_transform(width: u32, height: u32, preset: &ResolvedPreset) -> Affine {
    let scale = if preset.scale.is_finite() && preset.scale != 0.0 {
        preset.scale
    } else {
        1.0
    };
    Affine::translate((
        f64::from(width) / 2.0 + preset.offset_x,
        f64::from(height) + preset.offset_y,
    )) * Affine::scale(cover_scale(width, height) * scale)
        * Affine::translate((-AUTHORING_SIZE / 2.0, -AUTHORING_SIZE))
}

/// Destination covering `width × height` with an `iw × ih` image, centered.
pub fn cover_rect(width: u32, height: u32, iw: u32, ih: u32) -> Rect {
    let (w, h) = (f64::from(width), f64::from(height));
    let (iw, ih) = (f64::from(iw.max(1)), f64::from(ih.max(1)));
    let scale = (w / iw).max(h / ih);
    let (dw, dh) = (iw * scale, ih * scale);
    let (x, y) = ((w - dw) / 2.0, (h - dh) / 2.0);
    Rect::new(x, y, x + dw, y + dh)
}

/// Draws one token in one format onto a surface.
#[derive(Clone, Debug)]
pub struct Compositor {
    cache: Arc<ImageCache>,
    settings: CompositorSettings,
}

impl Compositor {
    pub fn new(cache: Arc<ImageCache>, settings: CompositorSettings) -> Self {
        Self { cache, settings }
    }

    /// Every image the composite will draw, bottom to top.
    pub fn plan(
        &self,
        scene: &Scene,
        record: &TraitRecord,
        preset: &ResolvedPreset,
        width: u32,
        height: u32,
    ) -> Vec<PlannedDraw> {
        let mut out = Vec::new();
        let layers_base = self.settings.layers_base.as_str();

        match scene.background {
            BackgroundMode::Disabled => {}
            BackgroundMode::Custom => {
                if let Some(file) = scene.custom_background() {
                    out.push(PlannedDraw {
                        location: format!(
                            "{}/{}/{file}",
                            self.settings.custom_backgrounds_base.trim_end_matches('/'),
                            scene.format.as_str()
                        ),
                        placement: Placement::Cover,
                    });
                }
            }
            BackgroundMode::FromToken => {
                if let Some(value) = record.get(BACKGROUND_LAYER).filter(|v| is_drawable(Some(*v))) {
                    let side = AUTHORING_SIZE * cover_scale(width, height);
                    let x = (f64::from(width) - side) / 2.0;
                    let y = (f64::from(height) - side) / 2.0;
                    out.push(PlannedDraw {
                        location: layer_location(layers_base, BACKGROUND_LAYER, value),
                        placement: Placement::Fixed {
                            dest: Rect::new(x, y, x + side, y + side),
                            transform: Affine::IDENTITY,
                        },
                    });
                }
            }
        }

        let transform = character_transform(width, height, preset);
        let authoring = Rect::new(0.0, 0.0, AUTHORING_SIZE, AUTHORING_SIZE);
        for layer in character_layers() {
            let Some(value) = record.get(layer.key).filter(|v| is_drawable(Some(*v))) else {
                continue;
            };
            out.push(PlannedDraw {
                location: layer_location(layers_base, layer.folder, value),
                placement: Placement::Fixed {
                    dest: authoring,
                    transform,
                },
            });
        }

        if scene.overlay
            && let Some(body) = record.get(BODY_LAYER).filter(|v| is_drawable(Some(*v)))
        {
            out.push(PlannedDraw {
                location: layer_location(layers_base, OVERLAY_FOLDER, body),
                placement: Placement::Fixed {
                    dest: authoring,
                    transform,
                },
            });
        }
        out
    }

    /// Composite `record` onto `surface` using the placement resolved from `presets`.
    ///
    /// All images are requested at once through the cache. A failed image is logged and left
    /// out; the rest of the composite still draws.
    #[tracing::instrument(skip(self, surface, presets, record), fields(token = record.id, format = %scene.format))]
    pub async fn render(
        &self,
        surface: &mut dyn Surface,
        scene: &Scene,
        presets: &PresetTable,
        record: &TraitRecord,
    ) -> RascalsResult<CompositeReport> {
        let spec = scene.format.spec();
        let (width, height) = (surface.width(), surface.height());
        if (width, height) != (spec.width, spec.height) {
            return Err(RascalsError::validation(format!(
                "surface is {width}x{height}, format '{}' needs {}x{}",
                scene.format, spec.width, spec.height
            )));
        }

        let preset = resolve(presets, &record.values, scene.format, scene.custom_background());
        let plan = self.plan(scene, record, &preset, width, height);
        let loads =
            futures::future::join_all(plan.iter().map(|p| self.cache.load(&p.location))).await;

        surface.clear();
        surface.fill(self.settings.base_fill);

        let mut report = CompositeReport {
            drawn: Vec::with_capacity(plan.len()),
            skipped: Vec::new(),
            preset,
        };
        for (draw, loaded) in plan.into_iter().zip(loads) {
            let image = match loaded {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(location = %draw.location, error = %e, "image missing; layer skipped");
                    report.skipped.push((draw.location, e));
                    continue;
                }
            };
            let (dest, transform) = match draw.placement {
                Placement::Cover => (
                    cover_rect(width, height, image.width, image.height),
                    Affine::IDENTITY,
                ),
                Placement::Fixed { dest, transform } => (dest, transform),
            };
            surface.draw_image(&image, dest, transform);
            report.drawn.push(draw.location);
        }

        tracing::debug!(
            drawn = report.drawn.len(),
            skipped = report.skipped.len(),
            "composite finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
