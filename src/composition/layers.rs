/// Trait value meaning "this layer is empty".
pub const NONE_VALUE: &str = "None";

/// Trait holding the token's own background art.
pub const BACKGROUND_LAYER: &str = "BACKGROUND";
/// Trait keying body presets and the overlay.
pub const BODY_LAYER: &str = "BODY";
/// Folder holding the per-body overlay art.
pub const OVERLAY_FOLDER: &str = "GMCUPS";

/// One trait category and the asset folder its files live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerDef {
    pub key: &'static str,
    pub folder: &'static str,
}

/// Every trait layer in stacking order, background first.
pub const LAYER_ORDER: [LayerDef; 7] = [
    LayerDef {
        key: "BACKGROUND",
        folder: "BACKGROUND",
    },
    LayerDef {
        key: "BODY",
        folder: "BODY",
    },
    LayerDef {
        key: "CLOTHING",
        folder: "CLOTHING",
    },
    LayerDef {
        key: "EXTRA",
        folder: "EXTRA",
    },
    LayerDef {
        key: "HEADSTUFF",
        folder: "HEADSTUFF",
    },
    LayerDef {
        key: "MOUTHS",
        folder: "MOUTHS",
    },
    LayerDef {
        key: "ONE OF ONE",
        folder: "ONE OF ONE",
    },
];

/// Layers drawn inside the character transform, bottom to top.
pub fn character_layers() -> impl Iterator<Item = &'static LayerDef> {
    LAYER_ORDER.iter().filter(|l| l.key != BACKGROUND_LAYER)
}

/// Whether a trait value should produce a draw.
pub fn is_drawable(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if !v.is_empty() && v != NONE_VALUE)
}

/// File stem for a trait value.
pub fn value_to_file(value: &str) -> &str {
    value.trim()
}

/// Location of one trait layer image below `layers_base`.
pub fn layer_location(layers_base: &str, folder: &str, value: &str) -> String {
    format!(
        "{}/{folder}/{}.png",
        layers_base.trim_end_matches('/'),
        value_to_file(value)
    )
}

#[cfg(test)]
#[path = "../../tests/unit/composition/layers.rs"]
mod tests;
