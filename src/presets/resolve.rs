use std::collections::BTreeMap;

use crate::composition::format::FormatKey;
use crate::composition::layers::{BODY_LAYER, is_drawable};
use crate::presets::table::{PresetOverride, PresetTable, ResolvedPreset, merge};

/// Resolve the character placement for one token/format/background combination.
///
/// Precedence, lowest first:
/// 1. built-in format baseline
/// 2. `defaults`
/// 3. `formatDefaults[format]`
/// 4. `bodyOverrides[BODY]`
/// 5. `bodyOverridesByFormat["format/BODY"]`
///
/// With a custom background, three more layers follow: `customFormatDefaults[format]`,
/// `customBackgrounds["format/*"]`, then `customBackgrounds["format/file"]`. Scale-locked
/// formats only take offsets from those three.
pub fn resolve(
    table: &PresetTable,
    values: &BTreeMap<String, String>,
    format: FormatKey,
    custom_file: Option<&str>,
) -> ResolvedPreset {
    let spec = format.spec();
    let fmt = format.as_str();

    let body = values
        .get(BODY_LAYER)
        .map(String::as_str)
        .filter(|v| is_drawable(Some(*v)));
    let body_global = body.and_then(|b| table.body_overrides.get(b));
    let body_by_format = body.and_then(|b| table.body_overrides_by_format.get(&format!("{fmt}/{b}")));

    let mut chain: Vec<PresetOverride> = vec![
        spec.baseline,
        table.defaults,
        table.format_defaults.get(fmt).copied().unwrap_or_default(),
    ];
    chain.extend(body_global.copied());
    chain.extend(body_by_format.copied());

    if let Some(file) = custom_file {
        let custom = [
            table.custom_format_defaults.get(fmt),
            table.custom_backgrounds.get(&format!("{fmt}/*")),
            table.custom_backgrounds.get(&format!("{fmt}/{file}")),
        ]
        .into_iter()
        .flatten()
        .fold(PresetOverride::default(), |acc, o| acc.then(o));

        chain.push(if spec.scale_locked {
            custom.without_scale()
        } else {
            custom
        });
    }

    merge(chain.iter())
}

#[cfg(test)]
#[path = "../../tests/unit/presets/resolve.rs"]
mod tests;
