use crate::composition::format::FormatKey;

/// Where the backdrop behind the character comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BackgroundMode {
    /// The token's own `BACKGROUND` trait.
    #[default]
    #[serde(rename = "nft")]
    FromToken,
    /// A file from the format's custom background catalog.
    #[serde(rename = "custom")]
    Custom,
    /// Base fill only.
    #[serde(rename = "none")]
    Disabled,
}

impl BackgroundMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundMode::FromToken => "nft",
            BackgroundMode::Custom => "custom",
            BackgroundMode::Disabled => "none",
        }
    }
}

/// Per-render choices that are not part of the token itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scene {
    pub format: FormatKey,
    pub background: BackgroundMode,
    /// Selected catalog file for `format`; `None` means the format default.
    pub custom_file: Option<String>,
    /// Draw the per-body overlay on top of the character.
    pub overlay: bool,
}

impl Scene {
    /// Custom background file in effect, if the scene uses one.
    pub fn custom_background(&self) -> Option<&str> {
        match self.background {
            BackgroundMode::Custom => Some(
                self.custom_file
                    .as_deref()
                    .filter(|f| !f.trim().is_empty())
                    .unwrap_or(self.format.spec().default_background),
            ),
            BackgroundMode::FromToken | BackgroundMode::Disabled => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/scene.rs"]
mod tests;
