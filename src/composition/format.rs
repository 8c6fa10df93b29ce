use std::fmt;
use std::str::FromStr;

use crate::foundation::error::RascalsError;
use crate::presets::table::PresetOverride;

/// Output format identifier.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FormatKey {
    /// 1080×1080 square post.
    #[default]
    Square,
    /// 1080×2340 phone wallpaper.
    #[serde(rename = "phonesaver")]
    PhoneSaver,
    /// 1600×900 wide banner.
    Raid,
}

impl FormatKey {
    /// Every format, in tab order.
    pub const ALL: [FormatKey; 3] = [FormatKey::Square, FormatKey::PhoneSaver, FormatKey::Raid];

    /// Key as used in URLs, preset tables and asset folders.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatKey::Square => "square",
            FormatKey::PhoneSaver => "phonesaver",
            FormatKey::Raid => "raid",
        }
    }

    /// Constant description of this format.
    pub fn spec(self) -> &'static FormatSpec {
        match self {
            FormatKey::Square => &SQUARE,
            FormatKey::PhoneSaver => &PHONE_SAVER,
            FormatKey::Raid => &RAID,
        }
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatKey {
    type Err = RascalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(FormatKey::Square),
            "phonesaver" => Ok(FormatKey::PhoneSaver),
            "raid" => Ok(FormatKey::Raid),
            other => Err(RascalsError::validation(format!(
                "unknown format '{other}'"
            ))),
        }
    }
}

/// A selectable custom background for one format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustomBackground {
    /// Human-readable label shown next to the background stepper.
    pub label: &'static str,
    /// File name inside the format's custom background folder.
    pub file: &'static str,
}

/// Immutable output format description.
#[derive(Debug)]
pub struct FormatSpec {
    pub key: FormatKey,
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub default_background: &'static str,
    pub file_suffix: &'static str,
    /// Whether custom-background presets may change the character scale.
    pub scale_locked: bool,
    /// Hard-coded fallback used when the preset table has nothing for this format.
    pub baseline: PresetOverride,
    pub backgrounds: &'static [CustomBackground],
}

impl FormatSpec {
    /// Catalog entry for `file`, if it is one of this format's known backgrounds.
    pub fn background(&self, file: &str) -> Option<&'static CustomBackground> {
        self.backgrounds.iter().find(|bg| bg.file == file)
    }

    /// Index of `file` in the catalog.
    pub fn background_index(&self, file: &str) -> Option<usize> {
        self.backgrounds.iter().position(|bg| bg.file == file)
    }
}

static SQUARE: FormatSpec = FormatSpec {
    key: FormatKey::Square,
    name: "Square",
    width: 1080,
    height: 1080,
    default_background: "square1.png",
    file_suffix: "square",
    scale_locked: false,
    baseline: PresetOverride::full(0.85, 0.0, 0.0),
    backgrounds: &[
        CustomBackground {
            label: "Rascals on Apechain",
            file: "square1.png",
        },
        CustomBackground {
            label: "Apechain Rascals",
            file: "square2.png",
        },
        CustomBackground {
            label: "Want to play a game",
            file: "square3.png",
        },
        CustomBackground {
            label: "To the moon",
            file: "square4.png",
        },
    ],
};

static PHONE_SAVER: FormatSpec = FormatSpec {
    key: FormatKey::PhoneSaver,
    name: "Phone Saver",
    width: 1080,
    height: 2340,
    default_background: "phone1.png",
    file_suffix: "phonesaver",
    scale_locked: true,
    baseline: PresetOverride::full(0.50, 0.0, 0.0),
    backgrounds: &[
        CustomBackground {
            label: "Color Brown/White",
            file: "phone1.png",
        },
        CustomBackground {
            label: "Color Dark/Yellow",
            file: "phone2.png",
        },
        CustomBackground {
            label: "Color Dark/Orange",
            file: "phone3.png",
        },
        CustomBackground {
            label: "Color Blue/White",
            file: "phone4.png",
        },
    ],
};

static RAID: FormatSpec = FormatSpec {
    key: FormatKey::Raid,
    name: "Raid",
    width: 1600,
    height: 900,
    default_background: "raid1.png",
    file_suffix: "raid",
    scale_locked: false,
    baseline: PresetOverride::full(0.55, 0.0, 0.0),
    backgrounds: &[
        CustomBackground {
            label: "WELCOME TO THE APECHAIN",
            file: "raid1.png",
        },
        CustomBackground {
            label: "JOIN THE RASCALS",
            file: "raid2.png",
        },
        CustomBackground {
            label: "GET YOUR GRAILS NOW",
            file: "raid3.png",
        },
        CustomBackground {
            label: "YOU AINT SEEN NOTHING YET",
            file: "raid4.png",
        },
        CustomBackground {
            label: "BUY HOLD BELIEVE",
            file: "raid5.png",
        },
        CustomBackground {
            label: "UNITED AS ONE",
            file: "raid6.png",
        },
    ],
};

/// Output file name for a rendered token, e.g. `rascal_0042_square.png`.
pub fn output_filename(prefix: &str, token: u32, format: FormatKey) -> String {
    format!("{prefix}_{token:04}_{}.png", format.spec().file_suffix)
}

#[cfg(test)]
#[path = "../../tests/unit/composition/format.rs"]
mod tests;
