use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output size tier for the pro model's `imageConfig.imageSize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
            Resolution::FourK => "4K",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1k" => Ok(Resolution::OneK),
            "2k" => Ok(Resolution::TwoK),
            "4k" => Ok(Resolution::FourK),
            other => Err(format!("unsupported resolution '{other}' (expected 1K, 2K or 4K)")),
        }
    }
}

pub const ASPECT_RATIOS: &[&str] = &[
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio(&'static str);

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio(DEFAULT_ASPECT_RATIO)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let keyword = match normalized.as_str() {
            "square" => Some("1:1"),
            "portrait" | "tall" => Some("9:16"),
            "landscape" | "wide" => Some("16:9"),
            _ => None,
        };
        let wanted = keyword.unwrap_or(normalized.as_str());
        ASPECT_RATIOS
            .iter()
            .find(|candidate| **candidate == wanted)
            .map(|candidate| AspectRatio(*candidate))
            .ok_or_else(|| {
                format!(
                    "unsupported aspect ratio '{}' (expected one of {})",
                    raw.trim(),
                    ASPECT_RATIOS.join(", ")
                )
            })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.0.to_string()
    }
}
