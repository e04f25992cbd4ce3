//! Engine configuration.
//!
//! Everything here has a sensible default, so an embedder only needs to
//! override what differs on its platform. Configuration is plain data and
//! can be read from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading a [`StyleConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON text could not be deserialized.
    #[error("invalid style configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value the engine cannot work with.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// A font face the platform offers.
///
/// The engine never reads platform font files; it only needs to know which
/// faces exist to run the matching algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemFontFace {
    /// Family name.
    pub family: String,
    /// Weight, 1 to 1000.
    #[serde(default = "default_weight")]
    pub weight: u16,
    /// Whether the face is italic or oblique.
    #[serde(default)]
    pub italic: bool,
    /// Width as a percentage of normal.
    #[serde(default = "default_stretch")]
    pub stretch: f32,
}

const fn default_weight() -> u16 {
    400
}

const fn default_stretch() -> f32 {
    100.0
}

impl SystemFontFace {
    /// A regular, upright, normal-width face.
    #[must_use]
    pub fn regular(family: &str) -> Self {
        Self {
            family: family.to_string(),
            weight: default_weight(),
            italic: false,
            stretch: default_stretch(),
        }
    }
}

/// The viewport the engine computes styles against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: f32,
    /// Height in CSS pixels.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Size `medium` resolves to, in pixels.
    pub default_user_font_size: f32,
    /// Size `medium` resolves to when the family list is just `monospace`.
    pub default_monospace_font_size: f32,
    /// [§ 2.5 Absolute size keywords](https://www.w3.org/TR/css-fonts-4/#absolute-size-mapping)
    ///
    /// Scale factors for `xx-small` through `xxx-large`, relative to the
    /// default size.
    pub absolute_size_ratios: [f32; 8],
    /// Concrete family for each generic family keyword, keyed by the
    /// keyword as written in CSS (`serif`, `monospace`, ...).
    pub generic_families: BTreeMap<String, String>,
    /// Family appended to every font list as the last resort.
    pub default_font: String,
    /// Family appended after the default font for emoji coverage.
    pub emoji_font: String,
    /// Faces available from the platform.
    pub system_fonts: Vec<SystemFontFace>,
    /// Initial viewport.
    pub viewport: Viewport,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let generic_families = [
            ("serif", "Times New Roman"),
            ("sans-serif", "Arial"),
            ("monospace", "Courier New"),
            ("cursive", "Comic Sans MS"),
            ("fantasy", "Impact"),
            ("math", "STIX Two Math"),
            ("system-ui", "Arial"),
            ("ui-serif", "Times New Roman"),
            ("ui-sans-serif", "Arial"),
            ("ui-monospace", "Courier New"),
            ("ui-rounded", "Arial"),
        ]
        .into_iter()
        .map(|(generic, family)| (generic.to_string(), family.to_string()))
        .collect();

        let mut system_fonts = Vec::new();
        for family in ["Times New Roman", "Arial", "Courier New"] {
            system_fonts.push(SystemFontFace::regular(family));
            system_fonts.push(SystemFontFace {
                weight: 700,
                ..SystemFontFace::regular(family)
            });
            system_fonts.push(SystemFontFace {
                italic: true,
                ..SystemFontFace::regular(family)
            });
        }
        for family in ["Comic Sans MS", "Impact", "STIX Two Math", "Noto Color Emoji"] {
            system_fonts.push(SystemFontFace::regular(family));
        }

        Self {
            default_user_font_size: 16.0,
            default_monospace_font_size: 13.0,
            absolute_size_ratios: [3.0 / 5.0, 3.0 / 4.0, 8.0 / 9.0, 1.0, 6.0 / 5.0, 3.0 / 2.0, 2.0, 3.0],
            generic_families,
            default_font: "Times New Roman".to_string(),
            emoji_font: "Noto Color Emoji".to_string(),
            system_fonts,
            viewport: Viewport::default(),
        }
    }
}

impl StyleConfig {
    /// Read a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::InvalidValue`] when a size is not positive.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("expected a positive size, got {value}"),
                })
            }
        };
        positive("default_user_font_size", self.default_user_font_size)?;
        positive("default_monospace_font_size", self.default_monospace_font_size)?;
        positive("viewport.width", self.viewport.width)?;
        positive("viewport.height", self.viewport.height)?;
        if let Some(ratio) = self.absolute_size_ratios.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            return Err(ConfigError::InvalidValue {
                field: "absolute_size_ratios",
                reason: format!("ratio {ratio} is not positive"),
            });
        }
        if self.absolute_size_ratios.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ConfigError::InvalidValue {
                field: "absolute_size_ratios",
                reason: "ratios must not decrease".to_string(),
            });
        }
        Ok(())
    }

    /// Concrete family for a generic keyword such as `monospace`.
    #[must_use]
    pub fn generic_family(&self, generic: &str) -> Option<&str> {
        self.generic_families.get(generic).map(String::as_str)
    }
}
