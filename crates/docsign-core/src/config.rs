//! Configuration for capture, placement and rendering
//!
//! Every value has a default, so an empty TOML document is a valid
//! configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared_types::Size;
use std::fs;
use std::path::Path;

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Signature pad settings
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Defaults for newly placed fields
    #[serde(default)]
    pub fields: FieldConfig,
    /// Page rendering settings
    #[serde(default)]
    pub render: RenderConfig,
}

impl SigningConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a colour is not `#rrggbb`
    ///
    /// # Example
    ///
    /// ```
    /// use docsign_core::config::SigningConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = SigningConfig::from_str(r#"
    ///     [capture]
    ///     device_pixel_ratio = 2.0
    /// "#)?;
    /// assert_eq!(config.capture.stroke_width, 2.0);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        parse_hex_color(&config.capture.stroke_color)
            .with_context(|| format!("Invalid stroke_color: {}", config.capture.stroke_color))?;
        Ok(config)
    }
}

/// Signature pad settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Pad width in CSS pixels
    #[serde(default = "default_pad_width")]
    pub css_width: f64,
    /// Pad height in CSS pixels
    #[serde(default = "default_pad_height")]
    pub css_height: f64,
    #[serde(default = "default_dpr")]
    pub device_pixel_ratio: f64,
    /// `#rrggbb`
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    /// Stroke width in CSS pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            css_width: default_pad_width(),
            css_height: default_pad_height(),
            device_pixel_ratio: default_dpr(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
        }
    }
}

/// Size given to new signature fields, in surface pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "default_field_width")]
    pub default_width: f64,
    #[serde(default = "default_field_height")]
    pub default_height: f64,
}

impl FieldConfig {
    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            default_width: default_field_width(),
            default_height: default_field_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Upper bound on CSS pixels per native unit when fitting a page to its container
    #[serde(default = "default_max_display_scale")]
    pub max_display_scale: f64,
    /// Surface pixels per native unit for rasterized exports
    #[serde(default = "default_export_scale")]
    pub export_scale: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_display_scale: default_max_display_scale(),
            export_scale: default_export_scale(),
        }
    }
}

fn default_pad_width() -> f64 {
    500.0
}

fn default_pad_height() -> f64 {
    192.0
}

fn default_dpr() -> f64 {
    1.0
}

fn default_stroke_color() -> String {
    "#1f2937".to_string()
}

fn default_stroke_width() -> f64 {
    2.0
}

fn default_field_width() -> f64 {
    150.0
}

fn default_field_height() -> f64 {
    50.0
}

fn default_max_display_scale() -> f64 {
    1.5
}

fn default_export_scale() -> f64 {
    2.0
}

/// Parse `#rrggbb` (leading `#` optional) into RGB bytes
pub fn parse_hex_color(s: &str) -> anyhow::Result<[u8; 3]> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        anyhow::bail!("expected six hex digits, got {:?}", s);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .with_context(|| format!("invalid hex digits in {:?}", s))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}
