//! Assistant configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by whatever the user file specifies; everything is optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! [files]
//! public_base_url = "/sites/default/files"  # URL prefix for public:// files
//! public_root = "files"                     # Local directory backing public://
//!
//! [fields]
//! image_alt = "field_image_alt_text"        # Alt text field on file entities
//! image_title = "field_image_title_text"    # Title field on file entities
//!
//! [dates]
//! fallback = "%a, %m/%d/%Y - %H:%M"         # Used for unknown profile names
//!
//! [dates.formats]
//! short = "%m/%d/%Y - %H:%M"
//! medium = "%a, %m/%d/%Y - %H:%M"
//! long = "%A, %B %-d, %Y - %H:%M"
//! html_date = "%Y-%m-%d"
//!
//! [text]
//! fallback_format = "plain_text"
//!
//! [text.formats]
//! plain_text = "plain"                      # Escaped, line breaks kept
//! basic_html = "markdown"                   # Markdown, raw HTML escaped
//! full_html = "html"                        # Trusted, passed through
//!
//! [image_styles.thumbnail]
//! width = 100
//! height = 100
//!
//! [responsive_styles.hero]
//! fallback = "large"
//! styles = ["medium", "large"]
//! sizes = "(max-width: 800px) 100vw, 80vw"
//!
//! [commerce]
//! cart_scope = "default"
//! cart_page = "/cart"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Assistant configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssistantConfig {
    /// File URL and disk locations.
    pub files: FilesConfig,
    /// Field names read from file entities.
    pub fields: FieldsConfig,
    /// Named date output profiles.
    pub dates: DatesConfig,
    /// Named text formats.
    pub text: TextConfig,
    /// Fixed image styles, keyed by machine name.
    pub image_styles: BTreeMap<String, ImageStyleConfig>,
    /// Responsive image styles, keyed by id.
    pub responsive_styles: BTreeMap<String, ResponsiveStyleConfig>,
    /// Cart settings.
    pub commerce: CommerceConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            files: FilesConfig::default(),
            fields: FieldsConfig::default(),
            dates: DatesConfig::default(),
            text: TextConfig::default(),
            image_styles: default_image_styles(),
            responsive_styles: default_responsive_styles(),
            commerce: CommerceConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Validate cross-references and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, style) in &self.image_styles {
            if style.width == Some(0) || style.height == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "image_styles.{name}: width and height must be non-zero"
                )));
            }
            if style.width.is_none() && style.height.is_none() {
                return Err(ConfigError::Validation(format!(
                    "image_styles.{name}: at least one of width or height is required"
                )));
            }
        }
        for (id, style) in &self.responsive_styles {
            if style.styles.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "responsive_styles.{id}.styles must not be empty"
                )));
            }
            for name in style.styles.iter().chain(std::iter::once(&style.fallback)) {
                if !self.image_styles.contains_key(name) {
                    return Err(ConfigError::Validation(format!(
                        "responsive_styles.{id} references unknown image style '{name}'"
                    )));
                }
            }
        }
        let patterns = self
            .dates
            .formats
            .iter()
            .map(|(name, pattern)| (format!("dates.formats.{name}"), pattern))
            .chain(std::iter::once(("dates.fallback".to_string(), &self.dates.fallback)));
        for (key, pattern) in patterns {
            if !crate::dates::is_valid_pattern(pattern) {
                return Err(ConfigError::Validation(format!(
                    "{key}: '{pattern}' is not a valid date pattern"
                )));
            }
        }
        if !self.text.formats.contains_key(&self.text.fallback_format) {
            return Err(ConfigError::Validation(format!(
                "text.fallback_format '{}' is not a defined format",
                self.text.fallback_format
            )));
        }
        if self.commerce.cart_scope.is_empty() {
            return Err(ConfigError::Validation(
                "commerce.cart_scope must not be empty".into(),
            ));
        }
        if !self.commerce.cart_page.starts_with('/') {
            return Err(ConfigError::Validation(
                "commerce.cart_page must start with '/'".into(),
            ));
        }
        Ok(())
    }
}

/// Where public files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// URL prefix under which `public://` files are served.
    pub public_base_url: String,
    /// Local directory backing `public://`, used when probing dimensions.
    pub public_root: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            public_base_url: "/sites/default/files".to_string(),
            public_root: "files".to_string(),
        }
    }
}

/// Field names the image projector reads from file entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldsConfig {
    pub image_alt: String,
    pub image_title: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            image_alt: "field_image_alt_text".to_string(),
            image_title: "field_image_title_text".to_string(),
        }
    }
}

/// Named date output profiles (`chrono` strftime patterns).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatesConfig {
    /// Pattern used when a profile name is unknown.
    pub fallback: String,
    pub formats: BTreeMap<String, String>,
}

impl Default for DatesConfig {
    fn default() -> Self {
        let formats = [
            ("short", "%m/%d/%Y - %H:%M"),
            ("medium", "%a, %m/%d/%Y - %H:%M"),
            ("long", "%A, %B %-d, %Y - %H:%M"),
            ("html_date", "%Y-%m-%d"),
            ("html_time", "%H:%M:%S"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            fallback: "%a, %m/%d/%Y - %H:%M".to_string(),
            formats,
        }
    }
}

/// How a text format treats stored markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormatKind {
    /// Escape everything; line breaks become `<br>` inside paragraphs.
    Plain,
    /// Markdown rendering with raw HTML escaped.
    Markdown,
    /// Trusted markup, passed through unchanged.
    Html,
}

/// Named text formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Format applied when markup has no format or an unknown one.
    pub fallback_format: String,
    pub formats: BTreeMap<String, TextFormatKind>,
}

impl Default for TextConfig {
    fn default() -> Self {
        let formats = [
            ("plain_text", TextFormatKind::Plain),
            ("basic_html", TextFormatKind::Markdown),
            ("restricted_html", TextFormatKind::Markdown),
            ("full_html", TextFormatKind::Html),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            fallback_format: "plain_text".to_string(),
            formats,
        }
    }
}

/// A fixed image style: scale to fit within `width` x `height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageStyleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Allow the derivative to be larger than the source.
    #[serde(default)]
    pub upscale: bool,
}

/// A responsive style: several fixed styles offered as `srcset` candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponsiveStyleConfig {
    /// Style used for the fallback `<img src>`.
    pub fallback: String,
    /// Fixed styles offered as `srcset` candidates, smallest first.
    pub styles: Vec<String>,
    /// Value of the `sizes` attribute.
    #[serde(default = "default_sizes")]
    pub sizes: String,
}

fn default_sizes() -> String {
    "100vw".to_string()
}

fn default_image_styles() -> BTreeMap<String, ImageStyleConfig> {
    [
        ("thumbnail", Some(100), Some(100)),
        ("medium", Some(220), Some(220)),
        ("large", Some(480), Some(480)),
        ("wide", Some(1090), None),
    ]
    .into_iter()
    .map(|(name, width, height)| {
        (
            name.to_string(),
            ImageStyleConfig {
                width,
                height,
                upscale: false,
            },
        )
    })
    .collect()
}

fn default_responsive_styles() -> BTreeMap<String, ResponsiveStyleConfig> {
    let mut styles = BTreeMap::new();
    styles.insert(
        "hero".to_string(),
        ResponsiveStyleConfig {
            fallback: "large".to_string(),
            styles: vec!["medium".into(), "large".into(), "wide".into()],
            sizes: "(max-width: 800px) 100vw, 80vw".to_string(),
        },
    );
    styles
}

/// Cart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommerceConfig {
    /// Cart partition used for add-to-cart.
    pub cart_scope: String,
    /// Path the visitor is redirected to after adding to cart.
    pub cart_page: String,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            cart_scope: "default".to_string(),
            cart_page: "/cart".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AssistantConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AssistantConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AssistantConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` path, on top of stock defaults.
pub fn load_config(path: &Path) -> Result<AssistantConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Site Assistant Configuration
# ============================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[files]
# URL prefix under which public:// files are served.
public_base_url = "/sites/default/files"
# Local directory backing public://, used to read image dimensions.
public_root = "files"

# ---------------------------------------------------------------------------
# Field names on file entities
# ---------------------------------------------------------------------------
[fields]
image_alt = "field_image_alt_text"
image_title = "field_image_title_text"

# ---------------------------------------------------------------------------
# Date output profiles (strftime patterns, rendered in UTC)
# ---------------------------------------------------------------------------
[dates]
# Used when a profile name is unknown.
fallback = "%a, %m/%d/%Y - %H:%M"

[dates.formats]
short = "%m/%d/%Y - %H:%M"
medium = "%a, %m/%d/%Y - %H:%M"
long = "%A, %B %-d, %Y - %H:%M"
html_date = "%Y-%m-%d"
html_time = "%H:%M:%S"

# ---------------------------------------------------------------------------
# Text formats: plain | markdown | html
# ---------------------------------------------------------------------------
[text]
fallback_format = "plain_text"

[text.formats]
plain_text = "plain"
basic_html = "markdown"
restricted_html = "markdown"
full_html = "html"

# ---------------------------------------------------------------------------
# Fixed image styles (scale to fit; omit width or height to scale freely)
# ---------------------------------------------------------------------------
[image_styles.thumbnail]
width = 100
height = 100

[image_styles.medium]
width = 220
height = 220

[image_styles.large]
width = 480
height = 480

[image_styles.wide]
width = 1090

# ---------------------------------------------------------------------------
# Responsive image styles
# ---------------------------------------------------------------------------
[responsive_styles.hero]
fallback = "large"
styles = ["medium", "large", "wide"]
sizes = "(max-width: 800px) 100vw, 80vw"

# ---------------------------------------------------------------------------
# Cart
# ---------------------------------------------------------------------------
[commerce]
cart_scope = "default"
cart_page = "/cart"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_styles() {
        let config = AssistantConfig::default();
        assert_eq!(config.image_styles["thumbnail"].width, Some(100));
        assert_eq!(config.image_styles["wide"].height, None);
        assert_eq!(config.responsive_styles["hero"].fallback, "large");
    }

    #[test]
    fn default_config_has_commerce_settings() {
        let config = AssistantConfig::default();
        assert_eq!(config.commerce.cart_scope, "default");
        assert_eq!(config.commerce.cart_page, "/cart");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[commerce]
cart_page = "/basket"
"##;
        let config: AssistantConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.commerce.cart_page, "/basket");
        assert_eq!(config.commerce.cart_scope, "default");
        assert_eq!(config.fields.image_alt, "field_image_alt_text");
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(AssistantConfig::default().validate().is_ok());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.files.public_base_url, "/sites/default/files");
    }

    #[test]
    fn load_config_merges_styles_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r##"
[image_styles.banner]
width = 1600
height = 400
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.image_styles["banner"].width, Some(1600));
        // Stock styles survive the merge
        assert!(config.image_styles.contains_key("thumbnail"));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r##"
[commerce]
cart_page = "cart"
"##,
        )
        .unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = r##"
[commerce]
cart_pgae = "/cart"
"##;
        let result: Result<AssistantConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[test]
    fn validate_zero_width_style() {
        let mut config = AssistantConfig::default();
        config.image_styles.insert(
            "broken".into(),
            ImageStyleConfig {
                width: Some(0),
                height: None,
                upscale: false,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_style_without_dimensions() {
        let mut config = AssistantConfig::default();
        config.image_styles.insert(
            "empty".into(),
            ImageStyleConfig {
                width: None,
                height: None,
                upscale: false,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_responsive_unknown_style() {
        let mut config = AssistantConfig::default();
        config.responsive_styles.insert(
            "cards".into(),
            ResponsiveStyleConfig {
                fallback: "medium".into(),
                styles: vec!["nonexistent".into()],
                sizes: default_sizes(),
            },
        );
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("nonexistent"));
    }

    #[test]
    fn validate_bad_date_pattern() {
        let mut config = AssistantConfig::default();
        config.dates.formats.insert("odd".into(), "%Q".into());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dates.formats.odd"));
    }

    #[test]
    fn validate_bad_date_fallback() {
        let mut config = AssistantConfig::default();
        config.dates.fallback = "%Q %Y".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dates.fallback"));
    }

    #[test]
    fn validate_unknown_text_fallback() {
        let mut config = AssistantConfig::default();
        config.text.fallback_format = "markdown_extra".into();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge / stock tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str("[x.y]\na = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[x.y]\nb = 5").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["x"]["y"]["a"].as_integer(), Some(1));
        assert_eq!(merged["x"]["y"]["b"].as_integer(), Some(5));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: AssistantConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = AssistantConfig::default();
        assert_eq!(parsed.image_styles, defaults.image_styles);
        assert_eq!(parsed.responsive_styles, defaults.responsive_styles);
        assert_eq!(parsed.dates.formats, defaults.dates.formats);
        assert_eq!(parsed.text.formats, defaults.text.formats);
        assert_eq!(parsed.commerce.cart_page, defaults.commerce.cart_page);
    }

    #[test]
    fn stock_defaults_value_is_table() {
        let value = stock_defaults_value().unwrap();
        assert!(value.is_table());
        assert!(value.get("image_styles").is_some());
    }
}
