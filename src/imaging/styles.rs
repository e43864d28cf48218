//! Image style registry.
//!
//! A *fixed* style produces one derivative (scale to fit a box). A
//! *responsive* style groups several fixed styles into `srcset` candidates
//! and names one of them as the fallback `<img src>`.
//!
//! Derivative URLs follow the usual layout:
//!
//! ```text
//! public://photos/a.jpg  --style "large"-->  {public_base_url}/styles/large/public/photos/a.jpg
//! public://photos/a.jpg  (original)      -->  {public_base_url}/photos/a.jpg
//! ```
//!
//! The pseudo-style `_original` always resolves to the original file URL.

use super::calculations::{calculate_scaled_dimensions, srcset_width};
use crate::config::{AssistantConfig, ImageStyleConfig, ResponsiveStyleConfig};
use std::collections::BTreeMap;

/// Style name that resolves to the untouched original.
pub const ORIGINAL_STYLE: &str = "_original";

/// Registered image styles service.
pub trait ImageStyleRegistry {
    /// Whether `name` is a registered fixed style.
    fn is_fixed_style(&self, name: &str) -> bool;

    /// URL of the original file.
    fn file_url(&self, uri: &str) -> String;

    /// URL of the `name` derivative of the file at `uri`.
    fn derivative_url(&self, name: &str, uri: &str) -> String;

    /// Derivative dimensions of style `name` for a source of size `dims`.
    /// `None` for unknown styles.
    fn transform_dimensions(&self, name: &str, dims: (u32, u32)) -> Option<(u32, u32)>;

    /// The responsive style registered under `id`.
    fn responsive_style(&self, id: &str) -> Option<ResponsiveStyle>;
}

/// One `srcset` candidate of a responsive style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate {
    pub style: String,
    /// Width bound of the style, used when the source size is unknown.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub upscale: bool,
}

impl SrcsetCandidate {
    /// Width descriptor for this candidate, if one can be computed.
    pub fn descriptor_width(&self, source: Option<(u32, u32)>) -> Option<u32> {
        srcset_width(source, (self.width, self.height), self.upscale)
    }
}

/// Resolved responsive style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsiveStyle {
    pub id: String,
    pub fallback: String,
    pub sizes: String,
    pub candidates: Vec<SrcsetCandidate>,
}

/// Split a stream-wrapper URI into `(scheme, target)`.
///
/// `public://a/b.jpg` → `("public", "a/b.jpg")`. URIs without a scheme are
/// treated as `public`.
pub fn split_uri(uri: &str) -> (&str, &str) {
    match uri.split_once("://") {
        Some((scheme, target)) => (scheme, target.trim_start_matches('/')),
        None => ("public", uri.trim_start_matches('/')),
    }
}

/// [`ImageStyleRegistry`] backed by configured styles.
#[derive(Debug, Clone)]
pub struct ConfiguredStyles {
    base_url: String,
    styles: BTreeMap<String, ImageStyleConfig>,
    responsive: BTreeMap<String, ResponsiveStyleConfig>,
}

impl ConfiguredStyles {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            base_url: config.files.public_base_url.trim_end_matches('/').to_string(),
            styles: config.image_styles.clone(),
            responsive: config.responsive_styles.clone(),
        }
    }

    fn base_for(&self, scheme: &str) -> String {
        if scheme == "public" {
            self.base_url.clone()
        } else {
            format!("/system/files/{scheme}")
        }
    }
}

impl Default for ConfiguredStyles {
    fn default() -> Self {
        Self::new(&AssistantConfig::default())
    }
}

impl ImageStyleRegistry for ConfiguredStyles {
    fn is_fixed_style(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    fn file_url(&self, uri: &str) -> String {
        let (scheme, target) = split_uri(uri);
        format!("{}/{}", self.base_for(scheme), target)
    }

    fn derivative_url(&self, name: &str, uri: &str) -> String {
        if name.is_empty() || name == ORIGINAL_STYLE {
            return self.file_url(uri);
        }
        let (scheme, target) = split_uri(uri);
        format!(
            "{}/styles/{}/{}/{}",
            self.base_url, name, scheme, target
        )
    }

    fn transform_dimensions(&self, name: &str, dims: (u32, u32)) -> Option<(u32, u32)> {
        if name == ORIGINAL_STYLE {
            return Some(dims);
        }
        self.styles
            .get(name)
            .map(|s| calculate_scaled_dimensions(dims, (s.width, s.height), s.upscale))
    }

    fn responsive_style(&self, id: &str) -> Option<ResponsiveStyle> {
        let config = self.responsive.get(id)?;
        let candidates = config
            .styles
            .iter()
            .filter_map(|name| {
                self.styles.get(name).map(|s| SrcsetCandidate {
                    style: name.clone(),
                    width: s.width,
                    height: s.height,
                    upscale: s.upscale,
                })
            })
            .collect();
        Some(ResponsiveStyle {
            id: id.to_string(),
            fallback: config.fallback.clone(),
            sizes: config.sizes.clone(),
            candidates,
        })
    }
}
