//! File and image-field projection.
//!
//! ```text
//! ImageSource ──load──▶ file entity ──▶ Url fast path (style given)
//!                                   └─▶ probe ─▶ descriptor ─▶ Render | Html
//! ```

use super::backend::ImageValidator;
use super::render::{ImageDescriptor, ImageRender, StyleMode};
use super::styles::ImageStyleRegistry;
use crate::config::FieldsConfig;
use crate::projection::CacheTags;
use crate::store::EntityStore;
use crate::types::{Entity, EntityId, entity_type};
use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Field on a file entity holding its stream-wrapper URI.
pub const URI_FIELD: &str = "uri";

/// What a caller hands the projector: a file id or an already-loaded entity.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'e> {
    Id(EntityId),
    Entity(&'e Entity),
}

/// Requested output shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputType {
    Render,
    Html,
    Url,
    /// Any other name. Always produces no output.
    Other(String),
}

impl FromStr for OutputType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "render" | "render_array" => Self::Render,
            "html" => Self::Html,
            "url" => Self::Url,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => write!(f, "render"),
            Self::Html => write!(f, "html"),
            Self::Url => write!(f, "url"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Projector result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutput {
    Render(ImageRender),
    Html(String),
    Url(String),
}

/// Image projection over injected services.
pub struct ImageProjector<'a> {
    entities: &'a dyn EntityStore,
    validator: &'a dyn ImageValidator,
    styles: &'a dyn ImageStyleRegistry,
    fields: FieldsConfig,
}

impl<'a> ImageProjector<'a> {
    pub fn new(
        entities: &'a dyn EntityStore,
        validator: &'a dyn ImageValidator,
        styles: &'a dyn ImageStyleRegistry,
        fields: FieldsConfig,
    ) -> Self {
        Self {
            entities,
            validator,
            styles,
            fields,
        }
    }

    /// Project a file entity into the requested output.
    ///
    /// `None` when the source is not a file, the file has no URI, or the
    /// output type cannot be produced (`Url` without a style, unknown names).
    pub fn file_image(
        &self,
        source: ImageSource<'_>,
        image_style: Option<&str>,
        output: &OutputType,
        responsive: bool,
    ) -> Option<ImageOutput> {
        let file = self.load_file(source)?;
        let Some(uri) = file.first_value(URI_FIELD) else {
            debug!(file = %file.id, "file entity has no uri");
            return None;
        };

        if let (OutputType::Url, Some(style)) = (output, image_style) {
            return Some(ImageOutput::Url(self.styles.derivative_url(style, uri)));
        }

        let probe = self.validator.probe(uri);
        let (width, height) = match probe.dimensions() {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        };

        let style_name = image_style.unwrap_or_default().to_string();
        let style_mode = if self.styles.is_fixed_style(&style_name) || !responsive {
            StyleMode::Fixed(style_name)
        } else {
            StyleMode::Responsive(style_name)
        };

        let mut cache = CacheTags::new();
        cache.push(entity_type::FILE, &file.id);

        let render = ImageRender {
            descriptor: ImageDescriptor {
                width,
                height,
                uri: uri.to_string(),
                alt: file.first_value(&self.fields.image_alt).unwrap_or_default().to_string(),
                title: file
                    .first_value(&self.fields.image_title)
                    .unwrap_or_default()
                    .to_string(),
                style_mode,
            },
            cache,
        };

        match output {
            OutputType::Render => Some(ImageOutput::Render(render)),
            OutputType::Html => Some(ImageOutput::Html(
                render.to_html(self.styles).into_string(),
            )),
            OutputType::Url | OutputType::Other(_) => {
                warn!(output = %output, file = %file.id, "unrecognized image output type");
                None
            }
        }
    }

    /// Project the file referenced by the first item of `field_name`.
    pub fn entity_image(
        &self,
        entity: &Entity,
        field_name: &str,
        image_style: Option<&str>,
        output: &OutputType,
        responsive: bool,
    ) -> Option<ImageOutput> {
        let file_id = entity.first_target(field_name)?;
        self.file_image(ImageSource::Id(file_id), image_style, output, responsive)
    }

    fn load_file<'e>(&self, source: ImageSource<'e>) -> Option<Cow<'e, Entity>> {
        let file = match source {
            ImageSource::Id(id) => Cow::Owned(self.entities.load(entity_type::FILE, id)?),
            ImageSource::Entity(entity) => Cow::Borrowed(entity),
        };
        if !file.is_type(entity_type::FILE) {
            debug!(entity = %file.reference(), "image source is not a file");
            return None;
        }
        Some(file)
    }
}
