//! Render-ready image structures and their HTML form.
//!
//! An [`ImageRender`] is what the projector hands to a theme layer: the
//! descriptor plus the cache dependencies it was built from. `to_html`
//! turns it into markup using the style registry:
//!
//! - **Fixed** style: `<img>` pointing at the derivative, with the derivative's
//!   dimensions when the source size is known.
//! - **Responsive** style: `<picture>` with one `<source>` listing every
//!   breakpoint style as a width-described `srcset`, and a fallback `<img>`.
//! - Unknown responsive id: a plain `<img>` of the original file.

use super::styles::{ImageStyleRegistry, ResponsiveStyle};
use crate::projection::CacheTags;
use maud::{Markup, html};

/// How the descriptor's style name is to be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleMode {
    /// A fixed image style name; empty means the original file.
    Fixed(String),
    /// A responsive image style id.
    Responsive(String),
}

/// Everything a theme needs to print one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub uri: String,
    pub alt: String,
    pub title: String,
    pub style_mode: StyleMode,
}

impl ImageDescriptor {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

/// An image descriptor plus its cache dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRender {
    pub descriptor: ImageDescriptor,
    pub cache: CacheTags,
}

impl ImageRender {
    pub fn to_html(&self, styles: &dyn ImageStyleRegistry) -> Markup {
        let d = &self.descriptor;
        match &d.style_mode {
            StyleMode::Fixed(name) => render_fixed(d, name, styles),
            StyleMode::Responsive(id) => match styles.responsive_style(id) {
                Some(style) => render_responsive(d, &style, styles),
                None => render_img(d, &styles.file_url(&d.uri), d.dimensions()),
            },
        }
    }
}

fn render_fixed(d: &ImageDescriptor, name: &str, styles: &dyn ImageStyleRegistry) -> Markup {
    if !styles.is_fixed_style(name) {
        return render_img(d, &styles.file_url(&d.uri), d.dimensions());
    }
    let dims = d
        .dimensions()
        .and_then(|dims| styles.transform_dimensions(name, dims));
    render_img(d, &styles.derivative_url(name, &d.uri), dims)
}

fn render_responsive(
    d: &ImageDescriptor,
    style: &ResponsiveStyle,
    styles: &dyn ImageStyleRegistry,
) -> Markup {
    let source = d.dimensions();
    let srcset = style
        .candidates
        .iter()
        .filter_map(|c| {
            c.descriptor_width(source)
                .map(|w| format!("{} {}w", styles.derivative_url(&c.style, &d.uri), w))
        })
        .collect::<Vec<_>>()
        .join(", ");

    let fallback_dims = source.and_then(|dims| styles.transform_dimensions(&style.fallback, dims));
    let fallback_src = styles.derivative_url(&style.fallback, &d.uri);

    html! {
        picture {
            @if !srcset.is_empty() {
                source srcset=(srcset) sizes=(style.sizes);
            }
            (render_img(d, &fallback_src, fallback_dims))
        }
    }
}

fn render_img(d: &ImageDescriptor, src: &str, dims: Option<(u32, u32)>) -> Markup {
    let title = (!d.title.is_empty()).then_some(d.title.as_str());
    html! {
        img src=(src)
            alt=(d.alt)
            title=[title]
            width=[dims.map(|(w, _)| w)]
            height=[dims.map(|(_, h)| h)]
            loading="lazy";
    }
}
