//! Rich text filtering.
//!
//! Stored rich text is never emitted raw: it goes through a named text format
//! first. [`MarkupFilter`] is the configured implementation:
//!
//! | Kind | Behavior |
//! |---|---|
//! | `plain` | HTML-escaped; blank lines split paragraphs, single newlines become `<br>` |
//! | `markdown` | `pulldown-cmark` rendering; raw HTML in the source is escaped |
//! | `html` | trusted, returned unchanged |
//!
//! Unknown format names fall back to the configured fallback format.

use crate::config::{TextConfig, TextFormatKind};
use maud::{Markup, html};
use pulldown_cmark::{Event, Parser, html as md_html};
use std::collections::BTreeMap;
use tracing::debug;

/// Text format service.
pub trait TextFilter {
    /// Filter stored markup through the named format.
    fn filter(&self, markup: &str, format: &str) -> String;

    /// Format used when stored markup carries none.
    fn fallback_format(&self) -> &str;
}

/// [`TextFilter`] over the formats named in [`TextConfig`].
#[derive(Debug, Clone)]
pub struct MarkupFilter {
    formats: BTreeMap<String, TextFormatKind>,
    fallback: String,
}

impl MarkupFilter {
    pub fn new(config: &TextConfig) -> Self {
        Self {
            formats: config.formats.clone(),
            fallback: config.fallback_format.clone(),
        }
    }

    fn kind(&self, format: &str) -> TextFormatKind {
        match self.formats.get(format) {
            Some(kind) => *kind,
            None => {
                debug!(format, fallback = %self.fallback, "unknown text format");
                self.formats
                    .get(&self.fallback)
                    .copied()
                    .unwrap_or(TextFormatKind::Plain)
            }
        }
    }
}

impl Default for MarkupFilter {
    fn default() -> Self {
        Self::new(&TextConfig::default())
    }
}

impl TextFilter for MarkupFilter {
    fn filter(&self, markup: &str, format: &str) -> String {
        match self.kind(format) {
            TextFormatKind::Plain => render_plain(markup).into_string(),
            TextFormatKind::Markdown => render_markdown(markup),
            TextFormatKind::Html => markup.to_string(),
        }
    }

    fn fallback_format(&self) -> &str {
        &self.fallback
    }
}

/// Escape text and keep its paragraph/line structure.
fn render_plain(text: &str) -> Markup {
    let normalized = text.replace("\r\n", "\n");
    let paragraphs: Vec<&str> = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    html! {
        @for paragraph in &paragraphs {
            p {
                @for (idx, line) in paragraph.lines().enumerate() {
                    @if idx > 0 { br; }
                    (line)
                }
            }
        }
    }
}

/// Markdown to HTML, with inline and block HTML demoted to text.
fn render_markdown(source: &str) -> String {
    let parser = Parser::new(source).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}
