//! CLI output formatting for every inspection command.
//!
//! # Information-First Display
//!
//! Output leads with what a thing *is* (label, title, URL) and shows the
//! identifiers behind it as secondary context, either in parentheses or on
//! indented lines. Positional indices are zero-padded so lists line up.
//!
//! # Output Format
//!
//! ## Entity
//!
//! ```text
//! About us (node:1)
//!     Bundle: page
//!     body: We sell *sand*. And mugs.
//!     field_image: → 4
//! ```
//!
//! ## Menu
//!
//! ```text
//! main
//! 001 Home → /
//! 002 About us → /about-us
//!     001 Team → /about-us/team
//! Cache: config:system.menu.main
//! ```
//!
//! ## Cart
//!
//! ```text
//! 302 → /cart
//! 001 T-shirt (commerce_product:10)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability; [`print_lines`] writes them to stdout. Format functions are
//! pure: no I/O, no side effects.

use crate::commerce::Redirect;
use crate::imaging::{ImageOutput, ImageRender, StyleMode};
use crate::menu::{MenuRender, MenuRenderItem};
use crate::projection::CacheTags;
use crate::types::{Entity, EntityId};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Label plus type:id reference, the header line for any entity.
///
/// ```text
/// About us (node:1)
/// (node:7)              // unlabeled
/// ```
fn entity_header(entity: &Entity) -> String {
    if entity.label.is_empty() {
        format!("({})", entity.reference())
    } else {
        format!("{} ({})", entity.label, entity.reference())
    }
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Collapse whitespace runs (including newlines) to single spaces.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Paths and entities
// ============================================================================

/// Positional segments, 0-based to match `segment_at`.
pub fn format_segments(segments: &[String]) -> Vec<String> {
    if segments.is_empty() {
        return vec!["(no segments)".to_string()];
    }
    segments
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", i, s))
        .collect()
}

pub fn format_alias(alias: &str, canonical: &str, node: Option<&Entity>) -> Vec<String> {
    let mut lines = vec![format!("{} → {}", alias, canonical)];
    match node {
        Some(entity) => lines.push(format!("{}{}", indent(1), entity_header(entity))),
        None => lines.push(format!("{}(no node)", indent(1))),
    }
    lines
}

/// Entity header plus one line per field: first value (tags stripped,
/// truncated) or the referenced ids.
pub fn format_entity(entity: &Entity) -> Vec<String> {
    let mut lines = vec![entity_header(entity)];
    if let Some(bundle) = &entity.bundle {
        lines.push(format!("{}Bundle: {}", indent(1), bundle));
    }
    for (name, items) in &entity.fields {
        let targets = entity.targets(name);
        let shown = if let Some(value) = items.first().and_then(|i| i.value.as_deref()) {
            truncate_desc(&one_line(&strip_html_tags(value)), 60)
        } else if !targets.is_empty() {
            let ids: Vec<String> = targets.iter().map(ToString::to_string).collect();
            format!("→ {}", ids.join(", "))
        } else {
            "(empty)".to_string()
        };
        lines.push(format!("{}{}: {}", indent(1), name, shown));
    }
    lines
}

pub fn format_cache_tags(tags: &CacheTags) -> Vec<String> {
    tags.iter().map(str::to_string).collect()
}

pub fn format_ids(entity_type: &str, ids: &[EntityId]) -> Vec<String> {
    if ids.is_empty() {
        return vec!["(none)".to_string()];
    }
    ids.iter()
        .enumerate()
        .map(|(i, id)| format!("{} {}:{}", format_index(i + 1), entity_type, id))
        .collect()
}

// ============================================================================
// Images
// ============================================================================

fn format_render(render: &ImageRender) -> Vec<String> {
    let d = &render.descriptor;
    let size = match d.dimensions() {
        Some((w, h)) => format!("{}x{}", w, h),
        None => "unknown".to_string(),
    };
    let style = match &d.style_mode {
        StyleMode::Fixed(name) if name.is_empty() => "original".to_string(),
        StyleMode::Fixed(name) => format!("fixed {}", name),
        StyleMode::Responsive(id) => format!("responsive {}", id),
    };
    let mut lines = vec![d.uri.clone()];
    lines.push(format!("{}Size: {}", indent(1), size));
    lines.push(format!("{}Style: {}", indent(1), style));
    if !d.alt.is_empty() {
        lines.push(format!("{}Alt: {}", indent(1), d.alt));
    }
    if !d.title.is_empty() {
        lines.push(format!("{}Title: {}", indent(1), d.title));
    }
    let tags = format_cache_tags(&render.cache).join(", ");
    lines.push(format!("{}Cache: {}", indent(1), tags));
    lines
}

pub fn format_image_output(output: Option<&ImageOutput>) -> Vec<String> {
    match output {
        Some(ImageOutput::Render(render)) => format_render(render),
        Some(ImageOutput::Html(html)) => vec![html.clone()],
        Some(ImageOutput::Url(url)) => vec![url.clone()],
        None => vec!["(no output)".to_string()],
    }
}

// ============================================================================
// Menus
// ============================================================================

fn walk_menu(items: &[MenuRenderItem], depth: usize, lines: &mut Vec<String>) {
    for (i, item) in items.iter().enumerate() {
        lines.push(format!(
            "{}{} {} → {}",
            indent(depth),
            format_index(i + 1),
            item.title,
            item.url
        ));
        walk_menu(&item.below, depth + 1, lines);
    }
}

pub fn format_menu(menu: &MenuRender) -> Vec<String> {
    let mut lines = vec![menu.menu_name.clone()];
    walk_menu(&menu.items, 0, &mut lines);
    if menu.items.is_empty() {
        lines.push("(empty)".to_string());
    }
    lines.push(format!("Cache: {}", format_cache_tags(&menu.cache_tags).join(", ")));
    lines
}

// ============================================================================
// Cart
// ============================================================================

pub fn format_redirect(redirect: &Redirect) -> Vec<String> {
    vec![format!("{} → {}", redirect.status, redirect.location)]
}

pub fn format_products(products: &[Entity]) -> Vec<String> {
    if products.is_empty() {
        return vec!["(cart is empty)".to_string()];
    }
    products
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {}", format_index(i + 1), entity_header(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageDescriptor;
    use crate::types::FieldItem;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn strip_html_tags_removes_tags() {
        assert_eq!(strip_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn strip_html_tags_no_tags() {
        assert_eq!(strip_html_tags("plain"), "plain");
    }

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("short", 10), "short");
    }

    #[test]
    fn truncate_desc_long() {
        assert_eq!(truncate_desc("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn truncate_desc_respects_char_boundaries() {
        assert_eq!(truncate_desc("déjà vu", 3), "déj...");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
    }

    #[test]
    fn entity_header_with_and_without_label() {
        assert_eq!(
            entity_header(&Entity::new("node", 1).with_label("About us")),
            "About us (node:1)"
        );
        assert_eq!(entity_header(&Entity::new("node", 7)), "(node:7)");
    }

    // =========================================================================
    // Command output
    // =========================================================================

    #[test]
    fn segments_are_zero_based() {
        let segs = vec!["node".to_string(), "1".to_string()];
        assert_eq!(format_segments(&segs), vec!["0 node", "1 1"]);
        assert_eq!(format_segments(&[]), vec!["(no segments)"]);
    }

    #[test]
    fn entity_lists_fields() {
        let entity = Entity::new("node", 1)
            .with_bundle("page")
            .with_label("About us")
            .with_field("body", vec![FieldItem::formatted("<p>We sell\nsand</p>", "full_html")])
            .with_field("field_image", vec![FieldItem::reference(4), FieldItem::reference(5)])
            .with_field("field_empty", vec![]);
        assert_eq!(
            format_entity(&entity),
            vec![
                "About us (node:1)",
                "    Bundle: page",
                "    body: We sell sand",
                "    field_empty: (empty)",
                "    field_image: → 4, 5",
            ]
        );
    }

    #[test]
    fn alias_without_node() {
        assert_eq!(
            format_alias("/x", "/taxonomy/term/4", None),
            vec!["/x → /taxonomy/term/4", "    (no node)"]
        );
    }

    #[test]
    fn image_render_lines() {
        let render = ImageRender {
            descriptor: ImageDescriptor {
                width: Some(800),
                height: None,
                uri: "public://a.jpg".into(),
                alt: "Alt".into(),
                title: String::new(),
                style_mode: StyleMode::Responsive("hero".into()),
            },
            cache: CacheTags::from(vec!["file:4".to_string()]),
        };
        assert_eq!(
            format_image_output(Some(&ImageOutput::Render(render))),
            vec![
                "public://a.jpg",
                "    Size: unknown",
                "    Style: responsive hero",
                "    Alt: Alt",
                "    Cache: file:4",
            ]
        );
        assert_eq!(format_image_output(None), vec!["(no output)"]);
    }

    #[test]
    fn menu_tree_lines() {
        let menu = MenuRender {
            menu_name: "main".into(),
            items: vec![MenuRenderItem {
                title: "About".into(),
                url: "/about".into(),
                below: vec![MenuRenderItem {
                    title: "Team".into(),
                    url: "/about/team".into(),
                    below: vec![],
                }],
            }],
            cache_tags: CacheTags::from(vec!["config:system.menu.main".to_string()]),
        };
        assert_eq!(
            format_menu(&menu),
            vec![
                "main",
                "001 About → /about",
                "    001 Team → /about/team",
                "Cache: config:system.menu.main",
            ]
        );
    }

    #[test]
    fn redirect_and_products() {
        assert_eq!(format_redirect(&Redirect::found("/cart")), vec!["302 → /cart"]);
        let products = vec![Entity::new("commerce_product", 10).with_label("T-shirt")];
        assert_eq!(
            format_products(&products),
            vec!["001 T-shirt (commerce_product:10)"]
        );
        assert_eq!(format_products(&[]), vec!["(cart is empty)"]);
    }

    #[test]
    fn ids_list() {
        assert_eq!(format_ids("node", &[EntityId(2)]), vec!["001 node:2"]);
        assert_eq!(format_ids("node", &[]), vec!["(none)"]);
    }
}
