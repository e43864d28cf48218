//! Read-side projections over the fixture site, wired the way the CLI does.

use image::RgbImage;
use site_assistant::config::{AssistantConfig, load_config};
use site_assistant::dates::ProfileDateFormatter;
use site_assistant::imaging::{
    ConfiguredStyles, ImageOutput, ImageProjector, LocalImageProbe, OutputType, StyleMode,
};
use site_assistant::memory::MemorySite;
use site_assistant::menu::{MenuProjector, Viewer};
use site_assistant::path::{PathResolver, RequestContext};
use site_assistant::projection::{CacheTags, EntityProjector, cache_tags};
use site_assistant::text::MarkupFilter;
use site_assistant::types::EntityId;
use std::path::Path;

fn open_site() -> MemorySite {
    MemorySite::open(&Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site.json")).unwrap()
}

// =========================================================================
// Paths and fields
// =========================================================================

#[test]
fn alias_resolves_to_node_and_projects_fields() {
    let site = open_site();
    let resolver = PathResolver::new(&site, &site);
    let node = resolver.resolve_alias("/about-us").unwrap();
    assert_eq!(node.label, "About us");

    let text = MarkupFilter::default();
    let dates = ProfileDateFormatter::default();
    let projector = EntityProjector::new(&site, &text, &dates);

    let body = projector.single_field_value(&node, "body", false);
    assert!(body.contains("<em>sand</em>"));
    assert!(body.contains("<p>And mugs.</p>"));

    let created = node.first_value("created").unwrap();
    assert_eq!(
        projector.format_date(created, None, "long").unwrap(),
        "Tuesday, March 5, 2024 - 14:30"
    );
    let event = node.first_value("field_event_date").unwrap();
    assert_eq!(
        projector
            .format_date(event, Some("%Y-%m-%dT%H:%M:%S"), "html_date")
            .unwrap(),
        "2024-03-05"
    );
}

#[test]
fn non_node_and_dangling_aliases_are_none() {
    let site = open_site();
    let resolver = PathResolver::new(&site, &site);
    assert!(resolver.resolve_alias("/tags/deserts").is_none());
    assert!(resolver.resolve_alias("/gone").is_none());
    assert!(resolver.resolve_alias("/never-registered").is_none());
}

#[test]
fn request_segments() {
    let site = open_site();
    let resolver = PathResolver::new(&site, &site);
    let request = RequestContext::new("/node/1", "/about-us/?ref=menu");
    assert_eq!(resolver.current_segment_at(&request, 1).as_deref(), Some("1"));
    assert_eq!(resolver.alias_segments(&request), vec!["about-us"]);
}

#[test]
fn term_listing_feeds_cache_tags() {
    let site = open_site();
    let text = MarkupFilter::default();
    let dates = ProfileDateFormatter::default();
    let projector = EntityProjector::new(&site, &text, &dates);

    let ids = projector.term_entities("node", "article", "field_tags", EntityId(40));
    assert_eq!(ids, vec![EntityId(2)]);

    let seed = CacheTags::from(vec!["taxonomy_term:40".to_string()]);
    let tags = cache_tags(&ids, "node", seed);
    assert_eq!(tags.into_vec(), vec!["taxonomy_term:40", "node:2"]);
}

// =========================================================================
// Images
// =========================================================================

#[test]
fn node_image_with_probed_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("photos")).unwrap();
    RgbImage::from_pixel(1600, 1200, image::Rgb([200, 180, 120]))
        .save(tmp.path().join("photos/dune.jpg"))
        .unwrap();

    let site = open_site();
    let config = AssistantConfig::default();
    let probe = LocalImageProbe::new(tmp.path());
    let styles = ConfiguredStyles::new(&config);
    let projector = ImageProjector::new(&site, &probe, &styles, config.fields.clone());

    let resolver = PathResolver::new(&site, &site);
    let node = resolver.resolve_alias("/dunes").unwrap();

    let render = match projector.entity_image(&node, "field_image", Some("hero"), &OutputType::Render, true) {
        Some(ImageOutput::Render(r)) => r,
        other => panic!("expected render, got {other:?}"),
    };
    assert_eq!(render.descriptor.dimensions(), Some((1600, 1200)));
    assert_eq!(render.descriptor.style_mode, StyleMode::Responsive("hero".into()));

    let html = render.to_html(&styles).into_string();
    assert!(html.starts_with("<picture>"));
    assert!(html.contains("/sites/default/files/styles/large/public/photos/dune.jpg 480w"));
    assert!(html.contains(r#"width="480" height="360""#));
}

#[test]
fn missing_file_on_disk_still_renders_without_dimensions() {
    let tmp = tempfile::TempDir::new().unwrap();
    let site = open_site();
    let config = AssistantConfig::default();
    let probe = LocalImageProbe::new(tmp.path());
    let styles = ConfiguredStyles::new(&config);
    let projector = ImageProjector::new(&site, &probe, &styles, config.fields.clone());

    let Some(ImageOutput::Html(html)) = projector.file_image(
        site_assistant::imaging::ImageSource::Id(EntityId(4)),
        Some("thumbnail"),
        &OutputType::Html,
        true,
    ) else {
        panic!("expected html");
    };
    assert!(html.contains("/styles/thumbnail/public/photos/dune.jpg"));
    assert!(!html.contains("width="));
}

#[test]
fn configured_base_url_flows_into_urls() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config_path = tmp.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[files]\npublic_base_url = \"https://cdn.example.com\"\n",
    )
    .unwrap();
    let config = load_config(&config_path).unwrap();

    let site = open_site();
    let probe = LocalImageProbe::new(tmp.path());
    let styles = ConfiguredStyles::new(&config);
    let projector = ImageProjector::new(&site, &probe, &styles, config.fields.clone());
    let node = site_assistant::store::EntityStore::load(&site, "node", EntityId(1)).unwrap();

    assert_eq!(
        projector.entity_image(&node, "field_image", Some("medium"), &OutputType::Url, true),
        Some(ImageOutput::Url(
            "https://cdn.example.com/styles/medium/public/photos/dune.jpg".into()
        ))
    );
}

// =========================================================================
// Menus
// =========================================================================

#[test]
fn main_menu_for_snapshot_viewer() {
    let site = open_site();
    let render = MenuProjector::new(&site, site.viewer()).menu_tree("main");
    let titles: Vec<&str> = render.items.iter().map(|i| i.title.as_str()).collect();
    // admin link needs a permission, hidden is disabled, team is not top level
    assert_eq!(titles, vec!["Home", "About us", "Shop"]);

    let html = render.to_html("/about-us/team").into_string();
    assert!(html.contains(r#"<li class="is-active"><a href="/about-us">About us</a></li>"#));
}

#[test]
fn main_menu_for_administrator() {
    let site = open_site();
    let admin = Viewer::anonymous().with_permission("administer site");
    let render = MenuProjector::new(&site, &admin).menu_tree("main");
    assert_eq!(render.items[0].title, "Administration");
}
