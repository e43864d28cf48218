use clap::{Parser, Subcommand};
use site_assistant::commerce::{CartContext, CartWriter, ORDER_ROUTE_PARAMETER};
use site_assistant::dates::ProfileDateFormatter;
use site_assistant::imaging::{
    ConfiguredStyles, ImageProjector, ImageSource, LocalImageProbe, OutputType,
};
use site_assistant::memory::MemorySite;
use site_assistant::menu::{MenuProjector, MenuTreeParameters};
use site_assistant::path::{self, PathAliasResolver, PathResolver};
use site_assistant::projection::{self, CacheTags, EntityProjector};
use site_assistant::store::EntityStore;
use site_assistant::text::MarkupFilter;
use site_assistant::types::EntityId;
use site_assistant::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "site-assistant")]
#[command(about = "Inspect content projections and cart workflows over a site snapshot")]
#[command(long_about = "\
Inspect content projections and cart workflows over a site snapshot

A site snapshot is a JSON file holding entities, path aliases, menus, route
parameters and the viewer's permissions. Every command reads it, runs one
projection, and prints the result.

Examples:

  site-assistant alias /about-us
  site-assistant field node 1 body --html
  site-assistant date 05/03/2024 --input-format %d/%m/%Y --output long
  site-assistant image --file 4 --style hero --output html
  site-assistant menu main --current-path /about-us/team
  site-assistant cart-add 10 --save
  site-assistant cart-products --order 110

Logs go to stderr; set RUST_LOG (e.g. RUST_LOG=site_assistant=debug) for more.

Run 'site-assistant gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site snapshot (JSON)
    #[arg(long, default_value = "site.json", global = true)]
    site: PathBuf,

    /// Config file; stock defaults apply when it does not exist
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Site(SiteCommand),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Commands that run against a loaded site snapshot.
#[derive(Subcommand)]
enum SiteCommand {
    /// Positional segments of a path
    Args {
        path: String,
        /// Print only the segment at this 0-based index
        #[arg(long)]
        index: Option<usize>,
        /// Internal path of the request; PATH is then read as the raw request URI
        #[arg(long)]
        current: Option<String>,
    },
    /// Resolve a path alias to its node
    Alias { alias: String },
    /// Show an entity
    Show { entity_type: String, id: u64 },
    /// Display value of a field's first item
    Field {
        entity_type: String,
        id: u64,
        field: String,
        /// Filter unformatted values through the fallback text format
        #[arg(long)]
        html: bool,
    },
    /// Format a date value with a named output profile
    Date {
        value: String,
        /// strftime pattern for non-numeric values
        #[arg(long)]
        input_format: Option<String>,
        /// Output profile name
        #[arg(long, default_value = "medium")]
        output: String,
    },
    /// Cache tags for a list of ids
    Tags {
        entity_type: String,
        ids: Vec<String>,
        /// Pre-existing tags to seed the list with
        #[arg(long)]
        existing: Vec<String>,
    },
    /// Project a file, or an entity's image field
    Image {
        /// File entity id
        #[arg(long, conflicts_with = "field")]
        file: Option<u64>,
        /// Image field on ENTITY (requires --entity)
        #[arg(long, requires = "entity")]
        field: Option<String>,
        /// Entity as TYPE:ID, e.g. node:1
        #[arg(long)]
        entity: Option<String>,
        /// Image style or responsive style id
        #[arg(long)]
        style: Option<String>,
        /// render, html, or url
        #[arg(long, default_value = "render")]
        output: String,
        /// Use the style as a fixed style even if it is not registered
        #[arg(long)]
        no_responsive: bool,
    },
    /// Load, filter and sort a menu
    Menu {
        name: String,
        /// Path used for active-trail marking in --html output
        #[arg(long, default_value = "/")]
        current_path: String,
        /// Print HTML instead of the tree
        #[arg(long)]
        html: bool,
        /// Load every level, including disabled links
        #[arg(long)]
        all_levels: bool,
    },
    /// Add a product to the store's cart
    CartAdd {
        product: u64,
        #[arg(long)]
        variation: Option<u64>,
        #[arg(long)]
        store: Option<u64>,
        /// Write the updated snapshot back to --site
        #[arg(long)]
        save: bool,
    },
    /// Products in the order on the current route
    CartProducts {
        /// Order id, instead of the snapshot's route parameter
        #[arg(long)]
        order: Option<u64>,
    },
    /// Published entities tagged with a term
    Terms {
        term: u64,
        #[arg(long)]
        bundle: String,
        #[arg(long)]
        field: String,
        #[arg(long, default_value = "node")]
        entity_type: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        Command::Site(command) => run(command, &cli.site, &cli.config)?,
    }

    Ok(())
}

fn run(
    command: SiteCommand,
    site_path: &Path,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config(config_path)?;
    let mut site = MemorySite::open(site_path)?;

    match command {
        SiteCommand::Args {
            path: request_uri,
            index,
            current,
        } => {
            let resolver = PathResolver::new(&site, &site);
            match (index, current) {
                (Some(i), _) => match path::segment_at(&request_uri, i) {
                    Some(segment) => println!("{}", segment),
                    None => println!("(none)"),
                },
                (None, Some(internal)) => {
                    let request = path::RequestContext::new(internal, request_uri);
                    println!("Current");
                    output::print_lines(&output::format_segments(
                        &resolver.current_segments(&request),
                    ));
                    println!("Alias");
                    output::print_lines(&output::format_segments(
                        &resolver.alias_segments(&request),
                    ));
                }
                (None, None) => {
                    output::print_lines(&output::format_segments(&path::segments(&request_uri)))
                }
            }
        }
        SiteCommand::Alias { alias } => {
            let resolver = PathResolver::new(&site, &site);
            let canonical = site.alias_to_path(&alias);
            let node = resolver.resolve_alias(&alias);
            output::print_lines(&output::format_alias(&alias, &canonical, node.as_ref()));
        }
        SiteCommand::Show { entity_type, id } => {
            let entity = load_entity(&site, &entity_type, id)?;
            output::print_lines(&output::format_entity(&entity));
        }
        SiteCommand::Field {
            entity_type,
            id,
            field,
            html,
        } => {
            let entity = load_entity(&site, &entity_type, id)?;
            let text = MarkupFilter::new(&cfg.text);
            let dates = ProfileDateFormatter::new(&cfg.dates);
            let projector = EntityProjector::new(&site, &text, &dates);
            println!("{}", projector.single_field_value(&entity, &field, html));
        }
        SiteCommand::Date {
            value,
            input_format,
            output: profile,
        } => {
            let text = MarkupFilter::new(&cfg.text);
            let dates = ProfileDateFormatter::new(&cfg.dates);
            let projector = EntityProjector::new(&site, &text, &dates);
            println!(
                "{}",
                projector.format_date(&value, input_format.as_deref(), &profile)?
            );
        }
        SiteCommand::Tags {
            entity_type,
            ids,
            existing,
        } => {
            let tags = projection::cache_tags(&ids, &entity_type, CacheTags::from(existing));
            output::print_lines(&output::format_cache_tags(&tags));
        }
        SiteCommand::Image {
            file,
            field,
            entity,
            style,
            output: output_name,
            no_responsive,
        } => {
            let probe = LocalImageProbe::new(&cfg.files.public_root);
            let styles = ConfiguredStyles::new(&cfg);
            let projector = ImageProjector::new(&site, &probe, &styles, cfg.fields.clone());
            let output_type: OutputType = output_name.parse()?;
            let responsive = !no_responsive;
            let result = match (file, field, entity) {
                (Some(id), _, _) => projector.file_image(
                    ImageSource::Id(EntityId(id)),
                    style.as_deref(),
                    &output_type,
                    responsive,
                ),
                (None, Some(field), Some(entity)) => {
                    let (entity_type, id) = parse_entity_arg(&entity)?;
                    let entity = load_entity(&site, &entity_type, id)?;
                    projector.entity_image(
                        &entity,
                        &field,
                        style.as_deref(),
                        &output_type,
                        responsive,
                    )
                }
                (None, None, Some(entity)) => {
                    let (entity_type, id) = parse_entity_arg(&entity)?;
                    let entity = load_entity(&site, &entity_type, id)?;
                    projector.file_image(
                        ImageSource::Entity(&entity),
                        style.as_deref(),
                        &output_type,
                        responsive,
                    )
                }
                _ => return Err("either --file or --entity is required".into()),
            };
            output::print_lines(&output::format_image_output(result.as_ref()));
        }
        SiteCommand::Menu {
            name,
            current_path,
            html,
            all_levels,
        } => {
            let projector = MenuProjector::new(&site, site.viewer());
            let render = if all_levels {
                projector.menu_tree_with(&name, &MenuTreeParameters::default())
            } else {
                projector.menu_tree(&name)
            };
            if html {
                println!("{}", render.to_html(&current_path).into_string());
            } else {
                output::print_lines(&output::format_menu(&render));
            }
        }
        SiteCommand::CartAdd {
            product,
            variation,
            store,
            save,
        } => {
            let writer = CartWriter::new(&site, &site, &site, cfg.commerce.clone());
            let redirect = writer.add_to_cart(
                EntityId(product),
                variation.map(EntityId),
                store.map(EntityId),
            )?;
            output::print_lines(&output::format_redirect(&redirect));
            if save {
                site.save(site_path)?;
                println!("Saved {}", site_path.display());
            }
        }
        SiteCommand::CartProducts { order } => {
            if let Some(id) = order {
                site.set_route_parameter(ORDER_ROUTE_PARAMETER, id.to_string());
            }
            let context = CartContext::new(&site, &site);
            output::print_lines(&output::format_products(&context.current_cart_products()));
        }
        SiteCommand::Terms {
            term,
            bundle,
            field,
            entity_type,
        } => {
            let text = MarkupFilter::new(&cfg.text);
            let dates = ProfileDateFormatter::new(&cfg.dates);
            let projector = EntityProjector::new(&site, &text, &dates);
            let ids = projector.term_entities(&entity_type, &bundle, &field, EntityId(term));
            output::print_lines(&output::format_ids(&entity_type, &ids));
        }
    }

    Ok(())
}

fn load_entity(
    site: &MemorySite,
    entity_type: &str,
    id: u64,
) -> Result<site_assistant::types::Entity, Box<dyn std::error::Error>> {
    EntityStore::load(site, entity_type, EntityId(id))
        .ok_or_else(|| format!("{entity_type} {id} not found").into())
}

/// Parse `TYPE:ID`.
fn parse_entity_arg(arg: &str) -> Result<(String, u64), Box<dyn std::error::Error>> {
    let (entity_type, id) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:ID, got '{arg}'"))?;
    Ok((entity_type.to_string(), id.parse()?))
}
