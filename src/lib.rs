//! # Site Assistant
//!
//! Read-model helpers for a content site with a shop: resolve request paths
//! to entities, project entity fields into display-ready values (rich text,
//! dates, images, cache tags), build menus, and run the add-to-cart workflow.
//!
//! # Architecture: Projectors Over Services
//!
//! The crate owns no storage. Every collaborator is a trait, handed to a
//! projector as a borrowed trait object when it is built:
//!
//! ```text
//! request path ──▶ PathResolver ──▶ Entity ──▶ EntityProjector  ──▶ text, dates, cache tags
//!                                         └──▶ ImageProjector   ──▶ render / html / url
//! menu name ──────▶ MenuProjector ──▶ MenuRender
//! route ──────────▶ CartContext   ──▶ products in the current order
//! product id ─────▶ CartWriter    ──▶ Redirect
//! ```
//!
//! Projectors are plain structs of `&dyn Trait` fields. There is no global
//! lookup, so tests hand in doubles and the CLI hands in [`memory::MemorySite`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `Entity`, `EntityId`, field items, `TagTarget` |
//! | [`store`] | `EntityStore` trait and `EntityQuery` conditions |
//! | [`path`] | Path segments, node-path parsing, alias resolution |
//! | [`projection`] | Field values, date formatting, cache tags, term lookups |
//! | [`text`] | `TextFilter` trait and the markdown/plain/html `MarkupFilter` |
//! | [`dates`] | `DateFormatter` trait, named output profiles, input parsing |
//! | [`imaging`] | Image validation, style registry, descriptors, `<img>`/`<picture>` output |
//! | [`menu`] | Menu loading, access check, sort, render tree, `<ul>` output |
//! | [`commerce`] | Cart services, current-order products, add-to-cart |
//! | [`memory`] | `MemorySite`: every service over a JSON snapshot |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Absence Is a Value
//!
//! A missing alias, field, file or route parameter is not an error. Lookups
//! return `Option` or an empty string and the caller renders nothing. Only
//! genuinely broken input (an unparseable date, a product with no variation
//! to add) produces an `Err`.
//!
//! ## Redirects Are Returned, Not Issued
//!
//! [`commerce::CartWriter::add_to_cart`] ends with a [`commerce::Redirect`]
//! value. Sending it is the caller's job, so the workflow stays testable
//! without an HTTP layer.
//!
//! ## Maud for Markup
//!
//! Image and menu HTML is generated with [Maud](https://maud.lambda.xyz/):
//! malformed markup is a build error and every interpolation is escaped.
//! Stored rich text goes through a named text format before it is emitted.

pub mod commerce;
pub mod config;
pub mod dates;
pub mod imaging;
pub mod memory;
pub mod menu;
pub mod output;
pub mod path;
pub mod projection;
pub mod store;
pub mod text;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
