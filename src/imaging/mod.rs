//! Image projection: file entities into render structures, markup, or URLs.
//!
//! | Concern | Type / function |
//! |---|---|
//! | **Validate** | [`ImageValidator`] trait, [`LocalImageProbe`] (`image::image_dimensions`) |
//! | **Styles** | [`ImageStyleRegistry`] trait, [`ConfiguredStyles`] |
//! | **Dimensions** | [`calculate_scaled_dimensions`] |
//! | **Render** | [`ImageRender::to_html`] (`maud`) |
//! | **Project** | [`ImageProjector::file_image`], [`ImageProjector::entity_image`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Backend**: [`ImageValidator`] trait + [`LocalImageProbe`]
//! - **Styles**: fixed and responsive style registry, derivative URLs
//! - **Render**: descriptor types and their HTML form
//! - **Projector**: the entry point combining all of the above

pub mod backend;
mod calculations;
pub mod projector;
pub mod render;
pub mod styles;

pub use backend::{ImageProbe, ImageValidator, LocalImageProbe, ProbeError};
pub use calculations::{calculate_scaled_dimensions, srcset_width};
pub use projector::{ImageOutput, ImageProjector, ImageSource, OutputType};
pub use render::{ImageDescriptor, ImageRender, StyleMode};
pub use styles::{ConfiguredStyles, ImageStyleRegistry, ResponsiveStyle, ORIGINAL_STYLE};
