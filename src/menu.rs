//! Menu loading, filtering, and rendering.
//!
//! A menu goes through three stages:
//!
//! 1. **Load**: the [`MenuTreeStore`] returns the raw link tree for the
//!    requested [`MenuTreeParameters`].
//! 2. **Transform**: [`Manipulator`]s run in order. Access checking always
//!    runs before sorting, so dropped links never take part in the ordering.
//! 3. **Build**: the tree becomes a [`MenuRender`] (plain data plus cache
//!    tags), which can print itself as nested `<ul class="menu">` markup.

use crate::projection::CacheTags;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One link as stored in a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLink {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub weight: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Id of the parent link; `None` for top-level links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Permission the viewer needs to see this link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

fn default_enabled() -> bool {
    true
}

/// A link with its loaded children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTreeElement {
    pub link: MenuLink,
    pub subtree: Vec<MenuTreeElement>,
}

impl MenuTreeElement {
    pub fn leaf(link: MenuLink) -> Self {
        Self {
            link,
            subtree: Vec::new(),
        }
    }
}

/// What part of a menu to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuTreeParameters {
    pub only_enabled: bool,
    pub top_level_only: bool,
}

impl MenuTreeParameters {
    /// Enabled links at the root level only.
    pub fn top_level_enabled() -> Self {
        Self {
            only_enabled: true,
            top_level_only: true,
        }
    }
}

/// Menu storage service.
pub trait MenuTreeStore {
    fn load(&self, menu_name: &str, parameters: &MenuTreeParameters) -> Vec<MenuTreeElement>;
}

/// Decides whether the current viewer may see a link.
pub trait AccessChecker {
    fn can_access(&self, link: &MenuLink) -> bool;
}

/// [`AccessChecker`] over a fixed set of granted permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }
}

impl AccessChecker for Viewer {
    fn can_access(&self, link: &MenuLink) -> bool {
        link.permission
            .as_ref()
            .is_none_or(|p| self.permissions.contains(p))
    }
}

/// Tree transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manipulator {
    /// Drop links (and their subtrees) the viewer cannot access.
    CheckAccess,
    /// Sort every level by weight, then title, then id.
    GenerateIndexAndSort,
}

/// Apply manipulators in order.
pub fn transform(
    tree: Vec<MenuTreeElement>,
    manipulators: &[Manipulator],
    access: &dyn AccessChecker,
) -> Vec<MenuTreeElement> {
    manipulators
        .iter()
        .fold(tree, |tree, manipulator| match manipulator {
            Manipulator::CheckAccess => check_access(tree, access),
            Manipulator::GenerateIndexAndSort => sort_tree(tree),
        })
}

fn check_access(tree: Vec<MenuTreeElement>, access: &dyn AccessChecker) -> Vec<MenuTreeElement> {
    tree.into_iter()
        .filter(|element| {
            let allowed = access.can_access(&element.link);
            if !allowed {
                debug!(link = %element.link.id, "menu link dropped by access check");
            }
            allowed
        })
        .map(|mut element| {
            element.subtree = check_access(element.subtree, access);
            element
        })
        .collect()
}

fn sort_tree(mut tree: Vec<MenuTreeElement>) -> Vec<MenuTreeElement> {
    tree.sort_by(|a, b| {
        (a.link.weight, &a.link.title, &a.link.id).cmp(&(b.link.weight, &b.link.title, &b.link.id))
    });
    tree.into_iter()
        .map(|mut element| {
            element.subtree = sort_tree(element.subtree);
            element
        })
        .collect()
}

/// Turn a transformed tree into render data.
pub fn build(tree: &[MenuTreeElement], menu_name: &str) -> MenuRender {
    MenuRender {
        menu_name: menu_name.to_string(),
        items: tree.iter().map(build_item).collect(),
        cache_tags: CacheTags::from(vec![format!("config:system.menu.{menu_name}")]),
    }
}

fn build_item(element: &MenuTreeElement) -> MenuRenderItem {
    MenuRenderItem {
        title: element.link.title.clone(),
        url: element.link.url.clone(),
        below: element.subtree.iter().map(build_item).collect(),
    }
}

/// One rendered menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRenderItem {
    pub title: String,
    pub url: String,
    pub below: Vec<MenuRenderItem>,
}

impl MenuRenderItem {
    /// Whether this entry is on the active trail of `current_path`.
    pub fn is_active(&self, current_path: &str) -> bool {
        self.url == current_path || current_path.starts_with(&format!("{}/", self.url))
    }
}

/// A built menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRender {
    pub menu_name: String,
    pub items: Vec<MenuRenderItem>,
    pub cache_tags: CacheTags,
}

impl MenuRender {
    pub fn to_html(&self, current_path: &str) -> Markup {
        html! {
            nav.menu data-menu=(self.menu_name) {
                (render_items(&self.items, current_path))
            }
        }
    }
}

fn render_items(items: &[MenuRenderItem], current_path: &str) -> Markup {
    html! {
        ul.menu {
            @for item in items {
                li class=[item.is_active(current_path).then_some("is-active")] {
                    a href=(item.url) { (item.title) }
                    @if !item.below.is_empty() {
                        (render_items(&item.below, current_path))
                    }
                }
            }
        }
    }
}

/// Loads and prepares named menus.
pub struct MenuProjector<'a> {
    menus: &'a dyn MenuTreeStore,
    access: &'a dyn AccessChecker,
}

impl<'a> MenuProjector<'a> {
    pub fn new(menus: &'a dyn MenuTreeStore, access: &'a dyn AccessChecker) -> Self {
        Self { menus, access }
    }

    /// Top-level enabled links of `menu_name`, access-checked then sorted.
    pub fn menu_tree(&self, menu_name: &str) -> MenuRender {
        self.menu_tree_with(menu_name, &MenuTreeParameters::top_level_enabled())
    }

    /// Same pipeline with caller-chosen load parameters.
    pub fn menu_tree_with(&self, menu_name: &str, parameters: &MenuTreeParameters) -> MenuRender {
        let tree = self.menus.load(menu_name, parameters);
        let tree = transform(
            tree,
            &[Manipulator::CheckAccess, Manipulator::GenerateIndexAndSort],
            self.access,
        );
        build(&tree, menu_name)
    }
}
