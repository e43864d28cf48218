//! In-memory site: every store and provider trait over a JSON snapshot.
//!
//! Snapshot layout (`fixtures/site.json` is a complete example):
//!
//! ```json
//! {
//!   "entities": [{ "entity_type": "node", "id": 1, "bundle": "page", "label": "About us",
//!                  "fields": { "status": [{ "value": "1" }] } }],
//!   "aliases":  { "/about-us": "/node/1" },
//!   "menus":    { "main": [{ "id": "home", "title": "Home", "url": "/" }] },
//!   "route":    { "commerce_order": "100" },
//!   "viewer":   { "permissions": ["access content"] }
//! }
//! ```
//!
//! Carts are ordinary `commerce_order` entities created on demand, so the
//! read side ([`CartContext`](crate::commerce::CartContext)) sees them like
//! any other order. At most one cart exists per (scope, store).

use crate::commerce::{Cart, CartError, CartManager, CartProvider, RouteContext, RouteValue, fields};
use crate::menu::{MenuLink, MenuTreeElement, MenuTreeParameters, MenuTreeStore, Viewer};
use crate::path::PathAliasResolver;
use crate::store::{EntityQuery, EntityStore};
use crate::types::{Entity, EntityId, FieldItem, entity_type};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Order field pointing at the store a cart belongs to.
pub const STORE_FIELD: &str = "store_id";
/// Order field holding the cart scope.
pub const SCOPE_FIELD: &str = "cart_scope";
/// Order item field holding the quantity.
pub const QUANTITY_FIELD: &str = "quantity";

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialized form of a [`MemorySite`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSnapshot {
    pub entities: Vec<Entity>,
    pub aliases: BTreeMap<String, String>,
    pub menus: BTreeMap<String, Vec<MenuLink>>,
    pub route: BTreeMap<String, String>,
    pub viewer: Viewer,
}

type EntityKey = (String, EntityId);

#[derive(Debug, Default)]
struct SiteState {
    entities: BTreeMap<EntityKey, Entity>,
}

impl SiteState {
    fn next_id(&self, entity_type: &str) -> EntityId {
        let max = self
            .entities
            .keys()
            .filter(|(t, _)| t == entity_type)
            .map(|(_, id)| id.0)
            .max()
            .unwrap_or(0);
        EntityId(max + 1)
    }

    fn insert(&mut self, entity: Entity) {
        self.entities
            .insert((entity.entity_type.clone(), entity.id), entity);
    }

    fn find_cart(&self, scope: &str, store: EntityId) -> Option<Cart> {
        self.entities
            .values()
            .filter(|e| e.is_type(entity_type::ORDER))
            .find(|order| {
                order.first_value(SCOPE_FIELD) == Some(scope)
                    && order.first_target(STORE_FIELD) == Some(store)
            })
            .map(|order| Cart {
                order_id: order.id,
                scope: scope.to_string(),
                store_id: store,
            })
    }
}

/// Everything a site provides, held in memory.
#[derive(Debug)]
pub struct MemorySite {
    state: Mutex<SiteState>,
    aliases: BTreeMap<String, String>,
    menus: BTreeMap<String, Vec<MenuLink>>,
    route: BTreeMap<String, String>,
    viewer: Viewer,
}

impl MemorySite {
    pub fn from_snapshot(snapshot: SiteSnapshot) -> Self {
        let mut state = SiteState::default();
        for entity in snapshot.entities {
            let key = (entity.entity_type.clone(), entity.id);
            if state.entities.contains_key(&key) {
                warn!(entity = %entity.reference(), "duplicate entity in snapshot, keeping the last");
            }
            state.insert(entity);
        }
        Self {
            state: Mutex::new(state),
            aliases: snapshot.aliases,
            menus: snapshot.menus,
            route: snapshot.route,
            viewer: snapshot.viewer,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SiteError> {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }

    pub fn open(path: &Path) -> Result<Self, SiteError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Current state as a snapshot, including carts created since loading.
    pub fn snapshot(&self) -> SiteSnapshot {
        SiteSnapshot {
            entities: self.state().entities.values().cloned().collect(),
            aliases: self.aliases.clone(),
            menus: self.menus.clone(),
            route: self.route.clone(),
            viewer: self.viewer.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SiteError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Permissions of the viewer the snapshot was taken for.
    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn set_route_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.route.insert(name.into(), value.into());
    }

    fn state(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityStore for MemorySite {
    fn load(&self, entity_type: &str, id: EntityId) -> Option<Entity> {
        self.state()
            .entities
            .get(&(entity_type.to_string(), id))
            .cloned()
    }

    fn query(&self, query: &EntityQuery) -> Vec<EntityId> {
        self.state()
            .entities
            .values()
            .filter(|e| query.matches(e))
            .map(|e| e.id)
            .collect()
    }
}

impl PathAliasResolver for MemorySite {
    fn alias_to_path(&self, alias: &str) -> String {
        self.aliases
            .get(alias)
            .cloned()
            .unwrap_or_else(|| alias.to_string())
    }
}

impl MenuTreeStore for MemorySite {
    fn load(&self, menu_name: &str, parameters: &MenuTreeParameters) -> Vec<MenuTreeElement> {
        let Some(links) = self.menus.get(menu_name) else {
            debug!(menu = menu_name, "unknown menu");
            return Vec::new();
        };
        let visible: Vec<&MenuLink> = links
            .iter()
            .filter(|l| l.enabled || !parameters.only_enabled)
            .collect();
        subtree(&visible, None, parameters.top_level_only)
    }
}

fn subtree(links: &[&MenuLink], parent: Option<&str>, top_level_only: bool) -> Vec<MenuTreeElement> {
    links
        .iter()
        .filter(|l| l.parent.as_deref() == parent)
        .map(|l| MenuTreeElement {
            link: (*l).clone(),
            subtree: if top_level_only {
                Vec::new()
            } else {
                subtree(links, Some(l.id.as_str()), false)
            },
        })
        .collect()
}

impl RouteContext for MemorySite {
    fn parameter(&self, name: &str) -> Option<RouteValue> {
        self.route.get(name).cloned().map(RouteValue::Raw)
    }
}

impl CartProvider for MemorySite {
    fn get_cart(&self, scope: &str, store: &Entity) -> Option<Cart> {
        self.state().find_cart(scope, store.id)
    }

    fn create_cart(&self, scope: &str, store: &Entity) -> Result<Cart, CartError> {
        let mut state = self.state();
        if let Some(existing) = state.find_cart(scope, store.id) {
            debug!(order = %existing.order_id, "cart already exists");
            return Ok(existing);
        }
        let order_id = state.next_id(entity_type::ORDER);
        let order = Entity::new(entity_type::ORDER, order_id.0)
            .with_bundle("default")
            .with_label(format!("Cart {order_id}"))
            .with_field(SCOPE_FIELD, vec![FieldItem::value(scope)])
            .with_field(STORE_FIELD, vec![FieldItem::reference(store.id.0)])
            .with_field(fields::ORDER_ITEMS, Vec::new());
        state.insert(order);
        Ok(Cart {
            order_id,
            scope: scope.to_string(),
            store_id: store.id,
        })
    }
}

impl CartManager for MemorySite {
    fn add_entity(&self, cart: &Cart, variation: &Entity) -> Result<(), CartError> {
        let mut state = self.state();
        let order_key = (entity_type::ORDER.to_string(), cart.order_id);
        let Some(order) = state.entities.get(&order_key).cloned() else {
            return Err(CartError::NotFound {
                entity_type: entity_type::ORDER.to_string(),
                id: cart.order_id,
            });
        };

        // Same variation again: bump the quantity of its line.
        let existing_line = order.targets(fields::ORDER_ITEMS).into_iter().find(|item_id| {
            state
                .entities
                .get(&(entity_type::ORDER_ITEM.to_string(), *item_id))
                .and_then(|item| item.first_target(fields::PURCHASED_ENTITY))
                == Some(variation.id)
        });

        if let Some(item_id) = existing_line {
            if let Some(item) = state
                .entities
                .get_mut(&(entity_type::ORDER_ITEM.to_string(), item_id))
            {
                let quantity = item
                    .first_value(QUANTITY_FIELD)
                    .and_then(|q| q.parse::<u32>().ok())
                    .unwrap_or(0);
                item.fields.insert(
                    QUANTITY_FIELD.to_string(),
                    vec![FieldItem::value((quantity + 1).to_string())],
                );
            }
            return Ok(());
        }

        let item_id = state.next_id(entity_type::ORDER_ITEM);
        state.insert(
            Entity::new(entity_type::ORDER_ITEM, item_id.0)
                .with_bundle("default")
                .with_label(variation.label.clone())
                .with_field(fields::PURCHASED_ENTITY, vec![FieldItem::reference(variation.id.0)])
                .with_field(QUANTITY_FIELD, vec![FieldItem::value("1")]),
        );
        if let Some(order) = state.entities.get_mut(&order_key) {
            order
                .fields
                .entry(fields::ORDER_ITEMS.to_string())
                .or_default()
                .push(FieldItem::reference(item_id.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fixture_site;

    fn store(site: &MemorySite, id: u64) -> Entity {
        EntityStore::load(site, entity_type::STORE, EntityId(id)).unwrap()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn from_json_minimal() {
        let site = MemorySite::from_json(r#"{"entities": [{"entity_type": "node", "id": 3}]}"#).unwrap();
        let node = EntityStore::load(&site, "node", EntityId(3)).unwrap();
        assert_eq!(node.label, "");
        assert!(EntityStore::load(&site, "file", EntityId(3)).is_none());
    }

    #[test]
    fn unknown_snapshot_key_is_rejected() {
        let err = MemorySite::from_json(r#"{"entitys": []}"#).unwrap_err();
        assert!(matches!(err, SiteError::Json(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = MemorySite::open(Path::new("/nonexistent/site.json")).unwrap_err();
        assert!(matches!(err, SiteError::Io(_)));
    }

    #[test]
    fn save_and_reload_keeps_carts() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("site.json");
        let site = fixture_site();
        let cart = site.create_cart("default", &store(&site, 1)).unwrap();
        site.save(&path).unwrap();

        let reloaded = MemorySite::open(&path).unwrap();
        assert_eq!(reloaded.get_cart("default", &store(&reloaded, 1)), Some(cart));
    }

    // =========================================================================
    // EntityStore / aliases
    // =========================================================================

    #[test]
    fn query_returns_ascending_ids() {
        let site = fixture_site();
        let ids = site.query(&EntityQuery::new("commerce_product"));
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(ids.contains(&EntityId(10)));
    }

    #[test]
    fn unknown_alias_is_echoed() {
        let site = fixture_site();
        assert_eq!(site.alias_to_path("/about-us"), "/node/1");
        assert_eq!(site.alias_to_path("/nowhere"), "/nowhere");
    }

    // =========================================================================
    // Menus
    // =========================================================================

    #[test]
    fn top_level_enabled_menu_load() {
        let site = fixture_site();
        let tree = MenuTreeStore::load(&site, "main", &MenuTreeParameters::top_level_enabled());
        let ids: Vec<&str> = tree.iter().map(|e| e.link.id.as_str()).collect();
        assert!(ids.contains(&"home"));
        assert!(!ids.contains(&"hidden"));
        assert!(!ids.contains(&"team"));
        assert!(tree.iter().all(|e| e.subtree.is_empty()));
    }

    #[test]
    fn full_menu_load_nests_children() {
        let site = fixture_site();
        let params = MenuTreeParameters {
            only_enabled: false,
            top_level_only: false,
        };
        let tree = MenuTreeStore::load(&site, "main", &params);
        let about = tree.iter().find(|e| e.link.id == "about").unwrap();
        assert_eq!(about.subtree.len(), 1);
        assert_eq!(about.subtree[0].link.id, "team");
        assert!(tree.iter().any(|e| e.link.id == "hidden"));
    }

    #[test]
    fn unknown_menu_is_empty() {
        let site = fixture_site();
        assert!(MenuTreeStore::load(&site, "nope", &MenuTreeParameters::default()).is_empty());
    }

    // =========================================================================
    // Carts
    // =========================================================================

    #[test]
    fn create_cart_is_idempotent_per_scope_and_store() {
        let site = fixture_site();
        let s1 = store(&site, 1);
        let first = site.create_cart("default", &s1).unwrap();
        let second = site.create_cart("default", &s1).unwrap();
        assert_eq!(first, second);

        let other_scope = site.create_cart("wishlist", &s1).unwrap();
        assert_ne!(first.order_id, other_scope.order_id);
    }

    #[test]
    fn new_cart_gets_next_order_id() {
        let site = fixture_site();
        let cart = site.create_cart("default", &store(&site, 1)).unwrap();
        // fixture orders go up to 110
        assert_eq!(cart.order_id, EntityId(111));
    }

    #[test]
    fn add_entity_creates_then_bumps_line() {
        let site = fixture_site();
        let cart = site.create_cart("default", &store(&site, 1)).unwrap();
        let variation = EntityStore::load(&site, entity_type::VARIATION, EntityId(11)).unwrap();

        site.add_entity(&cart, &variation).unwrap();
        site.add_entity(&cart, &variation).unwrap();

        let order = EntityStore::load(&site, entity_type::ORDER, cart.order_id).unwrap();
        let items = order.targets(fields::ORDER_ITEMS);
        assert_eq!(items.len(), 1);
        let item = EntityStore::load(&site, entity_type::ORDER_ITEM, items[0]).unwrap();
        assert_eq!(item.first_value(QUANTITY_FIELD), Some("2"));
        assert_eq!(item.first_target(fields::PURCHASED_ENTITY), Some(EntityId(11)));
    }

    #[test]
    fn add_entity_to_missing_order_fails() {
        let site = fixture_site();
        let variation = EntityStore::load(&site, entity_type::VARIATION, EntityId(11)).unwrap();
        let cart = Cart {
            order_id: EntityId(9999),
            scope: "default".into(),
            store_id: EntityId(1),
        };
        assert!(matches!(
            site.add_entity(&cart, &variation),
            Err(CartError::NotFound { .. })
        ));
    }

    #[test]
    fn route_parameters_are_raw() {
        let mut site = fixture_site();
        site.set_route_parameter("commerce_order", "110");
        assert_eq!(
            site.parameter("commerce_order"),
            Some(RouteValue::Raw("110".into()))
        );
        assert_eq!(site.parameter("node"), None);
    }
}
