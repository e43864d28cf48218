//! Entity model shared by every projector.
//!
//! Entities are owned by the external store. The facade only ever sees
//! transient copies: an [`Entity`] is what a store hands back from
//! [`EntityStore::load`](crate::store::EntityStore::load), and it is never
//! written back.
//!
//! Field values follow the usual content-store shape: every field is a list
//! of items, and each item may carry a scalar `value`, a text `format`, and/or
//! a `target_id` pointing at another entity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Well-known entity type names.
pub mod entity_type {
    pub const NODE: &str = "node";
    pub const FILE: &str = "file";
    pub const PRODUCT: &str = "commerce_product";
    pub const VARIATION: &str = "commerce_product_variation";
    pub const STORE: &str = "commerce_store";
    pub const ORDER: &str = "commerce_order";
    pub const ORDER_ITEM: &str = "commerce_order_item";
}

/// `(type, id)` pair identifying an entity without carrying its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: EntityId) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// One item of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldItem {
    /// Scalar value (text, number, uri) if the field stores one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Text format name for rich text items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Referenced entity id for reference fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<EntityId>,
}

impl FieldItem {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn formatted(value: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            format: Some(format.into()),
            target_id: None,
        }
    }

    pub fn reference(target_id: u64) -> Self {
        Self {
            target_id: Some(EntityId(target_id)),
            ..Self::default()
        }
    }
}

/// A loaded entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldItem>>,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: EntityId(id),
            bundle: None,
            label: String::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, items: Vec<FieldItem>) -> Self {
        self.fields.insert(name.into(), items);
        self
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef::new(self.entity_type.clone(), self.id)
    }

    pub fn is_type(&self, entity_type: &str) -> bool {
        self.entity_type == entity_type
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// First item of a field, if the field exists and is non-empty.
    pub fn first(&self, name: &str) -> Option<&FieldItem> {
        self.fields.get(name).and_then(|items| items.first())
    }

    /// Scalar value of the first item of a field.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(|item| item.value.as_deref())
    }

    /// Target id of the first item of a reference field.
    pub fn first_target(&self, name: &str) -> Option<EntityId> {
        self.first(name).and_then(|item| item.target_id)
    }

    /// All target ids of a reference field, in field order.
    pub fn targets(&self, name: &str) -> Vec<EntityId> {
        self.fields
            .get(name)
            .map(|items| items.iter().filter_map(|i| i.target_id).collect())
            .unwrap_or_default()
    }
}

/// Anything that can stand in for an entity id when building cache tags:
/// loaded entities, references, or raw ids.
pub trait TagTarget {
    fn tag_id(&self) -> String;
}

impl TagTarget for Entity {
    fn tag_id(&self) -> String {
        self.id.to_string()
    }
}

impl TagTarget for EntityRef {
    fn tag_id(&self) -> String {
        self.id.to_string()
    }
}

impl TagTarget for EntityId {
    fn tag_id(&self) -> String {
        self.to_string()
    }
}

impl TagTarget for u64 {
    fn tag_id(&self) -> String {
        self.to_string()
    }
}

impl TagTarget for str {
    fn tag_id(&self) -> String {
        self.to_string()
    }
}

impl TagTarget for String {
    fn tag_id(&self) -> String {
        self.clone()
    }
}

impl<T: TagTarget + ?Sized> TagTarget for &T {
    fn tag_id(&self) -> String {
        (**self).tag_id()
    }
}
