//! Entity storage seam.
//!
//! The facade never owns entities; it asks an [`EntityStore`] for them.
//! Queries are described with an [`EntityQuery`] value (type plus a list of
//! equality conditions) and answered with matching ids, leaving indexing and
//! access rules to the store.

use crate::types::{Entity, EntityId};

/// Storage service for typed entities.
pub trait EntityStore {
    /// Load one entity. `None` when the id does not exist for that type.
    fn load(&self, entity_type: &str, id: EntityId) -> Option<Entity>;

    /// Ids of all entities matching the query, in ascending id order.
    fn query(&self, query: &EntityQuery) -> Vec<EntityId>;
}

/// Equality condition on an entity property or field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub value: String,
}

/// Filterable query over one entity type.
///
/// Property names `status`, `type` and `id` are matched against the entity
/// itself; anything else is matched against the field items (value or
/// target id, any item).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub entity_type: String,
    pub conditions: Vec<Condition>,
}

impl EntityQuery {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            conditions: Vec::new(),
        }
    }

    pub fn condition(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            value: value.to_string(),
        });
        self
    }

    /// Whether an entity satisfies every condition.
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.entity_type == self.entity_type
            && self.conditions.iter().all(|c| condition_holds(entity, c))
    }
}

fn condition_holds(entity: &Entity, condition: &Condition) -> bool {
    match condition.field.as_str() {
        "id" => entity.id.to_string() == condition.value,
        "type" => entity.bundle.as_deref() == Some(condition.value.as_str()),
        // Entities without an explicit status field count as published.
        "status" if !entity.has_field("status") => condition.value == "1",
        field => entity
            .fields
            .get(field)
            .map(|items| {
                items.iter().any(|item| {
                    item.value.as_deref() == Some(condition.value.as_str())
                        || item.target_id.map(|t| t.to_string()).as_deref()
                            == Some(condition.value.as_str())
                })
            })
            .unwrap_or(false),
    }
}
