//! Entity field projection: scalar and rich-text values, dates, cache tags,
//! and term lookups.

use crate::dates::{self, DateError, DateFormatter};
use crate::store::{EntityQuery, EntityStore};
use crate::text::TextFilter;
use crate::types::{Entity, EntityId, TagTarget};
use serde::{Deserialize, Serialize};

/// Ordered, append-only list of `"<entity_type>:<id>"` cache tags.
///
/// Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTags(Vec<String>);

impl CacheTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity_type: &str, target: &impl TagTarget) {
        self.0.push(format!("{}:{}", entity_type, target.tag_id()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for CacheTags {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

/// Append one tag per target to `existing` and return the result.
///
/// The seed is taken by value, so a caller's own list is never mutated
/// behind its back.
pub fn cache_tags<T: TagTarget>(targets: &[T], entity_type: &str, existing: CacheTags) -> CacheTags {
    let mut tags = existing;
    for target in targets {
        tags.push(entity_type, target);
    }
    tags
}

/// Field and date projection over injected services.
pub struct EntityProjector<'a> {
    entities: &'a dyn EntityStore,
    text: &'a dyn TextFilter,
    dates: &'a dyn DateFormatter,
}

impl<'a> EntityProjector<'a> {
    pub fn new(
        entities: &'a dyn EntityStore,
        text: &'a dyn TextFilter,
        dates: &'a dyn DateFormatter,
    ) -> Self {
        Self {
            entities,
            text,
            dates,
        }
    }

    /// Display value of the first item of `field_name`.
    ///
    /// Empty when the field is missing or has no value. Items with a text
    /// format, or any item when `as_html` is set, go through the text filter;
    /// otherwise the raw value is returned.
    pub fn single_field_value(&self, entity: &Entity, field_name: &str, as_html: bool) -> String {
        let Some(item) = entity.first(field_name) else {
            return String::new();
        };
        let Some(value) = item.value.as_deref() else {
            return String::new();
        };
        match item.format.as_deref().filter(|f| !f.is_empty()) {
            Some(format) => self.text.filter(value, format),
            None if as_html => self.text.filter(value, self.text.fallback_format()),
            None => value.to_string(),
        }
    }

    /// Render a date value with a named output profile.
    ///
    /// - empty `value`, or `"0"` → empty string
    /// - numeric `value`, or no `input_format` → used as a timestamp
    ///   (a non-numeric value with no input format is an error)
    /// - otherwise parsed with `input_format`; failure is an error
    pub fn format_date(
        &self,
        value: &str,
        input_format: Option<&str>,
        output_format: &str,
    ) -> Result<String, DateError> {
        if value.is_empty() || value == "0" {
            return Ok(String::new());
        }
        let timestamp = match (dates::numeric_timestamp(value), input_format) {
            (Some(ts), _) => ts,
            (None, Some(format)) => dates::parse_timestamp(value, format)?,
            (None, None) => {
                return Err(DateError::NotATimestamp {
                    value: value.to_string(),
                });
            }
        };
        Ok(self.dates.format(timestamp, output_format))
    }

    /// Ids of published `bundle` entities whose `field` references `term_id`.
    pub fn term_entities(
        &self,
        entity_type: &str,
        bundle: &str,
        field: &str,
        term_id: EntityId,
    ) -> Vec<EntityId> {
        let query = EntityQuery::new(entity_type)
            .condition("status", 1)
            .condition("type", bundle)
            .condition(field, term_id);
        self.entities.query(&query)
    }
}
