//! Cart lookup and add-to-cart.
//!
//! The facade never stores carts itself. It talks to three services:
//!
//! | Service | Role |
//! |---|---|
//! | [`CartProvider`] | find or create the one cart per (scope, store) |
//! | [`CartManager`] | put a purchasable variation into a cart |
//! | [`RouteContext`] | expose route parameters of the current request |
//!
//! [`CartContext`] reads, [`CartWriter`] writes. Entity relationships are
//! walked through [`fields`]: order → order items → purchased variation →
//! parent product.

mod context;
mod writer;

pub use context::CartContext;
pub use writer::CartWriter;

use crate::types::{Entity, EntityId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field names used to walk commerce entities.
pub mod fields {
    /// Product → its variations, first one is the default.
    pub const VARIATIONS: &str = "variations";
    /// Product → stores it is sold in, first one is the default.
    pub const STORES: &str = "stores";
    /// Order → its line items.
    pub const ORDER_ITEMS: &str = "order_items";
    /// Order item → the purchased variation.
    pub const PURCHASED_ENTITY: &str = "purchased_entity";
    /// Variation → parent product.
    pub const PRODUCT_ID: &str = "product_id";
}

/// Route parameter holding the order being viewed.
pub const ORDER_ROUTE_PARAMETER: &str = "commerce_order";

#[derive(Error, Debug)]
pub enum CartError {
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: EntityId },
    #[error("product {product} has no default in '{field}'")]
    MissingDefault { product: EntityId, field: String },
    #[error("cart provider failed: {0}")]
    Provider(String),
}

/// A cart: an order in draft state, tied to a scope and a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub order_id: EntityId,
    pub scope: String,
    pub store_id: EntityId,
}

/// Cart lookup and creation service.
pub trait CartProvider {
    /// The current cart for `(scope, store)`, if one exists.
    fn get_cart(&self, scope: &str, store: &Entity) -> Option<Cart>;

    /// Create the cart for `(scope, store)`.
    fn create_cart(&self, scope: &str, store: &Entity) -> Result<Cart, CartError>;
}

/// Cart mutation service.
pub trait CartManager {
    /// Add one unit of `variation` to `cart`.
    fn add_entity(&self, cart: &Cart, variation: &Entity) -> Result<(), CartError>;
}

/// Value of a route parameter: upcast to an entity, or left raw.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteValue {
    Entity(Entity),
    Raw(String),
}

/// Route parameters of the current request.
pub trait RouteContext {
    fn parameter(&self, name: &str) -> Option<RouteValue>;
}

/// Redirect the caller should issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub location: String,
    pub status: u16,
}

impl Redirect {
    /// `302 Found` to `location`.
    pub fn found(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: 302,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_found_is_302() {
        let r = Redirect::found("/cart");
        assert_eq!(r.location, "/cart");
        assert_eq!(r.status, 302);
    }

    #[test]
    fn error_messages_name_the_entity() {
        let err = CartError::NotFound {
            entity_type: "commerce_product".into(),
            id: EntityId(10),
        };
        assert_eq!(err.to_string(), "commerce_product 10 not found");

        let err = CartError::MissingDefault {
            product: EntityId(20),
            field: fields::VARIATIONS.into(),
        };
        assert!(err.to_string().contains("variations"));
    }
}
