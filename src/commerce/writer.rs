use super::{CartError, CartManager, CartProvider, Redirect, fields};
use crate::config::CommerceConfig;
use crate::store::EntityStore;
use crate::types::{Entity, EntityId, entity_type};
use tracing::{debug, info};

/// Write side of the cart: the add-to-cart workflow.
pub struct CartWriter<'a> {
    entities: &'a dyn EntityStore,
    carts: &'a dyn CartProvider,
    manager: &'a dyn CartManager,
    config: CommerceConfig,
}

impl<'a> CartWriter<'a> {
    pub fn new(
        entities: &'a dyn EntityStore,
        carts: &'a dyn CartProvider,
        manager: &'a dyn CartManager,
        config: CommerceConfig,
    ) -> Self {
        Self {
            entities,
            carts,
            manager,
            config,
        }
    }

    /// Add one unit of a product to the cart of a store.
    ///
    /// Without an explicit variation or store, the product's first
    /// variation and first store are used. The cart for the configured
    /// scope and that store is created on first use. Returns the redirect
    /// to the cart page.
    pub fn add_to_cart(
        &self,
        product_id: EntityId,
        variation_id: Option<EntityId>,
        store_id: Option<EntityId>,
    ) -> Result<Redirect, CartError> {
        let product = self.load(entity_type::PRODUCT, product_id)?;

        let variation_id = match variation_id {
            Some(id) => id,
            None => default_target(&product, fields::VARIATIONS)?,
        };
        let store_id = match store_id {
            Some(id) => id,
            None => default_target(&product, fields::STORES)?,
        };

        let variation = self.load(entity_type::VARIATION, variation_id)?;
        let store = self.load(entity_type::STORE, store_id)?;

        let scope = self.config.cart_scope.as_str();
        let cart = match self.carts.get_cart(scope, &store) {
            Some(cart) => cart,
            None => {
                let cart = self.carts.create_cart(scope, &store)?;
                info!(order = %cart.order_id, store = %store.id, scope, "created cart");
                cart
            }
        };

        self.manager.add_entity(&cart, &variation)?;
        debug!(
            order = %cart.order_id,
            product = %product.id,
            variation = %variation.id,
            "added to cart"
        );

        Ok(Redirect::found(self.config.cart_page.clone()))
    }

    fn load(&self, entity_type: &str, id: EntityId) -> Result<Entity, CartError> {
        self.entities
            .load(entity_type, id)
            .ok_or_else(|| CartError::NotFound {
                entity_type: entity_type.to_string(),
                id,
            })
    }
}

fn default_target(product: &Entity, field: &str) -> Result<EntityId, CartError> {
    product
        .first_target(field)
        .ok_or_else(|| CartError::MissingDefault {
            product: product.id,
            field: field.to_string(),
        })
}
