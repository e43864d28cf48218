use super::{ORDER_ROUTE_PARAMETER, RouteContext, RouteValue, fields};
use crate::store::EntityStore;
use crate::types::{Entity, EntityId, entity_type};
use tracing::debug;

/// Read side of the cart: what is in the order on the current route.
pub struct CartContext<'a> {
    route: &'a dyn RouteContext,
    entities: &'a dyn EntityStore,
}

impl<'a> CartContext<'a> {
    pub fn new(route: &'a dyn RouteContext, entities: &'a dyn EntityStore) -> Self {
        Self { route, entities }
    }

    /// The order named by the `commerce_order` route parameter.
    pub fn current_order(&self) -> Option<Entity> {
        match self.route.parameter(ORDER_ROUTE_PARAMETER)? {
            RouteValue::Entity(order) => Some(order),
            RouteValue::Raw(raw) => {
                let Ok(id) = raw.trim().parse::<u64>() else {
                    debug!(value = %raw, "order route parameter is not an id");
                    return None;
                };
                self.entities.load(entity_type::ORDER, EntityId(id))
            }
        }
    }

    /// Parent products of every purchased variation in the current order.
    ///
    /// One entry per order item, so a product bought twice appears twice.
    /// Items whose variation or product cannot be loaded are skipped.
    pub fn current_cart_products(&self) -> Vec<Entity> {
        let Some(order) = self.current_order() else {
            return Vec::new();
        };
        order
            .targets(fields::ORDER_ITEMS)
            .into_iter()
            .filter_map(|item_id| self.product_for_item(item_id))
            .collect()
    }

    fn product_for_item(&self, item_id: EntityId) -> Option<Entity> {
        let item = self.entities.load(entity_type::ORDER_ITEM, item_id)?;
        let Some(variation_id) = item.first_target(fields::PURCHASED_ENTITY) else {
            debug!(item = %item_id, "order item has no purchased entity");
            return None;
        };
        let variation = self.entities.load(entity_type::VARIATION, variation_id)?;
        let product_id = variation.first_target(fields::PRODUCT_ID)?;
        self.entities.load(entity_type::PRODUCT, product_id)
    }
}
