use uuid::Uuid;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(Uuid),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Invalid addons format. Must be an array of addon objects.")]
    InvalidAddons,

    #[error("Cannot transition order from '{from}' to '{to}'")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is already assigned to a delivery partner")]
    AlreadyAssigned,

    #[error("Order is not assigned to this delivery partner")]
    PartnerMismatch,
}

impl OrderError {
    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        Self::InvalidStatusTransition { from, to }
    }
}
