use thiserror::Error;

/// Number of days a new cart stays valid
pub const DEFAULT_CART_LIFETIME_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart {0} is no longer active")]
    Inactive(String),
    #[error("product {product_id} does not belong to this cart's store")]
    ForeignProduct { product_id: i64 },
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
    #[error("cart {0} is empty")]
    Empty(String),
    #[error("cart total is out of range")]
    AmountOverflow,
}

pub fn validate_quantity(quantity: i64) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    Ok(())
}
