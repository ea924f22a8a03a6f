use super::expr::ProductAttributes;

/// Mandatory filter applied on top of every collection predicate:
/// same store, published and already available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub store_id: i64,
    pub now_ns: i64,
}

impl Visibility {
    pub fn new(store_id: i64, now_ns: i64) -> Self {
        Self { store_id, now_ns }
    }

    pub fn admits<P: ProductAttributes + ?Sized>(&self, product: &P) -> bool {
        product.store_id() == self.store_id
            && product.published()
            && product.date_available_ns() <= self.now_ns
    }
}
