pub mod cart;
pub mod collection;
pub mod media;
pub mod money;
pub mod order_status;
pub mod slug;
pub mod uploads;

pub use cart::CartError;
pub use collection::{
    CollectionRules, CombinationMode, Condition, ConditionError, Expr, FieldReference, FilterType,
    ProductAttributes, ValidCondition, Visibility,
};
pub use media::{MediaKind, ProductMediaSet};
pub use order_status::{OrderStatus, OrderStatusError};
