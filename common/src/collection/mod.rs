//! Dynamic collections: conditions authored by store owners compiled into a
//! predicate over the product catalog.

mod compiler;
mod condition;
mod errors;
mod expr;
mod field;
mod rules;
mod visibility;

pub use compiler::{compile, group_by_field, ConditionGroup};
pub use condition::{Condition, ValidCondition};
pub use errors::ConditionError;
pub use expr::{CompareOp, Comparison, Expr, Operand, ProductAttributes};
pub use field::{FieldKind, FieldReference, FilterType};
pub use rules::{CollectionRules, CombinationMode};
pub use visibility::Visibility;
