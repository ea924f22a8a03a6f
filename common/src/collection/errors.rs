use super::field::{FieldReference, FilterType};
use thiserror::Error;

/// Rejection of a condition at create/update time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("operator {filter_type} is not allowed for field {field}")]
    InvalidOperator {
        field: FieldReference,
        filter_type: FilterType,
    },
    #[error("invalid value {value:?} for field {field}: {reason}")]
    InvalidValue {
        field: FieldReference,
        value: String,
        reason: String,
    },
}
