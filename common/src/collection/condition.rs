use super::errors::ConditionError;
use super::expr::Expr;
use super::field::{FieldReference, FilterType};
use serde::{Deserialize, Serialize};

/// A single field/operator/value clause owned by a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field_reference: FieldReference,
    pub filter_type: FilterType,
    pub field_val: String,
}

impl Condition {
    pub fn new(
        field_reference: FieldReference,
        filter_type: FilterType,
        field_val: impl Into<String>,
    ) -> Self {
        Self {
            field_reference,
            filter_type,
            field_val: field_val.into(),
        }
    }

    /// Check the operator against the field's operator table and parse the
    /// value, producing the single-field predicate for this condition.
    pub fn validate(&self) -> Result<ValidCondition, ConditionError> {
        let field = self.field_reference;
        if !field.accepts(self.filter_type) {
            return Err(ConditionError::InvalidOperator {
                field,
                filter_type: self.filter_type,
            });
        }

        let operand = field.parse_operand(&self.field_val)?;
        let comparison = Expr::compare(field, self.filter_type.compare_op(), operand);
        let predicate = if self.filter_type.is_negative() {
            comparison.negate()
        } else {
            comparison
        };

        Ok(ValidCondition {
            condition: self.clone(),
            predicate,
        })
    }
}

/// A condition that passed validation, together with its predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCondition {
    condition: Condition,
    predicate: Expr,
}

impl ValidCondition {
    pub fn field_reference(&self) -> FieldReference {
        self.condition.field_reference
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }
}

impl TryFrom<Condition> for ValidCondition {
    type Error = ConditionError;

    fn try_from(condition: Condition) -> Result<Self, Self::Error> {
        condition.validate()
    }
}
