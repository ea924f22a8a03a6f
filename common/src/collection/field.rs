use super::errors::ConditionError;
use super::expr::{CompareOp, Operand};
use crate::money;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Product attribute a condition examines.
///
/// Declaration order is the stored ordering of conditions within a collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldReference {
    /// Name of the product type (nullable on the product)
    Type,
    Title,
    /// Any of the product's tag names
    Tag,
    Stock,
    Price,
}

/// How a field's value is compared
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
}

/// Operator of a condition as authored by the store owner
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
}

const TEXT_OPERATORS: &[FilterType] = &[
    FilterType::Equal,
    FilterType::NotEqual,
    FilterType::StartsWith,
    FilterType::EndsWith,
    FilterType::Contains,
    FilterType::NotContains,
];

const NUMERIC_OPERATORS: &[FilterType] = &[
    FilterType::Equal,
    FilterType::NotEqual,
    FilterType::GreaterOrEqual,
    FilterType::LessOrEqual,
];

impl FieldReference {
    pub const ALL: [FieldReference; 5] = [
        FieldReference::Type,
        FieldReference::Title,
        FieldReference::Tag,
        FieldReference::Stock,
        FieldReference::Price,
    ];

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldReference::Type | FieldReference::Title | FieldReference::Tag => FieldKind::Text,
            FieldReference::Stock => FieldKind::Integer,
            FieldReference::Price => FieldKind::Decimal,
        }
    }

    /// Operators that may be used with this field
    pub fn legal_operators(&self) -> &'static [FilterType] {
        match self.kind() {
            FieldKind::Text => TEXT_OPERATORS,
            FieldKind::Integer | FieldKind::Decimal => NUMERIC_OPERATORS,
        }
    }

    pub fn accepts(&self, filter_type: FilterType) -> bool {
        self.legal_operators().contains(&filter_type)
    }

    /// Parse a raw condition value into the operand this field compares against
    pub fn parse_operand(&self, raw: &str) -> Result<Operand, ConditionError> {
        let value = raw.trim();
        match self.kind() {
            FieldKind::Text => Ok(Operand::text(value)),
            FieldKind::Integer => value
                .parse::<i64>()
                .map(Operand::Integer)
                .map_err(|_| self.invalid_value(raw, "expected a whole number")),
            FieldKind::Decimal => {
                let amount =
                    money::parse_amount(value).map_err(|reason| self.invalid_value(raw, &reason))?;
                if money::to_cents(amount).is_none() {
                    return Err(self.invalid_value(raw, "amount is out of range"));
                }
                Ok(Operand::Decimal(amount))
            }
        }
    }

    fn invalid_value(&self, raw: &str, reason: &str) -> ConditionError {
        ConditionError::InvalidValue {
            field: *self,
            value: raw.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldReference::Type => "type",
            FieldReference::Title => "title",
            FieldReference::Tag => "tag",
            FieldReference::Stock => "stock",
            FieldReference::Price => "price",
        }
    }
}

impl std::fmt::Display for FieldReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "type" => Ok(FieldReference::Type),
            "title" => Ok(FieldReference::Title),
            "tag" => Ok(FieldReference::Tag),
            "stock" => Ok(FieldReference::Stock),
            "price" => Ok(FieldReference::Price),
            _ => Err(format!("Unknown field reference: {}", s)),
        }
    }
}

impl FilterType {
    /// Negative operators are the positive comparison wrapped in NOT
    pub fn is_negative(&self) -> bool {
        matches!(self, FilterType::NotEqual | FilterType::NotContains)
    }

    /// The positive comparison underlying this operator
    pub fn compare_op(&self) -> CompareOp {
        match self {
            FilterType::Equal | FilterType::NotEqual => CompareOp::Equal,
            FilterType::GreaterOrEqual => CompareOp::GreaterOrEqual,
            FilterType::LessOrEqual => CompareOp::LessOrEqual,
            FilterType::StartsWith => CompareOp::StartsWith,
            FilterType::EndsWith => CompareOp::EndsWith,
            FilterType::Contains | FilterType::NotContains => CompareOp::Contains,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Equal => "equal",
            FilterType::NotEqual => "not_equal",
            FilterType::GreaterOrEqual => "greater_or_equal",
            FilterType::LessOrEqual => "less_or_equal",
            FilterType::StartsWith => "starts_with",
            FilterType::EndsWith => "ends_with",
            FilterType::Contains => "contains",
            FilterType::NotContains => "not_contains",
        }
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equal" => Ok(FilterType::Equal),
            "not_equal" => Ok(FilterType::NotEqual),
            "greater_or_equal" => Ok(FilterType::GreaterOrEqual),
            "less_or_equal" => Ok(FilterType::LessOrEqual),
            "starts_with" => Ok(FilterType::StartsWith),
            "ends_with" => Ok(FilterType::EndsWith),
            "contains" => Ok(FilterType::Contains),
            "not_contains" => Ok(FilterType::NotContains),
            _ => Err(format!("Unknown filter type: {}", s)),
        }
    }
}
