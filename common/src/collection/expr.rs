use super::field::FieldReference;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Value a comparison is made against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// Case-folded text
    Text(String),
    Integer(i64),
    Decimal(Decimal),
}

impl Operand {
    pub fn text(value: &str) -> Self {
        Operand::Text(value.to_lowercase())
    }
}

/// Positive comparison; negation is expressed with [`Expr::Not`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Equal,
    StartsWith,
    EndsWith,
    Contains,
    GreaterOrEqual,
    LessOrEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: FieldReference,
    pub op: CompareOp,
    pub operand: Operand,
}

/// Boolean expression over named product field comparisons.
///
/// The tree is plain data so a catalog can translate it into its own query
/// language instead of evaluating it record by record. `And([])` is true and
/// `Or([])` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Compare(Comparison),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// Read access to the product attributes conditions and visibility look at
pub trait ProductAttributes {
    fn store_id(&self) -> i64;
    fn product_type(&self) -> Option<&str>;
    fn title(&self) -> &str;
    fn tags(&self) -> &[String];
    fn stock(&self) -> i64;
    fn price(&self) -> Decimal;
    fn published(&self) -> bool;
    fn date_available_ns(&self) -> i64;
}

impl Expr {
    pub fn compare(field: FieldReference, op: CompareOp, operand: Operand) -> Self {
        Expr::Compare(Comparison { field, op, operand })
    }

    /// Matches every product
    pub fn everything() -> Self {
        Expr::And(Vec::new())
    }

    /// Matches no product
    pub fn nothing() -> Self {
        Expr::Or(Vec::new())
    }

    pub fn negate(self) -> Self {
        match self {
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Conjunction; a single part is returned unwrapped
    pub fn all(mut parts: Vec<Expr>) -> Self {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Expr::And(parts)
    }

    /// Disjunction; a single part is returned unwrapped
    pub fn any(mut parts: Vec<Expr>) -> Self {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Expr::Or(parts)
    }

    pub fn matches<P: ProductAttributes + ?Sized>(&self, product: &P) -> bool {
        match self {
            Expr::Compare(comparison) => comparison.matches(product),
            Expr::Not(inner) => !inner.matches(product),
            Expr::And(parts) => parts.iter().all(|p| p.matches(product)),
            Expr::Or(parts) => parts.iter().any(|p| p.matches(product)),
        }
    }
}

impl Comparison {
    pub fn matches<P: ProductAttributes + ?Sized>(&self, product: &P) -> bool {
        match self.field {
            FieldReference::Type => product
                .product_type()
                .is_some_and(|name| self.matches_text(name)),
            FieldReference::Title => self.matches_text(product.title()),
            FieldReference::Tag => product.tags().iter().any(|tag| self.matches_text(tag)),
            FieldReference::Stock => self.matches_number(Decimal::from(product.stock())),
            FieldReference::Price => self.matches_number(product.price()),
        }
    }

    fn matches_text(&self, candidate: &str) -> bool {
        let Operand::Text(needle) = &self.operand else {
            return false;
        };
        let needle = needle.to_lowercase();
        let candidate = candidate.to_lowercase();
        match self.op {
            CompareOp::Equal => candidate == needle,
            CompareOp::StartsWith => candidate.starts_with(&needle),
            CompareOp::EndsWith => candidate.ends_with(&needle),
            CompareOp::Contains => candidate.contains(&needle),
            CompareOp::GreaterOrEqual | CompareOp::LessOrEqual => false,
        }
    }

    fn matches_number(&self, value: Decimal) -> bool {
        let target = match &self.operand {
            Operand::Integer(i) => Decimal::from(*i),
            Operand::Decimal(d) => *d,
            Operand::Text(_) => return false,
        };
        match self.op {
            CompareOp::Equal => value == target,
            CompareOp::GreaterOrEqual => value >= target,
            CompareOp::LessOrEqual => value <= target,
            CompareOp::StartsWith | CompareOp::EndsWith | CompareOp::Contains => false,
        }
    }
}
