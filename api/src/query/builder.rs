//! Translates a collection predicate into a SQLite WHERE fragment over
//! `products p`. Values are always bound, never interpolated.

use storefront_common::collection::{CompareOp, Comparison, Expr, Operand, Visibility};
use storefront_common::{money, FieldReference};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Where a field lives relative to `products p`
enum FieldTarget {
    Column(&'static str),
    /// Folded name of the product's type, if any
    TypeName,
    /// Folded name of any of the product's tags
    TagName,
}

fn field_target(field: FieldReference) -> FieldTarget {
    match field {
        FieldReference::Type => FieldTarget::TypeName,
        FieldReference::Title => FieldTarget::Column("p.title_folded"),
        FieldReference::Tag => FieldTarget::TagName,
        FieldReference::Stock => FieldTarget::Column("p.stock"),
        FieldReference::Price => FieldTarget::Column("p.price_cents"),
    }
}

/// Builds the WHERE fragment for `expr`, placeholders in binding order
pub fn build_sql(expr: &Expr) -> Result<SqlFragment, String> {
    let mut values = Vec::new();
    let sql = build_expr(expr, &mut values)?;
    Ok(SqlFragment { sql, values })
}

/// Store scope plus published and available-by-date
pub fn visibility_sql(visibility: &Visibility) -> SqlFragment {
    SqlFragment {
        sql: "p.store_id = ? AND p.published = 1 AND p.date_available_ns <= ?".to_string(),
        values: vec![
            SqlValue::Integer(visibility.store_id),
            SqlValue::Integer(visibility.now_ns),
        ],
    }
}

fn build_expr(expr: &Expr, values: &mut Vec<SqlValue>) -> Result<String, String> {
    match expr {
        Expr::Compare(comparison) => build_comparison(comparison, values),
        Expr::Not(inner) => Ok(format!("NOT ({})", build_expr(inner, values)?)),
        Expr::And(parts) => build_junction(parts, " AND ", "1", values),
        Expr::Or(parts) => build_junction(parts, " OR ", "0", values),
    }
}

fn build_junction(
    parts: &[Expr],
    separator: &str,
    empty: &str,
    values: &mut Vec<SqlValue>,
) -> Result<String, String> {
    if parts.is_empty() {
        return Ok(empty.to_string());
    }
    let sql_parts = parts
        .iter()
        .map(|part| build_expr(part, values))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", sql_parts.join(separator)))
}

fn build_comparison(comparison: &Comparison, values: &mut Vec<SqlValue>) -> Result<String, String> {
    match field_target(comparison.field) {
        FieldTarget::Column(column) => match comparison.field {
            FieldReference::Stock | FieldReference::Price => {
                build_numeric_clause(column, comparison, values)
            }
            _ => build_text_clause(column, comparison, values),
        },
        FieldTarget::TypeName => {
            let clause = build_text_clause("ty.name_folded", comparison, values)?;
            Ok(format!(
                "EXISTS (SELECT 1 FROM product_types ty WHERE ty.id = p.product_type_id AND {})",
                clause
            ))
        }
        FieldTarget::TagName => {
            let clause = build_text_clause("tg.name_folded", comparison, values)?;
            Ok(format!(
                "EXISTS (SELECT 1 FROM product_tags ptg JOIN tags tg ON tg.id = ptg.tag_id WHERE ptg.product_id = p.id AND {})",
                clause
            ))
        }
    }
}

fn build_text_clause(
    column: &str,
    comparison: &Comparison,
    values: &mut Vec<SqlValue>,
) -> Result<String, String> {
    let Operand::Text(needle) = &comparison.operand else {
        return Err(format!(
            "Type mismatch: {:?} cannot be used with text field {}",
            comparison.operand, comparison.field
        ));
    };
    let needle = needle.to_lowercase();
    let (sql, value) = match comparison.op {
        CompareOp::Equal => (format!("{} = ?", column), needle),
        CompareOp::StartsWith => (like_clause(column), format!("{}%", escape_like(&needle))),
        CompareOp::EndsWith => (like_clause(column), format!("%{}", escape_like(&needle))),
        CompareOp::Contains => (like_clause(column), format!("%{}%", escape_like(&needle))),
        CompareOp::GreaterOrEqual | CompareOp::LessOrEqual => {
            return Err(format!(
                "Invalid operator {:?} for text field {}",
                comparison.op, comparison.field
            ))
        }
    };
    values.push(SqlValue::String(value));
    Ok(sql)
}

fn build_numeric_clause(
    column: &str,
    comparison: &Comparison,
    values: &mut Vec<SqlValue>,
) -> Result<String, String> {
    let op = match comparison.op {
        CompareOp::Equal => "=",
        CompareOp::GreaterOrEqual => ">=",
        CompareOp::LessOrEqual => "<=",
        CompareOp::StartsWith | CompareOp::EndsWith | CompareOp::Contains => {
            return Err(format!(
                "Invalid operator {:?} for numeric field {}",
                comparison.op, comparison.field
            ))
        }
    };
    let value = numeric_value(comparison)?;
    values.push(SqlValue::Integer(value));
    Ok(format!("{} {} ?", column, op))
}

/// Stock compares whole units, price compares cents
fn numeric_value(comparison: &Comparison) -> Result<i64, String> {
    let out_of_range = || format!("Value out of range for field {}", comparison.field);
    match (comparison.field, &comparison.operand) {
        (FieldReference::Stock, Operand::Integer(i)) => Ok(*i),
        (FieldReference::Price, Operand::Integer(i)) => i.checked_mul(100).ok_or_else(out_of_range),
        (FieldReference::Price, Operand::Decimal(d)) => {
            if d.normalize().scale() > money::AMOUNT_DECIMAL_PLACES {
                return Err(format!("Price {} has more than two decimal places", d));
            }
            money::to_cents(*d).ok_or_else(out_of_range)
        }
        (field, operand) => Err(format!(
            "Type mismatch: {:?} cannot be used with {}",
            operand, field
        )),
    }
}

fn like_clause(column: &str) -> String {
    format!("{} LIKE ? ESCAPE '\\'", column)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
