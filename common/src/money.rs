//! Store currency amounts. Amounts carry at most two fractional digits and are
//! persisted as integer cents.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_CURRENCY: &str = "CAD";
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Parse a decimal amount with at most two fractional digits
pub fn parse_amount(value: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|_| format!("'{}' is not a decimal number", value))?;
    let amount = amount.normalize();
    if amount.scale() > AMOUNT_DECIMAL_PLACES {
        return Err(format!(
            "'{}' has more than {} decimal places",
            value, AMOUNT_DECIMAL_PLACES
        ));
    }
    Ok(amount)
}

/// Whole cents for an amount, `None` when it does not fit in an `i64`
pub fn to_cents(amount: Decimal) -> Option<i64> {
    amount.checked_mul(Decimal::ONE_HUNDRED)?.round().to_i64()
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, AMOUNT_DECIMAL_PLACES)
}

/// Render cents as a fixed two-place string, e.g. `"5.00"`
pub fn format_cents(cents: i64) -> String {
    from_cents(cents).to_string()
}

/// Priced quantity of one product in a cart or order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub price_cents: i64,
    pub quantity: i64,
}

impl PricedLine {
    pub fn total_cents(&self) -> Option<i64> {
        self.price_cents.checked_mul(self.quantity)
    }
}

/// Sum of all line totals, `None` on overflow
pub fn total_cents<'a, I>(lines: I) -> Option<i64>
where
    I: IntoIterator<Item = &'a PricedLine>,
{
    lines
        .into_iter()
        .try_fold(0i64, |acc, line| acc.checked_add(line.total_cents()?))
}
