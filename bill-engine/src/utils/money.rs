//! Money calculation utilities using rust_decimal for precision
//!
//! Records carry money as `f64`. Every sum, difference and comparison is
//! done in `Decimal`, then rounded to 2 decimal places (half-up) for storage.

use rust_decimal::prelude::*;
use shared::models::{KitchenOrderBody, LineItem};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed amount for a single tender or discount
const MAX_AMOUNT: f64 = 10_000_000.0;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate a user-entered amount: finite, non-negative, bounded
pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_AMOUNT).contains(&value)
}

/// price × quantity
pub fn line_amount(price: f64, quantity: u32) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

/// Σ price × quantity over bill lines
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items
        .iter()
        .map(|item| line_amount(item.price, item.quantity))
        .sum()
}

/// subtotal − discount
pub fn total(subtotal: Decimal, discount: f64) -> Decimal {
    subtotal - to_decimal(discount)
}

/// Σ price × quantity over a kitchen order body
pub fn order_subtotal(body: &KitchenOrderBody) -> Decimal {
    body.entries()
        .into_iter()
        .map(|(item, quantity)| line_amount(item.item_price, quantity))
        .sum()
}

/// Compare two amounts with the 0.01 tolerance
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{BatchEntry, ItemSnapshot};

    fn line(price: f64, quantity: u32) -> LineItem {
        LineItem {
            id: format!("item-{}", price),
            name: "Item".to_string(),
            price,
            item_type: None,
            quantity,
            original_quantity: quantity,
            pending_kot_qty: 0,
            order_refs: vec![],
        }
    }

    #[test]
    fn test_subtotal_avoids_float_drift() {
        let items = vec![line(0.1, 3), line(0.2, 1)];
        assert_eq!(to_f64(subtotal(&items)), 0.5);
    }

    #[test]
    fn test_total_subtracts_discount() {
        let items = vec![line(100.0, 2), line(45.5, 1)];
        let sub = subtotal(&items);
        assert_eq!(to_f64(sub), 245.5);
        assert_eq!(to_f64(total(sub, 20.25)), 225.25);
    }

    #[test]
    fn test_order_subtotal() {
        let body = KitchenOrderBody::Batch {
            items: vec![
                BatchEntry {
                    item: ItemSnapshot {
                        item_id: "a".into(),
                        item_name: "A".into(),
                        item_price: 120.0,
                    },
                    quantity: 2,
                },
                BatchEntry {
                    item: ItemSnapshot {
                        item_id: "b".into(),
                        item_name: "B".into(),
                        item_price: 35.0,
                    },
                    quantity: 1,
                },
            ],
        };
        assert_eq!(to_f64(order_subtotal(&body)), 275.0);
    }

    #[test]
    fn test_money_eq_and_validation() {
        assert!(money_eq(10.0, 10.004));
        assert!(!money_eq(10.0, 10.02));
        assert!(is_valid_amount(0.0));
        assert!(!is_valid_amount(-1.0));
        assert!(!is_valid_amount(f64::NAN));
        assert!(!is_valid_amount(f64::INFINITY));
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(to_f64(Decimal::new(12345, 3)), 12.35);
        assert_eq!(to_f64(Decimal::new(-12345, 3)), -12.35);
    }
}
