//! Server-side order pricing. Client-supplied prices are never trusted; lines
//! are priced from the catalogue rows the order resolved to.

use std::collections::HashMap;

use rust_decimal::Decimal;

use scholaris_models::{canteen::CanteenItem, ids::CanteenItemId};

use crate::modules::pos::model::{MAX_LINE_QUANTITY, OrderLineDto};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub item_id: CanteenItemId,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// `max(1, floor(q))`, capped at the per-line maximum.
pub fn clamp_quantity(quantity: f64) -> i32 {
    let floored = quantity.floor();
    if floored.is_nan() || floored < 1.0 {
        1
    } else if floored >= f64::from(MAX_LINE_QUANTITY) {
        MAX_LINE_QUANTITY
    } else {
        floored as i32
    }
}

/// Distinct item ids in request order.
pub fn distinct_item_ids(lines: &[OrderLineDto]) -> Vec<CanteenItemId> {
    let mut ids = Vec::with_capacity(lines.len());
    for line in lines {
        if !ids.contains(&line.id) {
            ids.push(line.id);
        }
    }
    ids
}

/// Prices every line against `items`. Returns `None` if a line names an item
/// that is not in `items`.
pub fn price_order(lines: &[OrderLineDto], items: &[CanteenItem]) -> Option<(Vec<PricedLine>, Decimal)> {
    let catalogue: HashMap<CanteenItemId, &CanteenItem> =
        items.iter().map(|item| (item.id, item)).collect();

    let mut priced = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for line in lines {
        let item = catalogue.get(&line.id)?;
        let quantity = clamp_quantity(line.quantity);
        let line_total = item.price * Decimal::from(quantity);
        total += line_total;

        priced.push(PricedLine {
            item_id: item.id,
            item_name: item.name.clone(),
            quantity,
            unit_price: item.price,
            line_total,
        });
    }

    Some((priced, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scholaris_models::ids::SchoolId;

    fn item(name: &str, price: &str) -> CanteenItem {
        CanteenItem {
            id: CanteenItemId::new(),
            school_id: SchoolId::new(),
            name: name.to_string(),
            price: price.parse().unwrap(),
            category: None,
            is_available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: CanteenItemId, quantity: f64) -> OrderLineDto {
        OrderLineDto { id, quantity }
    }

    #[test]
    fn test_quantity_clamping() {
        assert_eq!(clamp_quantity(2.9), 2);
        assert_eq!(clamp_quantity(0.4), 1);
        assert_eq!(clamp_quantity(-3.0), 1);
        assert_eq!(clamp_quantity(1.0), 1);
        assert_eq!(clamp_quantity(500.0), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let sandwich = item("Sandwich", "2.50");
        let juice = item("Juice", "1.25");

        let (lines, total) = price_order(
            &[line(sandwich.id, 2.0), line(juice.id, 3.7)],
            &[sandwich.clone(), juice.clone()],
        )
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total, "5.00".parse::<Decimal>().unwrap());
        assert_eq!(lines[1].quantity, 3);
        assert_eq!(lines[1].line_total, "3.75".parse::<Decimal>().unwrap());
        assert_eq!(total, "8.75".parse::<Decimal>().unwrap());
        assert_eq!(lines[0].item_name, "Sandwich");
    }

    #[test]
    fn test_unknown_item_rejected() {
        let sandwich = item("Sandwich", "2.50");
        assert!(price_order(&[line(CanteenItemId::new(), 1.0)], &[sandwich]).is_none());
    }

    #[test]
    fn test_repeated_item_keeps_separate_lines() {
        let juice = item("Juice", "1.00");
        let lines = [line(juice.id, 1.0), line(juice.id, 2.0)];

        assert_eq!(distinct_item_ids(&lines), vec![juice.id]);
        let (priced, total) = price_order(&lines, &[juice]).unwrap();
        assert_eq!(priced.len(), 2);
        assert_eq!(total, Decimal::from(3));
    }
}
