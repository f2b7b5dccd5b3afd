//! Canteen menu seeding.

use fake::Fake;
use rust_decimal::Decimal;
use scholaris_models::ids::SchoolId;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Instant;

use super::models::ItemSeed;

/// The menu every seeded canteen starts with, as `(name, category)`.
const MENU: [(&str, &str); 10] = [
    ("Cheese Sandwich", "Sandwiches"),
    ("Chicken Wrap", "Sandwiches"),
    ("Falafel Pita", "Sandwiches"),
    ("Orange Juice", "Drinks"),
    ("Water Bottle", "Drinks"),
    ("Chocolate Milk", "Drinks"),
    ("Apple", "Fruit"),
    ("Banana", "Fruit"),
    ("Granola Bar", "Snacks"),
    ("Blueberry Muffin", "Snacks"),
];

pub fn generate_items(school_ids: &[SchoolId]) -> Vec<ItemSeed> {
    school_ids
        .iter()
        .flat_map(|&school_id| {
            MENU.iter().map(move |(name, category)| ItemSeed {
                school_id,
                name: (*name).to_string(),
                price: Decimal::new((50..600).fake::<i64>(), 2),
                category: (*category).to_string(),
            })
        })
        .collect()
}

pub async fn seed_items(
    db: &PgPool,
    school_ids: &[SchoolId],
) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let items = generate_items(school_ids);
    println!("🥪 Seeding {} canteen items...", items.len());

    if items.is_empty() {
        return Ok(0);
    }

    let mut qb =
        QueryBuilder::<Postgres>::new("INSERT INTO canteen_items (school_id, name, price, category) ");
    qb.push_values(&items, |mut row, item| {
        row.push_bind(item.school_id)
            .push_bind(&item.name)
            .push_bind(item.price)
            .push_bind(&item.category);
    });

    let inserted = qb.build().execute(db).await?.rows_affected();

    println!(
        "   ✓ Inserted {} canteen items in {:?}",
        inserted,
        start_time.elapsed()
    );
    Ok(inserted)
}
