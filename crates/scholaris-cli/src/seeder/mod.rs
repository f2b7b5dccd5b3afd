//! Database seeding for local development.
//!
//! Seeds schools, staff, parents, students with funded wallets, and a canteen
//! menu per school. Seeded rows are marked (school name suffix, email domain)
//! so [`clear_seeded_data`] removes them without touching real tenants.

pub mod items;
pub mod models;
pub mod schools;
pub mod students;
pub mod users;

use sqlx::PgPool;
use std::time::Instant;

pub use models::{SeedConfig, UsersPerSchool};

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("\n🌱 Starting database seeding...\n");

    let school_ids = schools::seed_schools(db, config.num_schools).await?;
    users::seed_staff(db, &school_ids, &config.users_per_school).await?;
    let parents = users::seed_parents(db, &school_ids, config.users_per_school.parents).await?;
    students::seed_students(db, &parents, config.children_per_parent).await?;
    items::seed_items(db, &school_ids).await?;

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    Ok(())
}

/// Child tables of a seeded school, in foreign-key order. Each statement takes
/// the seeded school ids as `$1`.
const CLEAR_STATEMENTS: [(&str, &str); 10] = [
    ("audit entries", "DELETE FROM audit_logs WHERE school_id = ANY($1)"),
    (
        "payments",
        "DELETE FROM payments WHERE invoice_id IN \
         (SELECT id FROM invoices_scoped WHERE school_id = ANY($1))",
    ),
    (
        "invoices",
        "DELETE FROM invoices WHERE student_id IN \
         (SELECT id FROM students WHERE school_id = ANY($1))",
    ),
    ("fee structures", "DELETE FROM fee_structures WHERE school_id = ANY($1)"),
    ("orders", "DELETE FROM pos_orders WHERE school_id = ANY($1)"),
    ("wallet transactions", "DELETE FROM wallet_transactions WHERE school_id = ANY($1)"),
    ("canteen items", "DELETE FROM canteen_items WHERE school_id = ANY($1)"),
    ("students", "DELETE FROM students WHERE school_id = ANY($1)"),
    ("users", "DELETE FROM users WHERE school_id = ANY($1)"),
    ("schools", "DELETE FROM schools WHERE id = ANY($1)"),
];

/// Removes every seeded school and everything that belongs to it.
pub async fn clear_seeded_data(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("\n🗑️  Clearing seeded data...\n");

    let school_ids = schools::seeded_school_ids(db).await?;
    if school_ids.is_empty() {
        println!("   Nothing to clear.");
        return Ok(());
    }

    let mut tx = db.begin().await?;
    for (label, statement) in CLEAR_STATEMENTS {
        let deleted = sqlx::query(statement)
            .bind(&school_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        println!("   ✓ Deleted {} {}", deleted, label);
    }
    tx.commit().await?;

    println!("\n✅ Clear complete in {:?}", start_time.elapsed());
    Ok(())
}
