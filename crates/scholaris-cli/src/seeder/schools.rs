//! School seeding.

use fake::Fake;
use fake::faker::address::en::*;
use rayon::prelude::*;
use scholaris_models::ids::SchoolId;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

use super::models::{SEED_SCHOOL_SUFFIX, SchoolSeed};

/// Generates school names in parallel. The index keeps names unique.
pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let city: String = CityName().fake();
            SchoolSeed {
                name: format!("{} Academy {} {}", city, idx + 1, SEED_SCHOOL_SUFFIX),
            }
        })
        .collect()
}

pub async fn seed_schools(
    db: &PgPool,
    count: usize,
) -> Result<Vec<SchoolId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} schools...", count);

    let schools = generate_schools(count);
    let mut tx = db.begin().await?;
    let school_ids = insert_schools_chunk(&mut tx, &schools).await?;
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} schools in {:?}",
        school_ids.len(),
        start_time.elapsed()
    );

    Ok(school_ids)
}

async fn insert_schools_chunk(
    tx: &mut Transaction<'_, Postgres>,
    schools: &[SchoolSeed],
) -> Result<Vec<SchoolId>, Box<dyn std::error::Error>> {
    if schools.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from("INSERT INTO schools (name) VALUES ");
    for i in 0..schools.len() {
        if i > 0 {
            query.push_str(", ");
        }
        query.push_str(&format!("(${})", i + 1));
    }
    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar::<_, SchoolId>(&query);
    for school in schools {
        q = q.bind(&school.name);
    }

    let ids = q.fetch_all(&mut **tx).await?;
    Ok(ids)
}

/// Ids of every school created by the seeder.
pub async fn seeded_school_ids(db: &PgPool) -> Result<Vec<SchoolId>, sqlx::Error> {
    sqlx::query_scalar::<_, SchoolId>("SELECT id FROM schools WHERE name LIKE '%' || $1")
        .bind(SEED_SCHOOL_SUFFIX)
        .fetch_all(db)
        .await
}
