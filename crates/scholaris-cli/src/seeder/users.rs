//! Staff and parent account seeding.

use fake::Fake;
use fake::faker::name::en::*;
use rayon::prelude::*;
use scholaris_models::{
    Role,
    ids::{SchoolId, UserId},
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::time::Instant;

use super::models::{SEED_EMAIL_DOMAIN, UserSeed, UsersPerSchool};

const BATCH_SIZE: usize = 1000;

/// Generates staff accounts for each school.
pub fn generate_staff_users(school_ids: &[SchoolId], per_school: &UsersPerSchool) -> Vec<UserSeed> {
    school_ids
        .par_iter()
        .enumerate()
        .flat_map(|(school_idx, &school_id)| {
            let staff = [
                (Role::SchoolAdmin, per_school.admins, "admin"),
                (Role::Finance, per_school.finance, "finance"),
                (Role::CanteenStaff, per_school.canteen_staff, "canteen"),
            ];

            staff
                .into_iter()
                .flat_map(|(role, count, prefix)| {
                    (0..count).map(move |user_idx| {
                        generate_user(role, school_id, school_idx, user_idx, prefix)
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Generates parent accounts for each school.
pub fn generate_parents(school_ids: &[SchoolId], parents_per_school: usize) -> Vec<UserSeed> {
    school_ids
        .par_iter()
        .enumerate()
        .flat_map(|(school_idx, &school_id)| {
            (0..parents_per_school)
                .map(|user_idx| generate_user(Role::Parent, school_id, school_idx, user_idx, "parent"))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn generate_user(
    role: Role,
    school_id: SchoolId,
    school_idx: usize,
    user_idx: usize,
    prefix: &str,
) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    UserSeed {
        email: format!(
            "{}.s{}.{}@{}",
            prefix, school_idx, user_idx, SEED_EMAIL_DOMAIN
        ),
        full_name: format!("{} {}", first_name, last_name),
        role,
        school_id,
    }
}

pub async fn seed_staff(
    db: &PgPool,
    school_ids: &[SchoolId],
    per_school: &UsersPerSchool,
) -> Result<Vec<UserId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let users = generate_staff_users(school_ids, per_school);
    println!("👥 Seeding {} staff accounts...", users.len());

    let ids = insert_users_batch(db, &users).await?;

    println!(
        "   ✓ Inserted {} staff accounts in {:?}",
        ids.len(),
        start_time.elapsed()
    );
    Ok(ids)
}

/// Seeds parents and returns `(parent_id, school_id)` pairs for student generation.
pub async fn seed_parents(
    db: &PgPool,
    school_ids: &[SchoolId],
    parents_per_school: usize,
) -> Result<Vec<(UserId, SchoolId)>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let parents = generate_parents(school_ids, parents_per_school);
    println!("👪 Seeding {} parents...", parents.len());

    let ids = insert_users_batch(db, &parents).await?;
    let pairs: Vec<_> = ids
        .into_iter()
        .zip(parents.iter().map(|p| p.school_id))
        .collect();

    println!(
        "   ✓ Inserted {} parents in {:?}",
        pairs.len(),
        start_time.elapsed()
    );
    Ok(pairs)
}

/// Inserts users in batches. Ids come back in insertion order.
pub async fn insert_users_batch(
    db: &PgPool,
    users: &[UserSeed],
) -> Result<Vec<UserId>, Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;
    let mut all_ids = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let ids = insert_users_chunk(&mut tx, chunk).await?;
        all_ids.extend(ids);
    }

    tx.commit().await?;
    Ok(all_ids)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<UserId>, sqlx::Error> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO users (email, full_name, role, school_id) ");
    qb.push_values(users, |mut row, user| {
        row.push_bind(&user.email)
            .push_bind(&user.full_name)
            .push_bind(user.role)
            .push_bind(user.school_id);
    });
    qb.push(" RETURNING id");

    qb.build_query_scalar::<UserId>().fetch_all(&mut **tx).await
}
