//! Student seeding, with opening wallet balances.
//!
//! Every opening balance is written together with a matching `topup` ledger
//! row, so a seeded wallet still equals the sum of its transactions.

use fake::Fake;
use fake::faker::name::en::*;
use rayon::prelude::*;
use rust_decimal::Decimal;
use scholaris_models::{
    WalletTxnType,
    ids::{SchoolId, StudentId, UserId},
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use std::time::Instant;

use super::models::StudentSeed;

const BATCH_SIZE: usize = 1000;
const GRADES: [&str; 6] = ["Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6"];

/// Generates `children_per_parent` students for each parent, sharing the parent's surname.
pub fn generate_students(
    parents: &[(UserId, SchoolId)],
    children_per_parent: usize,
) -> Vec<StudentSeed> {
    parents
        .par_iter()
        .enumerate()
        .flat_map(|(parent_idx, &(parent_id, school_id))| {
            let last_name: String = LastName().fake();
            (0..children_per_parent)
                .map(|child_idx| {
                    let first_name: String = FirstName().fake();
                    let balance_cents: i64 = (0..50_000).fake();
                    let daily_limit = if child_idx % 2 == 0 {
                        Some(Decimal::new((10..50).fake::<i64>(), 0))
                    } else {
                        None
                    };

                    StudentSeed {
                        school_id,
                        parent_id,
                        full_name: format!("{} {}", first_name, last_name),
                        grade: GRADES[(parent_idx + child_idx) % GRADES.len()].to_string(),
                        wallet_balance: Decimal::new(balance_cents, 2),
                        daily_spending_limit: daily_limit,
                        nfc_card_id: format!("SEED-{:05}-{:02}", parent_idx, child_idx),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_students(
    db: &PgPool,
    parents: &[(UserId, SchoolId)],
    children_per_parent: usize,
) -> Result<Vec<StudentId>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let students = generate_students(parents, children_per_parent);
    println!("🎒 Seeding {} students with wallets...", students.len());

    let mut tx = db.begin().await?;
    let mut all_ids = Vec::with_capacity(students.len());

    for chunk in students.chunks(BATCH_SIZE) {
        let ids = insert_students_chunk(&mut tx, chunk).await?;
        insert_opening_balances(&mut tx, &ids, chunk).await?;
        all_ids.extend(ids);
    }

    tx.commit().await?;

    println!(
        "   ✓ Inserted {} students in {:?}",
        all_ids.len(),
        start_time.elapsed()
    );
    Ok(all_ids)
}

async fn insert_students_chunk(
    tx: &mut Transaction<'_, Postgres>,
    students: &[StudentSeed],
) -> Result<Vec<StudentId>, sqlx::Error> {
    if students.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO students (school_id, parent_id, full_name, grade, wallet_balance, \
         daily_spending_limit, nfc_card_id, is_nfc_active) ",
    );
    qb.push_values(students, |mut row, student| {
        row.push_bind(student.school_id)
            .push_bind(student.parent_id)
            .push_bind(&student.full_name)
            .push_bind(&student.grade)
            .push_bind(student.wallet_balance)
            .push_bind(student.daily_spending_limit)
            .push_bind(&student.nfc_card_id)
            .push_bind(true);
    });
    qb.push(" RETURNING id");

    qb.build_query_scalar::<StudentId>().fetch_all(&mut **tx).await
}

async fn insert_opening_balances(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[StudentId],
    students: &[StudentSeed],
) -> Result<(), sqlx::Error> {
    let funded: Vec<_> = ids
        .iter()
        .zip(students)
        .filter(|(_, student)| student.wallet_balance > Decimal::ZERO)
        .collect();

    if funded.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO wallet_transactions (student_id, school_id, amount, txn_type, description) ",
    );
    qb.push_values(funded, |mut row, (id, student)| {
        row.push_bind(*id)
            .push_bind(student.school_id)
            .push_bind(student.wallet_balance)
            .push_bind(WalletTxnType::Topup)
            .push_bind("Opening balance");
    });

    qb.build().execute(&mut **tx).await?;
    Ok(())
}
