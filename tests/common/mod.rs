#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use scholaris::modules::notifications::{NotificationDispatcher, OutgoingNotification};
use scholaris::modules::wallet::{LedgerEntry, process_transaction};
use scholaris::router::init_router;
use scholaris::state::AppState;
use scholaris::scholaris_auth::create_access_token;
use scholaris::scholaris_config::{CorsConfig, JwtConfig};
use scholaris::scholaris_models::{
    Role, WalletTxnType,
    ids::{CanteenItemId, SchoolId, StudentId, UserId},
};
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: axum::Router,
    /// Notifications queued by handlers; nothing consumes them in tests.
    pub notifications: mpsc::Receiver<OutgoingNotification>,
}

pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

pub fn setup_test_app(pool: PgPool) -> TestApp {
    dotenvy::dotenv().ok();
    let (notifier, notifications) = NotificationDispatcher::channel(16);
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        notifier,
    };

    TestApp {
        router: init_router(state),
        notifications,
    }
}

impl TestApp {
    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn generate_unique_school_name() -> String {
    format!("Test School {}", Uuid::new_v4())
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// Reads a money field from a response body.
pub fn money(value: &Value) -> Decimal {
    Decimal::try_from(value.as_f64().unwrap()).unwrap().round_dp(2)
}

pub fn token_for(user_id: UserId, email: &str) -> String {
    create_access_token(user_id.into_inner(), email, &JwtConfig::from_env()).unwrap()
}

pub async fn create_test_school(pool: &PgPool) -> SchoolId {
    sqlx::query_scalar::<_, SchoolId>("INSERT INTO schools (name) VALUES ($1) RETURNING id")
        .bind(generate_unique_school_name())
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_user(pool: &PgPool, role: Role, school_id: Option<SchoolId>) -> TestUser {
    let email = generate_unique_email();
    let id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (email, full_name, role, school_id) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&email)
    .bind("Test User")
    .bind(role)
    .bind(school_id)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        token: token_for(id, &email),
        email,
    }
}

pub async fn create_test_student(
    pool: &PgPool,
    school_id: SchoolId,
    parent_id: Option<UserId>,
    name: &str,
) -> StudentId {
    sqlx::query_scalar::<_, StudentId>(
        "INSERT INTO students (school_id, parent_id, full_name, grade) VALUES ($1, $2, $3, 'Grade 4') RETURNING id",
    )
    .bind(school_id)
    .bind(parent_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Funds a wallet through the ledger engine so balance and history agree.
pub async fn fund_wallet(pool: &PgPool, school_id: SchoolId, student_id: StudentId, amount: &str) {
    let mut conn = pool.acquire().await.unwrap();
    process_transaction(
        &mut conn,
        LedgerEntry {
            student_id,
            school_id,
            amount: dec(amount),
            txn_type: WalletTxnType::Topup,
            description: Some("Test funding".to_string()),
            created_by: None,
        },
    )
    .await
    .unwrap();
}

pub async fn set_card(pool: &PgPool, student_id: StudentId, nfc_id: &str, active: bool) {
    sqlx::query("UPDATE students SET nfc_card_id = $1, is_nfc_active = $2 WHERE id = $3")
        .bind(nfc_id)
        .bind(active)
        .bind(student_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_test_item(
    pool: &PgPool,
    school_id: SchoolId,
    name: &str,
    price: &str,
) -> CanteenItemId {
    sqlx::query_scalar::<_, CanteenItemId>(
        "INSERT INTO canteen_items (school_id, name, price, category) VALUES ($1, $2, $3, 'Snacks') RETURNING id",
    )
    .bind(school_id)
    .bind(name)
    .bind(dec(price))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn wallet_balance(pool: &PgPool, student_id: StudentId) -> Decimal {
    sqlx::query_scalar::<_, Decimal>("SELECT wallet_balance FROM students WHERE id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Sum of a student's ledger rows.
pub async fn ledger_total(pool: &PgPool, student_id: StudentId) -> Decimal {
    sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM wallet_transactions WHERE student_id = $1",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Number of ledger rows of one type for a student.
pub async fn ledger_count(pool: &PgPool, student_id: StudentId, txn_type: WalletTxnType) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM wallet_transactions WHERE student_id = $1 AND txn_type = $2",
    )
    .bind(student_id)
    .bind(txn_type)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn order_count(pool: &PgPool, student_id: StudentId) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pos_orders WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn audit_count(pool: &PgPool, action: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs WHERE action_type = $1")
        .bind(action)
        .fetch_one(pool)
        .await
        .unwrap()
}
