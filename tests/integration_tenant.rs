mod common;

use axum::http::StatusCode;
use common::{create_test_item, create_test_school, create_test_user, setup_test_app, token_for};
use scholaris::modules::notifications::OutgoingNotification;
use scholaris::modules::notifications::service::deliver;
use scholaris::scholaris_models::{Role, ids::UserId, notifications::PreferenceType};
use serde_json::json;
use sqlx::PgPool;

fn wallet_notice(user_id: UserId, title: &str) -> OutgoingNotification {
    OutgoingNotification {
        user_id,
        title: title.to_string(),
        body: "Your child made a purchase.".to_string(),
        data: json!({ "screen": "WalletHistory" }),
        preference: PreferenceType::Wallet,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_requests_without_valid_token_are_rejected(pool: PgPool) {
    let app = setup_test_app(pool.clone());

    let (status, body) = app.send("GET", "/api/pos/items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["message"], "Not authorized, no token.");

    let (status, body) = app
        .send("GET", "/api/pos/items", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_disabled_and_unknown_users_are_rejected(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let user = create_test_user(&pool, Role::SchoolAdmin, Some(school)).await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool.clone());

    let (status, body) = app.send("GET", "/api/pos/items", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "User not found or disabled.");

    let ghost = token_for(UserId::new(), "ghost@test.com");
    let (status, _) = app.send("GET", "/api/pos/items", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reads_are_scoped_to_callers_school(pool: PgPool) {
    let school_a = create_test_school(&pool).await;
    let school_b = create_test_school(&pool).await;
    let admin_a = create_test_user(&pool, Role::SchoolAdmin, Some(school_a)).await;
    let super_admin = create_test_user(&pool, Role::SuperAdmin, None).await;
    create_test_item(&pool, school_a, "Apple", "0.50").await;
    create_test_item(&pool, school_b, "Banana", "0.40").await;
    create_test_item(&pool, school_b, "Muffin", "1.20").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app.send("GET", "/api/pos/items", Some(&admin_a.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Apple");

    let (status, body) = app
        .send("GET", "/api/pos/items", Some(&super_admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_writes_to_another_schools_item_are_refused(pool: PgPool) {
    let school_a = create_test_school(&pool).await;
    let school_b = create_test_school(&pool).await;
    let admin_a = create_test_user(&pool, Role::SchoolAdmin, Some(school_a)).await;
    let item_b = create_test_item(&pool, school_b, "Banana", "0.40").await;
    let app = setup_test_app(pool.clone());

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/pos/items/{}", item_b),
            Some(&admin_a.token),
            Some(json!({ "price": 0.01 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("DELETE", &format!("/api/pos/items/{}", item_b), Some(&admin_a.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let still_there: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM canteen_items WHERE id = $1)")
            .bind(item_b)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(still_there);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_super_admin_is_not_implied_by_role_gates(pool: PgPool) {
    let super_admin = create_test_user(&pool, Role::SuperAdmin, None).await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/items",
            Some(&super_admin.token),
            Some(json!({ "name": "Apple", "price": 0.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN_ROLE");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notification_inbox_is_per_user(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let parent = create_test_user(&pool, Role::Parent, Some(school)).await;
    let other = create_test_user(&pool, Role::Parent, Some(school)).await;

    assert!(deliver(&pool, wallet_notice(parent.id, "Canteen Purchase")).await.unwrap());
    assert!(deliver(&pool, wallet_notice(other.id, "Canteen Purchase")).await.unwrap());

    sqlx::query("INSERT INTO notification_preferences (user_id, low_balance_warning) VALUES ($1, FALSE)")
        .bind(other.id)
        .execute(&pool)
        .await
        .unwrap();
    assert!(!deliver(&pool, wallet_notice(other.id, "Muted")).await.unwrap());

    let app = setup_test_app(pool.clone());

    let (status, body) = app.send("GET", "/api/notifications", Some(&parent.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let inbox = body["data"].as_array().unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["is_read"], false);
    let id = inbox[0]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send("PATCH", &format!("/api/notifications/{}/read", id), Some(&other.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send("PATCH", &format!("/api/notifications/{}/read", id), Some(&parent.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);

    let (_, body) = app.send("GET", "/api/notifications", Some(&other.token), None).await;
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health_reports_database(pool: PgPool) {
    let app = setup_test_app(pool.clone());

    let (status, body) = app.send("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "up");
}
