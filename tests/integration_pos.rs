mod common;

use axum::http::StatusCode;
use common::{
    audit_count, create_test_item, create_test_school, create_test_student, create_test_user, dec,
    fund_wallet, ledger_count, ledger_total, money, order_count, set_card, setup_test_app,
    wallet_balance,
};
use scholaris::modules::wallet::{LedgerEntry, process_transaction};
use scholaris::scholaris_models::{Role, WalletTxnType};
use scholaris::scholaris_models::notifications::PreferenceType;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_order_charges_wallet_and_notifies_parent(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let parent = create_test_user(&pool, Role::Parent, Some(school)).await;
    let student = create_test_student(&pool, school, Some(parent.id), "Lina Haddad").await;
    let sandwich = create_test_item(&pool, school, "Cheese Sandwich", "1.50").await;
    let juice = create_test_item(&pool, school, "Orange Juice", "0.75").await;
    fund_wallet(&pool, school, student, "10.00").await;
    let mut app = setup_test_app(pool.clone());

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&cashier.token),
            Some(json!({
                "student_id": student,
                "items": [
                    { "id": sandwich, "quantity": 2 },
                    { "id": juice }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let order = &body["data"];
    assert_eq!(money(&order["total"]), dec("3.75"));
    assert_eq!(order["status"], "completed");
    assert_eq!(order["student_name"], "Lina Haddad");
    let lines = order["items"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["item_name"], "Cheese Sandwich");
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(money(&lines[0]["line_total"]), dec("3.00"));

    assert_eq!(wallet_balance(&pool, student).await, dec("6.25"));
    assert_eq!(ledger_total(&pool, student).await, dec("6.25"));
    assert_eq!(audit_count(&pool, "POS_ORDER").await, 1);

    let notification = app.notifications.try_recv().unwrap();
    assert_eq!(notification.user_id, parent.id);
    assert_eq!(notification.title, "Canteen Purchase");
    assert_eq!(notification.preference, PreferenceType::Wallet);
    assert_eq!(notification.data["screen"], "WalletHistory");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_order_with_insufficient_balance_leaves_no_trace(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let student = create_test_student(&pool, school, None, "Omar Nasser").await;
    let item = create_test_item(&pool, school, "Chicken Wrap", "4.00").await;
    fund_wallet(&pool, school, student, "3.00").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&cashier.token),
            Some(json!({ "student_id": student, "items": [{ "id": item }] })),
        )
        .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_BALANCE");
    assert_eq!(wallet_balance(&pool, student).await, dec("3.00"));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pos_orders")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(audit_count(&pool, "POS_ORDER").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_order_rejects_foreign_and_unavailable_items(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let other_school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let student = create_test_student(&pool, school, None, "Sara Khalil").await;
    let own_item = create_test_item(&pool, school, "Apple", "0.50").await;
    let foreign_item = create_test_item(&pool, other_school, "Banana", "0.40").await;
    let sold_out = create_test_item(&pool, school, "Muffin", "1.00").await;
    sqlx::query("UPDATE canteen_items SET is_available = FALSE WHERE id = $1")
        .bind(sold_out)
        .execute(&pool)
        .await
        .unwrap();
    fund_wallet(&pool, school, student, "10.00").await;
    let app = setup_test_app(pool.clone());

    for rejected in [foreign_item, sold_out] {
        let (status, body) = app
            .send(
                "POST",
                "/api/pos/orders",
                Some(&cashier.token),
                Some(json!({ "student_id": student, "items": [{ "id": own_item }, { "id": rejected }] })),
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"]["message"],
            "One or more items are invalid, unavailable, or belong to another school."
        );
    }

    assert_eq!(wallet_balance(&pool, student).await, dec("10.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_order_for_student_of_another_school(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let other_school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let student = create_test_student(&pool, other_school, None, "Yousef Amin").await;
    let item = create_test_item(&pool, school, "Water Bottle", "0.30").await;
    fund_wallet(&pool, other_school, student, "10.00").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&cashier.token),
            Some(json!({ "student_id": student, "items": [{ "id": item }] })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Student not found in this school.");
    assert_eq!(wallet_balance(&pool, student).await, dec("10.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parent_cannot_place_orders(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let parent = create_test_user(&pool, Role::Parent, Some(school)).await;
    let student = create_test_student(&pool, school, Some(parent.id), "Rami Saleh").await;
    let item = create_test_item(&pool, school, "Granola Bar", "0.90").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&parent.token),
            Some(json!({ "student_id": student, "items": [{ "id": item }] })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN_ROLE");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_daily_limit_blocks_second_purchase(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let teacher = create_test_user(&pool, Role::Teacher, Some(school)).await;
    let student = create_test_student(&pool, school, None, "Huda Zaid").await;
    let item = create_test_item(&pool, school, "Falafel Pita", "6.00").await;
    fund_wallet(&pool, school, student, "50.00").await;
    sqlx::query("UPDATE students SET daily_spending_limit = 10 WHERE id = $1")
        .bind(student)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool.clone());
    let order = json!({ "student_id": student, "items": [{ "id": item }] });

    let (status, _) = app
        .send("POST", "/api/pos/orders", Some(&teacher.token), Some(order.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send("POST", "/api/pos/orders", Some(&teacher.token), Some(order))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "DAILY_LIMIT_EXCEEDED");
    assert_eq!(wallet_balance(&pool, student).await, dec("44.00"));
    assert_eq!(ledger_total(&pool, student).await, dec("44.00"));
    assert_eq!(ledger_count(&pool, student, WalletTxnType::Purchase).await, 1);
    assert_eq!(order_count(&pool, student).await, 1);
    assert_eq!(audit_count(&pool, "POS_ORDER").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_credits_do_not_count_toward_daily_limit(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let student = create_test_student(&pool, school, None, "Salma Haddad").await;
    let meal = create_test_item(&pool, school, "Lunch Box", "10.00").await;
    let gum = create_test_item(&pool, school, "Gum", "0.10").await;
    sqlx::query("UPDATE students SET daily_spending_limit = 10 WHERE id = $1")
        .bind(student)
        .execute(&pool)
        .await
        .unwrap();
    fund_wallet(&pool, school, student, "30.00").await;

    let mut conn = pool.acquire().await.unwrap();
    process_transaction(
        &mut conn,
        LedgerEntry {
            student_id: student,
            school_id: school,
            amount: dec("5.00"),
            txn_type: WalletTxnType::Refund,
            description: None,
            created_by: None,
        },
    )
    .await
    .unwrap();
    drop(conn);

    let app = setup_test_app(pool.clone());

    let (status, _) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&cashier.token),
            Some(json!({ "student_id": student, "items": [{ "id": meal }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(wallet_balance(&pool, student).await, dec("25.00"));

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&cashier.token),
            Some(json!({ "student_id": student, "items": [{ "id": gum }] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "DAILY_LIMIT_EXCEEDED");
    assert_eq!(ledger_count(&pool, student, WalletTxnType::Purchase).await, 1);
    assert_eq!(ledger_total(&pool, student).await, dec("25.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fractional_quantities_are_floored(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let student = create_test_student(&pool, school, None, "Nour Odeh").await;
    let item = create_test_item(&pool, school, "Chocolate Milk", "1.00").await;
    fund_wallet(&pool, school, student, "10.00").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app
        .send(
            "POST",
            "/api/pos/orders",
            Some(&cashier.token),
            Some(json!({ "student_id": student, "item_ids": [{ "id": item, "quantity": 2.7 }, { "id": item, "quantity": 0.5 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let lines = body["data"]["items"].as_array().unwrap();
    assert_eq!(lines[0]["quantity"], 2);
    assert_eq!(lines[1]["quantity"], 1);
    assert_eq!(money(&body["data"]["total"]), dec("3.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_card(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let other_school = create_test_school(&pool).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let active = create_test_student(&pool, school, None, "Tala Mansour").await;
    let frozen = create_test_student(&pool, school, None, "Kareem Yasin").await;
    let foreign = create_test_student(&pool, other_school, None, "Dana Issa").await;
    set_card(&pool, active, "CARD-ACTIVE", true).await;
    set_card(&pool, frozen, "CARD-FROZEN", false).await;
    set_card(&pool, foreign, "CARD-FOREIGN", true).await;
    fund_wallet(&pool, school, active, "12.00").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = app
        .send("GET", "/api/pos/verify-card/CARD-ACTIVE", Some(&cashier.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["full_name"], "Tala Mansour");
    assert_eq!(money(&body["data"]["wallet_balance"]), dec("12.00"));
    assert_eq!(money(&body["data"]["spent_today"]), dec("0"));

    let (status, body) = app
        .send("GET", "/api/pos/verify-card/CARD-FROZEN", Some(&cashier.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "CARD_FROZEN");

    let (status, _) = app
        .send("GET", "/api/pos/verify-card/CARD-FOREIGN", Some(&cashier.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_item_catalogue_management(pool: PgPool) {
    let school = create_test_school(&pool).await;
    let admin = create_test_user(&pool, Role::SchoolAdmin, Some(school)).await;
    let cashier = create_test_user(&pool, Role::CanteenStaff, Some(school)).await;
    let app = setup_test_app(pool.clone());
    let item = json!({ "name": "Cheese Sandwich", "price": 1.5, "category": "Sandwiches" });

    let (status, body) = app
        .send("POST", "/api/pos/items", Some(&admin.token), Some(item.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send("POST", "/api/pos/items", Some(&admin.token), Some(item))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_ITEM");

    let (status, _) = app
        .send(
            "POST",
            "/api/pos/items",
            Some(&cashier.token),
            Some(json!({ "name": "Apple", "price": 0.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/pos/items/{}", item_id),
            Some(&admin.token),
            Some(json!({ "is_available": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_available"], false);
    assert_eq!(body["data"]["name"], "Cheese Sandwich");

    let (_, body) = app
        .send("GET", "/api/pos/products?available_only=true", Some(&cashier.token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = app
        .send("DELETE", &format!("/api/pos/items/{}", item_id), Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
