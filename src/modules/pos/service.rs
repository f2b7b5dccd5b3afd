use std::collections::HashMap;

use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};

use scholaris_core::{AppError, ErrorCode, PaginationMeta};
use scholaris_db::Filter;
use scholaris_models::{
    WalletTxnType,
    audit::AuditAction,
    canteen::{CanteenItem, PosOrder, PosOrderDetail, PosOrderLine, PosOrderStatus},
    ids::{CanteenItemId, PosOrderId},
    notifications::PreferenceType,
    Identity,
};

use crate::modules::notifications::service::{NotificationDispatcher, OutgoingNotification};
use crate::modules::pos::model::{
    CardVerification, CreateItemDto, CreateOrderDto, ItemFilterParams, OrderFilterParams,
    PosOrderRow, UpdateItemDto,
};
use crate::modules::pos::pricing::{distinct_item_ids, price_order};
use crate::modules::students::service::StudentService;
use crate::modules::wallet::ledger::{LedgerEntry, process_transaction, spent_today};
use crate::utils::audit::{AuditEntry, log_audit};
use crate::utils::tenant::{check_tenant_entity, get_tenant, tenant_where};

const ITEM_COLUMNS: &str = "id, school_id, name, price, category, is_available, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, school_id, student_id, total, status, paid_by_wallet, wallet_txn_id, created_by, created_at";
const LINE_COLUMNS: &str = "id, order_id, item_id, item_name, quantity, unit_price, line_total";

const ITEM_NOT_FOUND: &str = "Item not found.";

fn duplicate_item(name: &str) -> AppError {
    AppError::msg(
        ErrorCode::DuplicateItem,
        format!("An item with the name \"{name}\" already exists in your school's canteen."),
    )
}

fn map_item_write_error(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return duplicate_item(name);
    }
    AppError::from(e)
}

pub struct PosService;

impl PosService {
    #[instrument(skip(db, identity), fields(db.operation = "SELECT", db.table = "canteen_items"))]
    pub async fn list_items(
        db: &PgPool,
        identity: &Identity,
        params: &ItemFilterParams,
    ) -> Result<Vec<CanteenItem>, AppError> {
        let mut extra = Filter::new();
        if params.available_only == Some(true) {
            extra = extra.eq("is_available", true);
        }

        let items = Self::find_items(db, &tenant_where(identity, extra), " ORDER BY name").await?;
        Ok(items)
    }

    async fn find_items(
        db: &PgPool,
        filter: &Filter,
        suffix: &str,
    ) -> Result<Vec<CanteenItem>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM canteen_items"));
        filter.push_where(&mut qb);
        qb.push(suffix);
        qb.build_query_as::<CanteenItem>().fetch_all(db).await
    }

    async fn find_item(
        db: &PgPool,
        identity: &Identity,
        id: CanteenItemId,
    ) -> Result<CanteenItem, AppError> {
        let item = Self::find_items(db, &tenant_where(identity, Filter::new().eq("id", id)), " LIMIT 1")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!(ITEM_NOT_FOUND)))?;
        check_tenant_entity(identity, item.school_id)?;
        Ok(item)
    }

    #[instrument(skip(db, identity, dto), fields(db.operation = "INSERT", db.table = "canteen_items"))]
    pub async fn create_item(
        db: &PgPool,
        identity: &Identity,
        dto: CreateItemDto,
    ) -> Result<CanteenItem, AppError> {
        let school_id = get_tenant(identity).require_school()?;

        let item = sqlx::query_as::<_, CanteenItem>(&format!(
            r#"INSERT INTO canteen_items (school_id, name, price, category, is_available)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {ITEM_COLUMNS}"#
        ))
        .bind(school_id)
        .bind(&dto.name)
        .bind(dto.price)
        .bind(&dto.category)
        .bind(dto.is_available.unwrap_or(true))
        .fetch_one(db)
        .await
        .map_err(|e| map_item_write_error(e, &dto.name))?;

        info!(item.id = %item.id, school.id = %school_id, "Canteen item created");
        Ok(item)
    }

    #[instrument(skip(db, identity, dto), fields(item.id = %id, db.operation = "UPDATE", db.table = "canteen_items"))]
    pub async fn update_item(
        db: &PgPool,
        identity: &Identity,
        id: CanteenItemId,
        dto: UpdateItemDto,
    ) -> Result<CanteenItem, AppError> {
        let existing = Self::find_item(db, identity, id).await?;
        let name = dto.name.clone().unwrap_or_else(|| existing.name.clone());

        let item = sqlx::query_as::<_, CanteenItem>(&format!(
            r#"UPDATE canteen_items
               SET name = COALESCE($1, name),
                   price = COALESCE($2, price),
                   category = COALESCE($3, category),
                   is_available = COALESCE($4, is_available),
                   updated_at = NOW()
               WHERE id = $5
               RETURNING {ITEM_COLUMNS}"#
        ))
        .bind(&dto.name)
        .bind(dto.price)
        .bind(&dto.category)
        .bind(dto.is_available)
        .bind(existing.id)
        .fetch_one(db)
        .await
        .map_err(|e| map_item_write_error(e, &name))?;

        info!(item.id = %item.id, "Canteen item updated");
        Ok(item)
    }

    #[instrument(skip(db, identity), fields(item.id = %id, db.operation = "DELETE", db.table = "canteen_items"))]
    pub async fn delete_item(
        db: &PgPool,
        identity: &Identity,
        id: CanteenItemId,
    ) -> Result<(), AppError> {
        let existing = Self::find_item(db, identity, id).await?;

        sqlx::query("DELETE FROM canteen_items WHERE id = $1")
            .bind(existing.id)
            .execute(db)
            .await?;

        info!(item.id = %existing.id, "Canteen item deleted");
        Ok(())
    }

    /// Charges a student's wallet for a canteen order.
    ///
    /// The student and the requested items are resolved inside the caller's
    /// school. Prices come from the catalogue, never from the request. The
    /// debit, the order, its lines and the audit entry commit as one unit; the
    /// parent is notified only after the commit.
    #[instrument(
        skip(db, notifier, identity, dto),
        fields(student.id = %dto.student_id, lines = dto.items.len())
    )]
    pub async fn create_order(
        db: &PgPool,
        notifier: &NotificationDispatcher,
        identity: &Identity,
        dto: CreateOrderDto,
    ) -> Result<PosOrderDetail, AppError> {
        let tenant = get_tenant(identity);
        let item_ids = distinct_item_ids(&dto.items);

        let student_filter = tenant_where(identity, Filter::new().eq("id", dto.student_id));
        let item_filter = tenant_where(
            identity,
            Filter::new()
                .any_of("id", item_ids.iter().copied())
                .eq("is_available", true),
        );

        let (student, items) = tokio::try_join!(
            StudentService::find_one(db, &student_filter),
            Self::find_items(db, &item_filter, ""),
        )?;

        let student = student.ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("Student not found in this school."))
        })?;

        let priced = if items.len() == item_ids.len() {
            price_order(&dto.items, &items)
        } else {
            None
        };
        let (lines, total) = priced.ok_or_else(|| {
            warn!(requested = item_ids.len(), resolved = items.len(), "Order items rejected");
            AppError::not_found(anyhow::anyhow!(
                "One or more items are invalid, unavailable, or belong to another school."
            ))
        })?;

        let school_id = tenant.school_id.unwrap_or(student.school_id);
        let mut tx = db.begin().await?;

        let outcome = process_transaction(
            &mut tx,
            LedgerEntry {
                student_id: student.id,
                school_id,
                amount: -total,
                txn_type: WalletTxnType::Purchase,
                description: Some("Canteen Purchase".to_string()),
                created_by: Some(identity.id),
            },
        )
        .await?;

        let order = sqlx::query_as::<_, PosOrder>(&format!(
            r#"INSERT INTO pos_orders
                   (school_id, student_id, total, status, paid_by_wallet, wallet_txn_id, created_by)
               VALUES ($1, $2, $3, $4, TRUE, $5, $6)
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(school_id)
        .bind(student.id)
        .bind(total)
        .bind(PosOrderStatus::Completed)
        .bind(outcome.transaction.id)
        .bind(identity.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO pos_order_items (order_id, item_id, item_name, quantity, unit_price, line_total) ",
        );
        qb.push_values(&lines, |mut row, line| {
            row.push_bind(order.id)
                .push_bind(line.item_id)
                .push_bind(line.item_name.clone())
                .push_bind(line.quantity)
                .push_bind(line.unit_price)
                .push_bind(line.line_total);
        });
        qb.push(format!(" RETURNING {LINE_COLUMNS}"));
        let order_lines = qb
            .build_query_as::<PosOrderLine>()
            .fetch_all(&mut *tx)
            .await?;

        log_audit(
            &mut tx,
            AuditEntry {
                actor: identity,
                action: AuditAction::PosOrder,
                details: json!({
                    "order_id": order.id,
                    "student_id": student.id,
                    "total": total,
                    "transaction_id": outcome.transaction.id,
                }),
                school_id: Some(school_id),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            order.id = %order.id,
            order.total = %total,
            wallet.balance = %outcome.student.wallet_balance,
            "POS order completed"
        );

        if let Some(parent_id) = student.parent_id {
            notifier.dispatch(OutgoingNotification {
                user_id: parent_id,
                title: "Canteen Purchase".to_string(),
                body: format!(
                    "Your child, {}, made a purchase from the canteen for a total of {:.2} JOD.",
                    student.full_name, total
                ),
                data: json!({ "orderId": order.id, "screen": "WalletHistory" }),
                preference: PreferenceType::Wallet,
            });
        }

        Ok(PosOrderDetail {
            order,
            student_name: student.full_name,
            items: order_lines,
        })
    }

    #[instrument(skip(db, identity, params), fields(db.operation = "SELECT", db.table = "pos_orders"))]
    pub async fn list_orders(
        db: &PgPool,
        identity: &Identity,
        params: &OrderFilterParams,
    ) -> Result<(Vec<PosOrderDetail>, PaginationMeta), AppError> {
        let mut extra = Filter::new();
        if let Some(student_id) = params.student_id {
            extra = extra.eq("student_id", student_id);
        }
        let filter = tenant_where(identity, extra);

        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM pos_orders");
        filter.push_where(&mut count_qb);
        let total = count_qb.build_query_scalar::<i64>().fetch_one(db).await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT o.id, o.school_id, o.student_id, o.total, o.status, o.paid_by_wallet, \
             o.wallet_txn_id, o.created_by, o.created_at, s.full_name AS student_name \
             FROM pos_orders o JOIN students s ON s.id = o.student_id",
        );
        filter.push_where_on(&mut qb, Some("o"));
        qb.push(" ORDER BY o.created_at DESC LIMIT ")
            .push_bind(params.pagination.limit())
            .push(" OFFSET ")
            .push_bind(params.pagination.offset());

        let rows = qb.build_query_as::<PosOrderRow>().fetch_all(db).await?;
        let orders = Self::attach_lines(db, rows).await?;

        Ok((orders, PaginationMeta::new(total, &params.pagination)))
    }

    #[instrument(skip(db, identity), fields(order.id = %id))]
    pub async fn get_order(
        db: &PgPool,
        identity: &Identity,
        id: PosOrderId,
    ) -> Result<PosOrderDetail, AppError> {
        let filter = tenant_where(identity, Filter::new().eq("id", id));

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT o.id, o.school_id, o.student_id, o.total, o.status, o.paid_by_wallet, \
             o.wallet_txn_id, o.created_by, o.created_at, s.full_name AS student_name \
             FROM pos_orders o JOIN students s ON s.id = o.student_id",
        );
        filter.push_where_on(&mut qb, Some("o"));

        let row = qb
            .build_query_as::<PosOrderRow>()
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Order not found.")))?;
        check_tenant_entity(identity, row.order.school_id)?;

        Self::attach_lines(db, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Order not found.")))
    }

    async fn attach_lines(db: &PgPool, rows: Vec<PosOrderRow>) -> Result<Vec<PosOrderDetail>, AppError> {
        let order_ids: Vec<PosOrderId> = rows.iter().map(|row| row.order.id).collect();

        let lines = sqlx::query_as::<_, PosOrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM pos_order_items WHERE order_id = ANY($1) ORDER BY order_id, id"
        ))
        .bind(order_ids)
        .fetch_all(db)
        .await?;

        let mut by_order: HashMap<PosOrderId, Vec<PosOrderLine>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(line);
        }

        Ok(rows
            .into_iter()
            .map(|row| PosOrderDetail {
                items: by_order.remove(&row.order.id).unwrap_or_default(),
                student_name: row.student_name,
                order: row.order,
            })
            .collect())
    }

    #[instrument(skip(db, identity, nfc_id))]
    pub async fn verify_card(
        db: &PgPool,
        identity: &Identity,
        nfc_id: &str,
    ) -> Result<CardVerification, AppError> {
        let student = StudentService::find_one(
            db,
            &tenant_where(identity, Filter::new().eq("nfc_card_id", nfc_id)),
        )
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Card not valid for this school.")))?;

        if !student.is_nfc_active {
            warn!(student.id = %student.id, "Frozen card presented");
            return Err(AppError::msg(ErrorCode::CardFrozen, "Card is frozen by parent."));
        }

        let mut conn = db.acquire().await?;
        let spent = spent_today(&mut *conn, student.id).await?;

        Ok(CardVerification {
            student_id: student.id,
            full_name: student.full_name,
            grade: student.grade,
            wallet_balance: student.wallet_balance,
            daily_spending_limit: student.daily_spending_limit,
            spent_today: spent,
        })
    }
}
