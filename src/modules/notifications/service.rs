//! Parent notifications.
//!
//! Producers hand messages to a [`NotificationDispatcher`], which never blocks
//! and never fails the caller. A single worker drains the queue, applies the
//! recipient's preference switches and stores the message in their inbox.
//! The worker stops once every dispatcher handle has been dropped and the
//! queue is empty.

use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use scholaris_config::NotificationConfig;
use scholaris_core::{AppError, PaginationMeta, PaginationParams};
use scholaris_models::{
    ids::{NotificationId, UserId},
    notifications::{Notification, NotificationPreferences, PreferenceType},
};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, body, data, preference_type, is_read, created_at";

#[derive(Debug, Clone)]
pub struct OutgoingNotification {
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub data: Value,
    pub preference: PreferenceType,
}

#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<OutgoingNotification>,
}

impl NotificationDispatcher {
    /// A dispatcher and the receiving end of its queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutgoingNotification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Starts the delivery worker on the current runtime.
    pub fn spawn(db: PgPool, config: &NotificationConfig) -> (Self, JoinHandle<()>) {
        let (dispatcher, rx) = Self::channel(config.queue_capacity);
        let handle = tokio::spawn(run_notification_worker(db, rx));
        (dispatcher, handle)
    }

    /// Queues a notification. A full or closed queue drops it with a warning.
    pub fn dispatch(&self, notification: OutgoingNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                warn!(user.id = %n.user_id, title = %n.title, "Notification queue full, dropping");
            }
            Err(TrySendError::Closed(n)) => {
                warn!(user.id = %n.user_id, title = %n.title, "Notification worker stopped, dropping");
            }
        }
    }
}

pub async fn run_notification_worker(db: PgPool, mut rx: mpsc::Receiver<OutgoingNotification>) {
    info!("Notification worker started");

    while let Some(notification) = rx.recv().await {
        let user_id = notification.user_id;
        match deliver(&db, notification).await {
            Ok(true) => debug!(user.id = %user_id, "Notification stored"),
            Ok(false) => debug!(user.id = %user_id, "Notification suppressed by preferences"),
            Err(e) => warn!(user.id = %user_id, error = %e, "Notification delivery failed"),
        }
    }

    info!("Notification worker stopped");
}

/// Stores the notification unless the recipient opted out. Users without a
/// preferences row receive everything.
#[instrument(skip(db, notification), fields(user.id = %notification.user_id))]
pub async fn deliver(db: &PgPool, notification: OutgoingNotification) -> Result<bool, sqlx::Error> {
    let preferences = sqlx::query_as::<_, NotificationPreferences>(
        "SELECT user_id, low_balance_warning, bus_updates, new_grade, new_homework \
         FROM notification_preferences WHERE user_id = $1",
    )
    .bind(notification.user_id)
    .fetch_optional(db)
    .await?;

    if let Some(prefs) = preferences
        && !prefs.allows(notification.preference)
    {
        return Ok(false);
    }

    sqlx::query(
        r#"INSERT INTO notifications (user_id, title, body, data, preference_type)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(notification.user_id)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(sqlx::types::Json(&notification.data))
    .bind(notification.preference)
    .execute(db)
    .await?;

    Ok(true)
}

pub struct NotificationService;

impl NotificationService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "notifications"))]
    pub async fn list_for_user(
        db: &PgPool,
        user_id: UserId,
        params: &PaginationParams,
    ) -> Result<(Vec<Notification>, PaginationMeta), AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;

        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(db)
        .await?;

        Ok((notifications, PaginationMeta::new(total, params)))
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "notifications"))]
    pub async fn mark_read(
        db: &PgPool,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found.")))
    }
}
