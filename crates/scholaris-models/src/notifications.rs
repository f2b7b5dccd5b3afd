//! Parent notifications and their per-user preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::ids::{NotificationId, UserId};

/// Which preference switch gates a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_preference", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PreferenceType {
    Wallet,
    Bus,
    Academic,
    General,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationPreferences {
    pub user_id: UserId,
    pub low_balance_warning: bool,
    pub bus_updates: bool,
    pub new_grade: bool,
    pub new_homework: bool,
}

impl NotificationPreferences {
    pub fn allows(&self, preference: PreferenceType) -> bool {
        match preference {
            PreferenceType::Wallet => self.low_balance_warning,
            PreferenceType::Bus => self.bus_updates,
            PreferenceType::Academic => self.new_grade || self.new_homework,
            PreferenceType::General => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub body: String,
    pub data: sqlx::types::Json<Value>,
    pub preference_type: PreferenceType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
