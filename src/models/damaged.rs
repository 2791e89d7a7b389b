// src/models/damaged.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Relato de avaria. `variant_id` é referência solta (sem FK); `refunded` é
// transição de mão única false → true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DamagedProduct {
    pub id: Uuid,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i32,
    pub reason: String,
    pub action_taken: Option<String>,
    pub variant_id: Option<Uuid>,
    pub date: NaiveDate,
    pub logged_at: Option<DateTime<Utc>>,
    pub unit_of_measurement: String,
    pub refunded: bool,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DamagedStats {
    pub total_damaged: i64,
    pub recent_damages: Vec<DamagedProduct>,
}
