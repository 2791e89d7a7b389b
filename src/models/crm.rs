// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Item de compra (linha de venda). Imutável depois de criado; product_name é
// desnormalizado de propósito: o histórico não acompanha renomeações.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CustomerProduct {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: i32,
    pub purchase_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerWithProducts {
    #[serde(flatten)]
    pub customer: Customer,
    pub products: Vec<CustomerProduct>,
}
