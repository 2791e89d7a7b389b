// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Produto (catálogo) ---
// quantity / unit_price / unit_of_measurement / sku são campos "rollup":
// quando o produto tem variações, o agregador os recalcula a partir delas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub unit_of_measurement: String,
    pub category: Option<String>,
    pub hidden: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Variação de produto ---
// Unidade vendável (embalagem, rótulo) com preço e estoque próprios.
// Invariante "soft": no máximo uma variação com is_default=true por produto,
// garantido no caminho de escrita (agregador / set-default), não no banco.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: Option<String>,
    pub unit_label: String,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub conversion_factor: Decimal,
    pub barcode: Option<String>,
    pub is_default: bool,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Produto com suas variações carregadas, o formato que a API devolve.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}
