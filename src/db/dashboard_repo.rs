// src/db/dashboard_repo.rs
//
// Consultas de leitura do dashboard. Ficam cruas aqui (linhas "achatadas" dos
// joins); a matemática de agregação mora no dashboard_service, em funções
// puras testáveis.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::crm::Customer};

// Uma linha de venda com os preços já resolvidos (variação primeiro, depois o
// produto base), no mesmo critério dos joins por product_name + unit_label.
#[derive(Debug, Clone, FromRow)]
pub struct SaleRow {
    pub quantity: i32,
    pub purchase_date: Option<DateTime<Utc>>,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
}

// Produto x variação (LEFT JOIN, campos da variação anuláveis).
#[derive(Debug, Clone, FromRow)]
pub struct ProductStockRow {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit_of_measurement: String,
    pub product_quantity: i32,
    pub unit_price: Decimal,
    pub unit_label: Option<String>,
    pub variant_quantity: Option<i32>,
    pub variant_hidden: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DamagedRow {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CustomerTotalRow {
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    pub items_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TopProductRow {
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub orders: i64,
    pub category: Option<String>,
    pub current_stock: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct DaySalesRow {
    pub sale_date: NaiveDate,
    pub sales: Decimal,
    pub orders: i64,
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn sale_rows(&self) -> Result<Vec<SaleRow>, AppError> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT
                cp.quantity,
                COALESCE(cp.purchase_date, c.purchase_date) AS purchase_date,
                COALESCE(pv.unit_price, p.unit_price, 0) AS unit_price,
                COALESCE(pv.cost_price, p.cost_price, 0) AS cost_price
            FROM customer_products cp
            JOIN customers c ON c.id = cp.customer_id
            LEFT JOIN products p ON p.name = cp.product_name
            LEFT JOIN product_variants pv
                ON pv.product_id = p.id AND pv.unit_label = cp.unit
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn product_stock_rows(&self) -> Result<Vec<ProductStockRow>, AppError> {
        let rows = sqlx::query_as::<_, ProductStockRow>(
            r#"
            SELECT
                p.id,
                p.name,
                p.category,
                p.unit_of_measurement,
                p.quantity AS product_quantity,
                p.unit_price,
                pv.unit_label,
                pv.quantity AS variant_quantity,
                pv.hidden AS variant_hidden
            FROM products p
            LEFT JOIN product_variants pv ON pv.product_id = p.id
            ORDER BY p.created_at ASC, p.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn damaged_rows(&self) -> Result<Vec<DamagedRow>, AppError> {
        let rows = sqlx::query_as::<_, DamagedRow>(
            r#"
            SELECT
                d.quantity,
                COALESCE(p.unit_price, 0) AS unit_price,
                d."date" AS date,
                d.created_at
            FROM damaged_products d
            LEFT JOIN products p ON p.name = d.product_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_customers(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_customers_on(&self, day: NaiveDate) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers WHERE purchase_date::date = $1",
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_customers_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers WHERE purchase_date::date BETWEEN $1 AND $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn recent_customers(&self, limit: i64) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY purchase_date DESC NULLS LAST LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn customer_totals(
        &self,
        customer_ids: &[Uuid],
    ) -> Result<Vec<CustomerTotalRow>, AppError> {
        let rows = sqlx::query_as::<_, CustomerTotalRow>(
            r#"
            SELECT
                cp.customer_id,
                COALESCE(SUM(cp.quantity * COALESCE(pv.unit_price, p.unit_price, 0)), 0)::NUMERIC AS total_amount,
                COUNT(*) AS items_count
            FROM customer_products cp
            LEFT JOIN products p ON p.name = cp.product_name
            LEFT JOIN product_variants pv
                ON pv.product_id = p.id AND pv.unit_label = cp.unit
            WHERE cp.customer_id = ANY($1)
            GROUP BY cp.customer_id
            "#,
        )
        .bind(customer_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProductRow>, AppError> {
        let rows = sqlx::query_as::<_, TopProductRow>(
            r#"
            SELECT
                cp.product_name AS name,
                COALESCE(SUM(cp.quantity), 0)::BIGINT AS quantity_sold,
                COALESCE(SUM(cp.quantity * COALESCE(pv.unit_price, p.unit_price, 0)), 0)::NUMERIC AS revenue,
                COUNT(*) AS orders,
                MAX(p.category) AS category,
                COALESCE(MAX(p.quantity), 0)::INT AS current_stock
            FROM customer_products cp
            LEFT JOIN products p ON p.name = cp.product_name
            LEFT JOIN product_variants pv
                ON pv.product_id = p.id AND pv.unit_label = cp.unit
            GROUP BY cp.product_name
            ORDER BY revenue DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn sales_by_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DaySalesRow>, AppError> {
        let rows = sqlx::query_as::<_, DaySalesRow>(
            r#"
            SELECT
                COALESCE(cp.purchase_date, c.purchase_date)::date AS sale_date,
                COALESCE(SUM(cp.quantity * COALESCE(pv.unit_price, p.unit_price, 0)), 0)::NUMERIC AS sales,
                COUNT(*) AS orders
            FROM customer_products cp
            JOIN customers c ON c.id = cp.customer_id
            LEFT JOIN products p ON p.name = cp.product_name
            LEFT JOIN product_variants pv
                ON pv.product_id = p.id AND pv.unit_label = cp.unit
            WHERE COALESCE(cp.purchase_date, c.purchase_date)::date BETWEEN $1 AND $2
            GROUP BY sale_date
            ORDER BY sale_date ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
