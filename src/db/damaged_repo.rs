// src/db/damaged_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::damaged::DamagedProduct};

#[derive(Debug, Clone)]
pub struct NewDamagedProduct {
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i32,
    pub reason: String,
    pub action_taken: Option<String>,
    pub variant_id: Option<Uuid>,
    pub date: NaiveDate,
    pub logged_at: DateTime<Utc>,
    pub unit_of_measurement: String,
}

#[derive(Clone)]
pub struct DamagedProductRepository {
    pool: PgPool,
}

impl DamagedProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<DamagedProduct>, AppError> {
        let damaged = sqlx::query_as::<_, DamagedProduct>(
            "SELECT * FROM damaged_products ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(damaged)
    }

    pub async fn total_quantity(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM damaged_products",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<DamagedProduct>, AppError> {
        let damaged = sqlx::query_as::<_, DamagedProduct>(
            r#"SELECT * FROM damaged_products ORDER BY "date" DESC LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(damaged)
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        new: &NewDamagedProduct,
    ) -> Result<DamagedProduct, AppError> {
        let damaged = sqlx::query_as::<_, DamagedProduct>(
            r#"
            INSERT INTO damaged_products
                (customer_name, product_name, quantity, reason, action_taken,
                 variant_id, "date", logged_at, unit_of_measurement)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&new.customer_name)
        .bind(&new.product_name)
        .bind(new.quantity)
        .bind(&new.reason)
        .bind(&new.action_taken)
        .bind(new.variant_id)
        .bind(new.date)
        .bind(new.logged_at)
        .bind(&new.unit_of_measurement)
        .fetch_one(&mut *conn)
        .await?;
        Ok(damaged)
    }

    // Com lock de linha: o reembolso é transição de mão única e duas
    // requisições simultâneas precisam serializar aqui.
    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<DamagedProduct>, AppError> {
        let damaged = sqlx::query_as::<_, DamagedProduct>(
            "SELECT * FROM damaged_products WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(damaged)
    }

    pub async fn mark_refunded(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        refunded_at: DateTime<Utc>,
    ) -> Result<DamagedProduct, AppError> {
        let damaged = sqlx::query_as::<_, DamagedProduct>(
            r#"
            UPDATE damaged_products
            SET refunded = TRUE, refunded_at = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(refunded_at)
        .fetch_one(&mut *conn)
        .await?;
        Ok(damaged)
    }
}
