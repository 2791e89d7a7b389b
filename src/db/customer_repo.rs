// src/db/customer_repo.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Customer, CustomerProduct, CustomerWithProducts},
};

// Linha de venda a persistir. Só existe no INSERT: depois de criada a linha é
// imutável (registro de auditoria).
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub product_name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: i32,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura (pool principal)
    // ---

    pub async fn list_with_products(&self) -> Result<Vec<CustomerWithProducts>, AppError> {
        let customers =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
        let items = sqlx::query_as::<_, CustomerProduct>(
            "SELECT * FROM customer_products WHERE customer_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<CustomerProduct>> = HashMap::new();
        for item in items {
            grouped.entry(item.customer_id).or_default().push(item);
        }

        Ok(customers
            .into_iter()
            .map(|customer| {
                let products = grouped.remove(&customer.id).unwrap_or_default();
                CustomerWithProducts { customer, products }
            })
            .collect())
    }

    // ---
    // Escrita / leitura transacional
    // ---

    pub async fn find(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(customer)
    }

    pub async fn find_with_products(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<CustomerWithProducts>, AppError> {
        let Some(customer) = self.find(conn, id).await? else {
            return Ok(None);
        };
        let products = sqlx::query_as::<_, CustomerProduct>(
            "SELECT * FROM customer_products WHERE customer_id = $1 ORDER BY created_at ASC",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(Some(CustomerWithProducts { customer, products }))
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        name: &str,
        phone: Option<&str>,
        purchase_date: DateTime<Utc>,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, purchase_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(purchase_date)
        .fetch_one(&mut *conn)
        .await?;
        Ok(customer)
    }

    pub async fn insert_line_items(
        &self,
        conn: &mut PgConnection,
        customer_id: Uuid,
        items: &[NewLineItem],
    ) -> Result<Vec<CustomerProduct>, AppError> {
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, CustomerProduct>(
                r#"
                INSERT INTO customer_products (customer_id, product_name, category, unit, quantity, purchase_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(customer_id)
            .bind(&item.product_name)
            .bind(&item.category)
            .bind(&item.unit)
            .bind(item.quantity)
            .bind(item.purchase_date)
            .fetch_one(&mut *conn)
            .await?;
            created.push(row);
        }
        Ok(created)
    }
}
