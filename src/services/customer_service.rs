// src/services/customer_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{customer_repo::NewLineItem, CustomerRepository, NotificationRepository},
    models::crm::CustomerWithProducts,
};

#[derive(Clone)]
pub struct CustomerService {
    pool: PgPool,
    customers: CustomerRepository,
    notifications: NotificationRepository,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(
        pool: PgPool,
        customers: CustomerRepository,
        notifications: NotificationRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { pool, customers, notifications, clock }
    }

    pub async fn list(&self) -> Result<Vec<CustomerWithProducts>, AppError> {
        self.customers.list_with_products().await
    }

    pub async fn get(&self, id: Uuid) -> Result<CustomerWithProducts, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.customers
            .find_with_products(&mut conn, id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    // Cadastro manual, com linhas de compra opcionais. A compra "de verdade"
    // (que baixa estoque) passa pelo PurchaseService; aqui as linhas entram
    // como histórico, sem tocar no inventário.
    pub async fn create(
        &self,
        name: String,
        phone: Option<String>,
        purchase_date: Option<DateTime<Utc>>,
        items: Vec<NewLineItem>,
    ) -> Result<CustomerWithProducts, AppError> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let customer = self
            .customers
            .create(&mut tx, &name, phone.as_deref(), purchase_date.unwrap_or(now))
            .await?;
        self.customers.insert_line_items(&mut tx, customer.id, &items).await?;

        self.notifications
            .create(
                &mut tx,
                "customer_added",
                &format!("Novo cliente '{}' adicionado.", customer.name),
                None,
            )
            .await?;

        let customer = self
            .customers
            .find_with_products(&mut tx, customer.id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn append_items(
        &self,
        id: Uuid,
        items: Vec<NewLineItem>,
    ) -> Result<CustomerWithProducts, AppError> {
        let mut tx = self.pool.begin().await?;

        self.customers.find(&mut tx, id).await?.ok_or(AppError::CustomerNotFound)?;
        self.customers.insert_line_items(&mut tx, id, &items).await?;

        let customer = self
            .customers
            .find_with_products(&mut tx, id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;
        tx.commit().await?;
        Ok(customer)
    }
}
