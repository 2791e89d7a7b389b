// src/services/notification_service.rs
//
// A maior parte das notificações nasce dentro das transações dos outros
// serviços; aqui ficam só a listagem, a criação manual e o controle de leitura.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError, db::NotificationRepository, models::notification::Notification,
};

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    notifications: NotificationRepository,
}

impl NotificationService {
    pub fn new(pool: PgPool, notifications: NotificationRepository) -> Self {
        Self { pool, notifications }
    }

    pub async fn list(&self) -> Result<Vec<Notification>, AppError> {
        self.notifications.list_all().await
    }

    pub async fn create(
        &self,
        kind: &str,
        message: &str,
        product_id: Option<Uuid>,
    ) -> Result<Notification, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.notifications.create(&mut conn, kind, message, product_id).await
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Notification, AppError> {
        self.notifications.mark_read(id).await
    }

    pub async fn mark_all_read(&self) -> Result<u64, AppError> {
        self.notifications.mark_all_read().await
    }
}
