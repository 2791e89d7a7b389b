// src/db/notification_repo.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{common::error::AppError, models::notification::Notification};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    // Append na trilha de auditoria. Recebe a conexão da transação em curso:
    // a notificação faz parte do mesmo commit da mutação que a gerou.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        kind: &str,
        message: &str,
        product_id: Option<Uuid>,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications ("type", message, product_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(kind)
        .bind(message)
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(notification)
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"UPDATE notifications SET "read" = TRUE WHERE id = $1 RETURNING *"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        notification.ok_or(AppError::NotificationNotFound)
    }

    pub async fn mark_all_read(&self) -> Result<u64, AppError> {
        let result = sqlx::query(r#"UPDATE notifications SET "read" = TRUE WHERE "read" = FALSE"#)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
