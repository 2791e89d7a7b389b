// src/handlers/notifications.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::notification::Notification};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationPayload {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "O tipo é obrigatório."))]
    pub kind: String,
    #[validate(length(min = 1, message = "A mensagem é obrigatória."))]
    pub message: String,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notificações",
    responses(
        (status = 200, description = "Notificações, mais recentes primeiro", body = Vec<Notification>)
    ),
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(app_state.notification_service.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/notifications",
    tag = "Notificações",
    request_body = CreateNotificationPayload,
    responses(
        (status = 201, description = "Notificação criada", body = Notification)
    ),
)]
pub async fn create_notification(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateNotificationPayload>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let notification = app_state
        .notification_service
        .create(&payload.kind, &payload.message, payload.product_id)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    tag = "Notificações",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação marcada como lida", body = Notification),
        (status = 404, description = "Notificação não encontrada")
    ),
)]
pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(app_state.notification_service.mark_read(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/notifications/mark-all-read",
    tag = "Notificações",
    responses(
        (status = 200, description = "Todas marcadas como lidas", body = MarkAllReadResponse)
    ),
)]
pub async fn mark_all_notifications_read(
    State(app_state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let marked = app_state.notification_service.mark_all_read().await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
