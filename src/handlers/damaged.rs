// src/handlers/damaged.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::damaged::{DamagedProduct, DamagedStats},
    services::damage_service::DamageReport,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DamageReportPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do cliente é obrigatório."))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 255, message = "O nome do produto é obrigatório."))]
    pub product_name: String,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
    pub action_taken: Option<String>,
    pub variant_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 50, message = "A unidade de medida é obrigatória."))]
    pub unit_of_measurement: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeductFromDamagePayload {
    #[validate(length(min = 1, max = 255, message = "O nome do produto é obrigatório."))]
    pub product_name: String,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub variant_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/damaged-products",
    tag = "Avarias",
    responses(
        (status = 200, description = "Todos os relatos de avaria", body = Vec<DamagedProduct>)
    ),
)]
pub async fn list_damaged(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<DamagedProduct>>, AppError> {
    Ok(Json(app_state.damage_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/damaged-products/stats",
    tag = "Avarias",
    responses(
        (status = 200, description = "Total avariado e relatos recentes", body = DamagedStats)
    ),
)]
pub async fn damaged_stats(
    State(app_state): State<AppState>,
) -> Result<Json<DamagedStats>, AppError> {
    Ok(Json(app_state.damage_service.stats().await?))
}

#[utoipa::path(
    post,
    path = "/api/damaged-products",
    tag = "Avarias",
    request_body = DamageReportPayload,
    responses(
        (status = 201, description = "Avaria registrada", body = DamagedProduct),
        (status = 422, description = "Payload inválido")
    ),
)]
pub async fn report_damage(
    State(app_state): State<AppState>,
    Json(payload): Json<DamageReportPayload>,
) -> Result<(StatusCode, Json<DamagedProduct>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let damaged = app_state
        .damage_service
        .report(DamageReport {
            customer_name: payload.customer_name,
            product_name: payload.product_name,
            quantity: payload.quantity,
            reason: payload.reason,
            action_taken: payload.action_taken,
            variant_id: payload.variant_id,
            date: payload.date,
            unit_of_measurement: payload.unit_of_measurement,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(damaged)))
}

#[utoipa::path(
    post,
    path = "/api/damaged-products/{id}/refund",
    tag = "Avarias",
    params(("id" = Uuid, Path, description = "ID do relato")),
    responses(
        (status = 200, description = "Reembolso registrado", body = DamagedProduct),
        (status = 400, description = "Relato já reembolsado"),
        (status = 404, description = "Relato não encontrado")
    ),
)]
pub async fn refund_damage(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DamagedProduct>, AppError> {
    Ok(Json(app_state.damage_service.refund(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/inventory/deduct-from-damage",
    tag = "Avarias",
    request_body = DeductFromDamagePayload,
    responses(
        (status = 200, description = "Baixa de estoque aplicada"),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Produto ou variação não encontrados")
    ),
)]
pub async fn deduct_from_damage(
    State(app_state): State<AppState>,
    Json(payload): Json<DeductFromDamagePayload>,
) -> Result<StatusCode, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    app_state
        .damage_service
        .deduct_from_damage(&payload.product_name, payload.quantity, payload.variant_id)
        .await?;
    Ok(StatusCode::OK)
}
