// src/handlers/variants.rs
//
// Sub-recurso /api/products/{id}/variants. Toda resposta de escrita
// devolve também o produto recarregado, com os campos rollup já atualizados.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::products::{StockMovePayload, VariantPayload},
    models::inventory::{ProductVariant, ProductWithVariants},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantResponse {
    pub variant: ProductVariant,
    pub product: ProductWithVariants,
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/variants",
    tag = "Variações",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = VariantPayload,
    responses(
        (status = 201, description = "Variação criada", body = VariantResponse),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "SKU já cadastrado")
    ),
)]
pub async fn create_variant(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<VariantPayload>,
) -> Result<(StatusCode, Json<VariantResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    payload.validate_prices()?;
    let (variant, product) = app_state
        .product_service
        .create_variant(product_id, payload.into_input())
        .await?;
    Ok((StatusCode::CREATED, Json(VariantResponse { variant, product })))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/variants/{variant_id}",
    tag = "Variações",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variação")
    ),
    request_body = VariantPayload,
    responses(
        (status = 200, description = "Variação atualizada", body = VariantResponse),
        (status = 404, description = "Variação não encontrada neste produto")
    ),
)]
pub async fn update_variant(
    State(app_state): State<AppState>,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<VariantPayload>,
) -> Result<Json<VariantResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    payload.validate_prices()?;
    let (variant, product) = app_state
        .product_service
        .update_variant(product_id, variant_id, payload.into_input())
        .await?;
    Ok(Json(VariantResponse { variant, product }))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/variants/{variant_id}",
    tag = "Variações",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variação")
    ),
    responses(
        (status = 200, description = "Variação removida", body = ProductWithVariants),
        (status = 404, description = "Variação não encontrada neste produto"),
        (status = 422, description = "Última variação do produto")
    ),
)]
pub async fn delete_variant(
    State(app_state): State<AppState>,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProductWithVariants>, AppError> {
    Ok(Json(app_state.product_service.delete_variant(product_id, variant_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/variants/{variant_id}/receive",
    tag = "Variações",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variação")
    ),
    request_body = StockMovePayload,
    responses(
        (status = 200, description = "Entrada aplicada na variação", body = VariantResponse),
        (status = 404, description = "Variação não encontrada neste produto")
    ),
)]
pub async fn receive_variant_stock(
    State(app_state): State<AppState>,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StockMovePayload>,
) -> Result<Json<VariantResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let (variant, product) = app_state
        .stock_service
        .receive_variant(product_id, variant_id, payload.quantity)
        .await?;
    Ok(Json(VariantResponse { variant, product }))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/variants/{variant_id}/deduct",
    tag = "Variações",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variação")
    ),
    request_body = StockMovePayload,
    responses(
        (status = 200, description = "Baixa aplicada na variação", body = VariantResponse),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Variação não encontrada neste produto")
    ),
)]
pub async fn deduct_variant_stock(
    State(app_state): State<AppState>,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StockMovePayload>,
) -> Result<Json<VariantResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let (variant, product) = app_state
        .stock_service
        .deduct_variant(product_id, variant_id, payload.quantity)
        .await?;
    Ok(Json(VariantResponse { variant, product }))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/variants/{variant_id}/toggle-hidden",
    tag = "Variações",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variação")
    ),
    responses(
        (status = 200, description = "Visibilidade alternada", body = VariantResponse),
        (status = 404, description = "Variação não encontrada neste produto")
    ),
)]
pub async fn toggle_variant_hidden(
    State(app_state): State<AppState>,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<VariantResponse>, AppError> {
    let (variant, product) = app_state
        .product_service
        .toggle_variant_hidden(product_id, variant_id)
        .await?;
    Ok(Json(VariantResponse { variant, product }))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/variants/{variant_id}/set-default",
    tag = "Variações",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("variant_id" = Uuid, Path, description = "ID da variação")
    ),
    responses(
        (status = 200, description = "Variação padrão trocada", body = ProductWithVariants),
        (status = 404, description = "Variação não encontrada neste produto")
    ),
)]
pub async fn set_default_variant(
    State(app_state): State<AppState>,
    Path((product_id, variant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProductWithVariants>, AppError> {
    Ok(Json(app_state.product_service.set_default_variant(product_id, variant_id).await?))
}
