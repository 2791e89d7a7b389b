// src/handlers/products.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::inventory::{Product, ProductWithVariants},
    services::product_service::{ProductInput, VariantInput},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VariantPayload {
    pub id: Option<Uuid>,
    #[validate(length(max = 100, message = "SKU longo demais."))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 100, message = "O rótulo da variação é obrigatório."))]
    pub unit_label: String,
    #[serde(default)]
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    #[serde(default)]
    pub quantity: i32,
    pub conversion_factor: Option<Decimal>,
    pub barcode: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl VariantPayload {
    // Preços não passam pelo derive do validator (Decimal); checagem manual.
    pub fn validate_prices(&self) -> Result<(), AppError> {
        let mut errors = validator::ValidationErrors::new();
        if self.unit_price < Decimal::ZERO {
            let mut err = validator::ValidationError::new("range");
            err.message = Some("O preço não pode ser negativo.".into());
            errors.add("unit_price", err);
        }
        if self.cost_price < Decimal::ZERO {
            let mut err = validator::ValidationError::new("range");
            err.message = Some("O custo não pode ser negativo.".into());
            errors.add("cost_price", err);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(errors))
        }
    }

    pub fn into_input(self) -> VariantInput {
        VariantInput {
            id: self.id,
            sku: self.sku,
            unit_label: self.unit_label,
            cost_price: self.cost_price,
            unit_price: self.unit_price,
            quantity: self.quantity,
            conversion_factor: self.conversion_factor,
            barcode: self.barcode,
            is_default: self.is_default,
            hidden: self.hidden,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do produto é obrigatório."))]
    pub name: String,
    pub sku: Option<String>,
    #[serde(default)]
    pub cost_price: Decimal,
    #[serde(default)]
    pub unit_price: Decimal,
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    #[serde(default)]
    pub quantity: i32,
    #[validate(length(min = 1, max = 50, message = "A unidade de medida é obrigatória."))]
    pub unit_of_measurement: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub variants: Vec<VariantPayload>,
}

impl ProductPayload {
    fn into_input(self) -> Result<ProductInput, AppError> {
        for v in &self.variants {
            v.validate_prices()?;
        }
        Ok(ProductInput {
            name: self.name,
            sku: self.sku,
            cost_price: self.cost_price,
            unit_price: self.unit_price,
            quantity: self.quantity,
            unit_of_measurement: self.unit_of_measurement,
            category: self.category,
            image_url: self.image_url,
            variants: self.variants.into_iter().map(VariantPayload::into_input).collect(),
        })
    }
}

// Delta de estoque (entrada ou baixa); sem variant_id vale a política de
// resolução padrão.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockMovePayload {
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub variant_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Produtos",
    responses(
        (status = 200, description = "Todos os produtos com suas variações", body = Vec<ProductWithVariants>)
    ),
)]
pub async fn list_products(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ProductWithVariants>>, AppError> {
    Ok(Json(app_state.product_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto com variações", body = ProductWithVariants),
        (status = 404, description = "Produto não encontrado")
    ),
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductWithVariants>, AppError> {
    Ok(Json(app_state.product_service.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Produtos",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = ProductWithVariants),
        (status = 409, description = "Nome de produto já cadastrado"),
        (status = 422, description = "Payload inválido")
    ),
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<ProductWithVariants>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let product = app_state.product_service.create(payload.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = ProductWithVariants),
        (status = 404, description = "Produto não encontrado")
    ),
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductWithVariants>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    Ok(Json(app_state.product_service.update(id, payload.into_input()?).await?))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/hide",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto ocultado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
)]
pub async fn hide_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(app_state.product_service.set_hidden(id, true).await?))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/unhide",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto visível novamente", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
)]
pub async fn unhide_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(app_state.product_service.set_hidden(id, false).await?))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/receive",
    tag = "Estoque",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = StockMovePayload,
    responses(
        (status = 200, description = "Entrada aplicada", body = ProductWithVariants),
        (status = 404, description = "Produto ou variação não encontrados")
    ),
)]
pub async fn receive_stock(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockMovePayload>,
) -> Result<Json<ProductWithVariants>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let product = app_state
        .stock_service
        .receive(id, payload.quantity, payload.variant_id)
        .await?;
    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}/deducted",
    tag = "Estoque",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = StockMovePayload,
    responses(
        (status = 200, description = "Baixa aplicada", body = ProductWithVariants),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Produto ou variação não encontrados")
    ),
)]
pub async fn deduct_stock(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockMovePayload>,
) -> Result<Json<ProductWithVariants>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let product = app_state
        .stock_service
        .deduct_by_id(id, payload.quantity, payload.variant_id)
        .await?;
    Ok(Json(product))
}

// Variante legada da baixa, endereçada pelo nome do produto. Passa pelas
// mesmas validações de saldo da baixa por id.
#[utoipa::path(
    put,
    path = "/api/products/{id}/deduct",
    tag = "Estoque",
    params(("id" = String, Path, description = "Nome exato do produto")),
    request_body = StockMovePayload,
    responses(
        (status = 200, description = "Baixa aplicada", body = ProductWithVariants),
        (status = 400, description = "Estoque insuficiente"),
        (status = 404, description = "Produto não encontrado")
    ),
)]
pub async fn deduct_stock_by_name(
    State(app_state): State<AppState>,
    Path(product_name): Path<String>,
    Json(payload): Json<StockMovePayload>,
) -> Result<Json<ProductWithVariants>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let product = app_state
        .stock_service
        .deduct_by_name(&product_name, payload.quantity, payload.variant_id)
        .await?;
    Ok(Json(product))
}
