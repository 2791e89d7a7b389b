// src/handlers/customers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::customer_repo::NewLineItem,
    models::crm::CustomerWithProducts,
    services::purchase_service::{PurchaseCustomer, PurchaseLine},
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LineItemPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do produto é obrigatório."))]
    pub product_name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub purchase_date: Option<DateTime<Utc>>,
}

impl LineItemPayload {
    fn into_item(self) -> NewLineItem {
        NewLineItem {
            product_name: self.product_name,
            category: self.category,
            unit: self.unit,
            quantity: self.quantity,
            purchase_date: self.purchase_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do cliente é obrigatório."))]
    pub name: String,
    pub phone: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub products: Vec<LineItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AppendItemsPayload {
    #[validate(nested, length(min = 1, message = "Informe ao menos um item."))]
    pub products: Vec<LineItemPayload>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InlineCustomerPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do cliente é obrigatório."))]
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseItemPayload {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "O nome do produto é obrigatório."))]
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PurchasePayload {
    pub customer_id: Option<Uuid>,
    #[validate(nested)]
    pub customer: Option<InlineCustomerPayload>,
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount_paid: Decimal,
    #[validate(nested, length(min = 1, message = "A compra precisa de ao menos um item."))]
    pub products: Vec<PurchaseItemPayload>,
}

impl PurchasePayload {
    // Regras que o derive não cobre: exatamente UM entre customer_id e
    // customer, e amount_paid não negativo. Devolve o cliente já resolvido,
    // então não existe caminho válido sem um.
    fn resolve_customer(&self) -> Result<PurchaseCustomer, AppError> {
        let mut errors = validator::ValidationErrors::new();

        let customer = match (&self.customer_id, &self.customer) {
            (Some(id), None) => Some(PurchaseCustomer::Existing(*id)),
            (None, Some(inline)) => Some(PurchaseCustomer::New {
                name: inline.name.clone(),
                phone: inline.phone.clone(),
            }),
            (None, None) => {
                let mut err = validator::ValidationError::new("required");
                err.message = Some("Informe customer_id ou os dados do cliente.".into());
                errors.add("customer_id", err);
                None
            }
            (Some(_), Some(_)) => {
                let mut err = validator::ValidationError::new("conflict");
                err.message = Some("customer_id e customer são mutuamente exclusivos.".into());
                errors.add("customer_id", err);
                None
            }
        };
        if self.amount_paid < Decimal::ZERO {
            let mut err = validator::ValidationError::new("range");
            err.message = Some("O valor pago não pode ser negativo.".into());
            errors.add("amount_paid", err);
        }

        match customer {
            Some(customer) if errors.is_empty() => Ok(customer),
            _ => Err(AppError::ValidationError(errors)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub reference: String,
    pub customer: CustomerWithProducts,
    pub items: usize,
}

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    responses(
        (status = 200, description = "Clientes com seus itens de compra", body = Vec<CustomerWithProducts>)
    ),
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CustomerWithProducts>>, AppError> {
    Ok(Json(app_state.customer_service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente com itens", body = CustomerWithProducts),
        (status = 404, description = "Cliente não encontrado")
    ),
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerWithProducts>, AppError> {
    Ok(Json(app_state.customer_service.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = CustomerWithProducts),
        (status = 422, description = "Payload inválido")
    ),
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<(StatusCode, Json<CustomerWithProducts>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let items = payload.products.into_iter().map(LineItemPayload::into_item).collect();
    let customer = app_state
        .customer_service
        .create(payload.name, payload.phone, payload.purchase_date, items)
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

// Histórico é append-only: o PUT acrescenta itens, nunca edita os existentes.
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = AppendItemsPayload,
    responses(
        (status = 200, description = "Itens acrescentados", body = CustomerWithProducts),
        (status = 404, description = "Cliente não encontrado")
    ),
)]
pub async fn append_customer_items(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppendItemsPayload>,
) -> Result<Json<CustomerWithProducts>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let items = payload.products.into_iter().map(LineItemPayload::into_item).collect();
    Ok(Json(app_state.customer_service.append_items(id, items).await?))
}

#[utoipa::path(
    post,
    path = "/api/customers/purchase",
    tag = "Clientes",
    request_body = PurchasePayload,
    responses(
        (status = 201, description = "Compra processada", body = PurchaseResponse),
        (status = 404, description = "Cliente ou variação não encontrados"),
        (status = 422, description = "Estoque insuficiente para algum item")
    ),
)]
pub async fn purchase(
    State(app_state): State<AppState>,
    Json(payload): Json<PurchasePayload>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let customer = payload.resolve_customer()?;

    let items: Vec<PurchaseLine> = payload
        .products
        .into_iter()
        .map(|item| PurchaseLine {
            product_id: item.product_id,
            variant_id: item.variant_id,
            product_name: item.product_name,
            category: item.category,
            unit: item.unit,
            quantity: item.quantity,
            purchase_date: item.purchase_date,
        })
        .collect();

    let outcome = app_state
        .purchase_service
        .purchase(customer, payload.purchase_date, items)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            reference: outcome.reference,
            customer: outcome.customer,
            items: outcome.items,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(customer_id: Option<Uuid>, inline: Option<&str>) -> PurchasePayload {
        PurchasePayload {
            customer_id,
            customer: inline.map(|name| InlineCustomerPayload {
                name: name.to_string(),
                phone: None,
            }),
            purchase_date: None,
            amount_paid: Decimal::ZERO,
            products: vec![],
        }
    }

    #[test]
    fn customer_id_resolve_cliente_existente() {
        let id = Uuid::new_v4();
        let customer = payload(Some(id), None).resolve_customer().unwrap();
        assert!(matches!(customer, PurchaseCustomer::Existing(resolved) if resolved == id));
    }

    #[test]
    fn dados_inline_resolvem_cliente_novo() {
        let customer = payload(None, Some("Dona Maria")).resolve_customer().unwrap();
        assert!(matches!(customer, PurchaseCustomer::New { name, .. } if name == "Dona Maria"));
    }

    #[test]
    fn sem_cliente_algum_e_erro_de_validacao() {
        let err = payload(None, None).resolve_customer().unwrap_err();
        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação");
        };
        assert!(errors.field_errors().contains_key("customer_id"));
    }

    #[test]
    fn cliente_duplicado_e_erro_de_validacao() {
        let err = payload(Some(Uuid::new_v4()), Some("Dona Maria")).resolve_customer().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn valor_pago_negativo_e_rejeitado() {
        let mut p = payload(Some(Uuid::new_v4()), None);
        p.amount_paid = Decimal::NEGATIVE_ONE;
        let err = p.resolve_customer().unwrap_err();
        let AppError::ValidationError(errors) = err else {
            panic!("esperava erro de validação");
        };
        assert!(errors.field_errors().contains_key("amount_paid"));
    }
}
