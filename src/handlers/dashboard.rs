// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{common::error::AppError, config::AppState, models::dashboard::DashboardData};

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Métricas de vendas, estoque, clientes e avarias", body = DashboardData)
    ),
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
) -> Result<Json<DashboardData>, AppError> {
    Ok(Json(app_state.dashboard_service.overview().await?))
}
