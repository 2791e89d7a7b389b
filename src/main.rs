// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Somente o perfil do usuário exige Bearer token.
    let protected_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    let api_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        // Produtos
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::products::get_product).put(handlers::products::update_product),
        )
        .route("/products/{id}/hide", put(handlers::products::hide_product))
        .route("/products/{id}/unhide", put(handlers::products::unhide_product))
        .route("/products/{id}/receive", put(handlers::products::receive_stock))
        .route("/products/{id}/deducted", put(handlers::products::deduct_stock))
        // Baixa legada, endereçada pelo nome do produto.
        .route("/products/{id}/deduct", put(handlers::products::deduct_stock_by_name))
        // Variações
        .route("/products/{id}/variants", post(handlers::variants::create_variant))
        .route(
            "/products/{id}/variants/{variant_id}",
            put(handlers::variants::update_variant).delete(handlers::variants::delete_variant),
        )
        .route(
            "/products/{id}/variants/{variant_id}/receive",
            put(handlers::variants::receive_variant_stock),
        )
        .route(
            "/products/{id}/variants/{variant_id}/deduct",
            put(handlers::variants::deduct_variant_stock),
        )
        .route(
            "/products/{id}/variants/{variant_id}/toggle-hidden",
            put(handlers::variants::toggle_variant_hidden),
        )
        .route(
            "/products/{id}/variants/{variant_id}/set-default",
            put(handlers::variants::set_default_variant),
        )
        // Clientes
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/customers/purchase", post(handlers::customers::purchase))
        .route(
            "/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::append_customer_items),
        )
        // Avarias
        .route(
            "/damaged-products",
            get(handlers::damaged::list_damaged).post(handlers::damaged::report_damage),
        )
        .route("/damaged-products/stats", get(handlers::damaged::damaged_stats))
        .route("/damaged-products/{id}/refund", post(handlers::damaged::refund_damage))
        .route("/inventory/deduct-from-damage", post(handlers::damaged::deduct_from_damage))
        // Notificações
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications)
                .post(handlers::notifications::create_notification),
        )
        .route(
            "/notifications/mark-all-read",
            put(handlers::notifications::mark_all_notifications_read),
        )
        .route(
            "/notifications/{id}/read",
            put(handlers::notifications::mark_notification_read),
        );

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes.merge(protected_routes))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
