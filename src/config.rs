// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::clock::{Clock, SystemClock},
    db::{
        CustomerRepository, DamagedProductRepository, DashboardRepository,
        NotificationRepository, ProductRepository, UserRepository,
    },
    services::{
        aggregator::VariantAggregator, auth::AuthService, customer_service::CustomerService,
        damage_service::DamageService, dashboard_service::DashboardService,
        notification_service::NotificationService, product_service::ProductService,
        purchase_service::PurchaseService, stock_service::StockService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub product_service: ProductService,
    pub stock_service: StockService,
    pub purchase_service: PurchaseService,
    pub customer_service: CustomerService,
    pub damage_service: DamageService,
    pub dashboard_service: DashboardService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET deve ser definido"))?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // --- Monta o grafo de dependências ---
        let users = UserRepository::new(db_pool.clone());
        let products = ProductRepository::new(db_pool.clone());
        let customers = CustomerRepository::new(db_pool.clone());
        let damaged = DamagedProductRepository::new(db_pool.clone());
        let notifications = NotificationRepository::new(db_pool.clone());
        let dashboard = DashboardRepository::new(db_pool.clone());

        let aggregator = VariantAggregator::new(products.clone());

        let auth_service = AuthService::new(users, jwt_secret, clock.clone());
        let product_service =
            ProductService::new(db_pool.clone(), products.clone(), aggregator.clone());
        let stock_service =
            StockService::new(db_pool.clone(), products.clone(), aggregator.clone());
        let purchase_service = PurchaseService::new(
            db_pool.clone(),
            customers.clone(),
            products.clone(),
            notifications.clone(),
            aggregator.clone(),
            clock.clone(),
        );
        let customer_service = CustomerService::new(
            db_pool.clone(),
            customers,
            notifications.clone(),
            clock.clone(),
        );
        let damage_service = DamageService::new(
            db_pool.clone(),
            damaged,
            products,
            notifications.clone(),
            aggregator,
            clock.clone(),
        );
        let dashboard_service = DashboardService::new(dashboard, clock.clone());
        let notification_service = NotificationService::new(db_pool.clone(), notifications);

        Ok(Self {
            db_pool,
            auth_service,
            product_service,
            stock_service,
            purchase_service,
            customer_service,
            damage_service,
            dashboard_service,
            notification_service,
        })
    }
}
