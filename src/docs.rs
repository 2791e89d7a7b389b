// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Produtos ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::hide_product,
        handlers::products::unhide_product,
        handlers::products::receive_stock,
        handlers::products::deduct_stock,
        handlers::products::deduct_stock_by_name,

        // --- Variações ---
        handlers::variants::create_variant,
        handlers::variants::update_variant,
        handlers::variants::delete_variant,
        handlers::variants::receive_variant_stock,
        handlers::variants::deduct_variant_stock,
        handlers::variants::toggle_variant_hidden,
        handlers::variants::set_default_variant,

        // --- Clientes ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::append_customer_items,
        handlers::customers::purchase,

        // --- Avarias ---
        handlers::damaged::list_damaged,
        handlers::damaged::damaged_stats,
        handlers::damaged::report_damage,
        handlers::damaged::refund_damage,
        handlers::damaged::deduct_from_damage,

        // --- Notificações ---
        handlers::notifications::list_notifications,
        handlers::notifications::create_notification,
        handlers::notifications::mark_notification_read,
        handlers::notifications::mark_all_notifications_read,

        // --- Dashboard ---
        handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Inventário ---
            models::inventory::Product,
            models::inventory::ProductVariant,
            models::inventory::ProductWithVariants,
            handlers::products::ProductPayload,
            handlers::products::VariantPayload,
            handlers::products::StockMovePayload,
            handlers::variants::VariantResponse,

            // --- Clientes ---
            models::crm::Customer,
            models::crm::CustomerProduct,
            models::crm::CustomerWithProducts,
            handlers::customers::CustomerPayload,
            handlers::customers::LineItemPayload,
            handlers::customers::AppendItemsPayload,
            handlers::customers::InlineCustomerPayload,
            handlers::customers::PurchaseItemPayload,
            handlers::customers::PurchasePayload,
            handlers::customers::PurchaseResponse,

            // --- Avarias ---
            models::damaged::DamagedProduct,
            models::damaged::DamagedStats,
            handlers::damaged::DamageReportPayload,
            handlers::damaged::DeductFromDamagePayload,

            // --- Notificações ---
            models::notification::Notification,
            handlers::notifications::CreateNotificationPayload,
            handlers::notifications::MarkAllReadResponse,

            // --- Dashboard ---
            models::dashboard::DashboardData,
            models::dashboard::SalesMetrics,
            models::dashboard::Trend,
            models::dashboard::TrendDirection,
            models::dashboard::InventoryMetrics,
            models::dashboard::CustomerMetrics,
            models::dashboard::DamagedMetrics,
            models::dashboard::RecentTransaction,
            models::dashboard::TopProductEntry,
            models::dashboard::LowStockAlert,
            models::dashboard::StockSeverity,
            models::dashboard::SalesChartEntry,
            models::dashboard::CategoryDistributionEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Produtos", description = "Catálogo de Produtos"),
        (name = "Variações", description = "Variações (embalagens) de Produtos"),
        (name = "Estoque", description = "Entradas e Baixas de Estoque"),
        (name = "Clientes", description = "Clientes e Compras"),
        (name = "Avarias", description = "Produtos Avariados e Reembolsos"),
        (name = "Notificações", description = "Notificações do Sistema"),
        (name = "Dashboard", description = "Indicadores Gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
