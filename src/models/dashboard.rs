// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// 1. Cards de vendas (hoje / mês / lucro / tendências)
#[derive(Debug, Serialize, ToSchema)]
pub struct SalesMetrics {
    pub total_sales: Decimal,
    pub today_sales: Decimal,
    pub yesterday_sales: Decimal,
    pub month_sales: Decimal,
    pub last_month_sales: Decimal,
    pub total_profit: Decimal,
    pub today_profit: Decimal,
    pub month_profit: Decimal,
    pub today_orders: i64,
    pub month_orders: i64,
    pub daily_trend: Trend,
    pub monthly_trend: Trend,
    pub average_order_value: Decimal,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct Trend {
    pub value: Decimal,
    pub direction: TrendDirection,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

// 2. Saúde do estoque
#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryMetrics {
    pub total_products: i64,
    pub total_items: i64,
    pub total_value: Decimal,
    pub in_stock: i64,
    pub low_stock: i64,
    pub critical_stock: i64,
    pub out_of_stock: i64,
    pub total_categories: i64,
    pub stock_health: Decimal,
    pub alerts_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerMetrics {
    pub total_customers: i64,
    pub today_customers: i64,
    pub month_customers: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DamagedMetrics {
    pub total_damaged: i64,
    pub total_loss: Decimal,
    pub month_damaged: i64,
    pub month_loss: Decimal,
    pub total_reports: i64,
}

// 3. Últimas transações (clientes mais recentes com total estimado)
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentTransaction {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub total_amount: Decimal,
    pub items_count: i64,
    pub purchase_date: Option<chrono::DateTime<chrono::Utc>>,
}

// 4. Curva dos mais vendidos
#[derive(Debug, Serialize, ToSchema)]
pub struct TopProductEntry {
    pub rank: usize,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
    pub orders: i64,
    pub category: String,
    pub current_stock: i32,
}

// 5. Alertas de estoque baixo
#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockAlert {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub category: Option<String>,
    pub unit: String,
    pub severity: StockSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockSeverity {
    OutOfStock,
    Critical,
    Low,
}

// 6. Gráfico de vendas (últimos 7 dias, dias vazios preenchidos com zero)
#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct SalesChartEntry {
    pub date: NaiveDate,
    pub day: String,
    pub sales: Decimal,
    pub orders: i64,
}

// 7. Distribuição por categoria
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDistributionEntry {
    pub category: String,
    pub products: i64,
    pub stock: i64,
    pub value: Decimal,
}

// Payload completo do dashboard, no formato que o frontend consome.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardData {
    pub sales: SalesMetrics,
    pub inventory: InventoryMetrics,
    pub customers: CustomerMetrics,
    pub damaged: DamagedMetrics,
    pub recent_transactions: Vec<RecentTransaction>,
    pub top_products: Vec<TopProductEntry>,
    pub low_stock_alerts: Vec<LowStockAlert>,
    pub sales_chart: Vec<SalesChartEntry>,
    pub category_distribution: Vec<CategoryDistributionEntry>,
}
