// src/services/dashboard_service.rs
//
// Agregação do dashboard. O banco entrega linhas cruas; as dobras em métricas
// (janelas de tempo, tendências, severidade de estoque) são funções puras
// sobre essas linhas, testáveis sem banco.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{
        dashboard_repo::{DamagedRow, DaySalesRow, ProductStockRow, SaleRow},
        DashboardRepository,
    },
    models::dashboard::{
        CategoryDistributionEntry, CustomerMetrics, DamagedMetrics, DashboardData,
        InventoryMetrics, LowStockAlert, RecentTransaction, SalesChartEntry, SalesMetrics,
        StockSeverity, TopProductEntry, Trend, TrendDirection,
    },
};

// Limiares de estoque, em unidades da variação.
pub(crate) const STOCK_CRITICAL_MAX: i32 = 10;
pub(crate) const STOCK_LOW_MAX: i32 = 20;

const SEM_CATEGORIA: &str = "Sem categoria";

// ---
// Janelas de tempo
// ---

fn month_start(day: NaiveDate) -> NaiveDate {
    // with_day(1) nunca falha para um dia válido
    day.with_day(1).unwrap_or(day)
}

// (início, fim) do mês anterior ao mês de `day`.
fn previous_month(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = month_start(day) - Duration::days(1);
    (month_start(end), end)
}

// ---
// Tendências
// ---

// Variação percentual entre dois períodos. Partindo do zero, qualquer venda é
// tratada como +100%; zero contra zero é neutro.
pub(crate) fn calculate_trend(current: Decimal, previous: Decimal) -> Trend {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Trend { value: Decimal::from(100), direction: TrendDirection::Up }
        } else {
            Trend { value: Decimal::ZERO, direction: TrendDirection::Neutral }
        };
    }

    let percent = ((current - previous) / previous * Decimal::from(100)).round_dp(1);
    let direction = if percent > Decimal::ZERO {
        TrendDirection::Up
    } else if percent < Decimal::ZERO {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    Trend { value: percent.abs(), direction }
}

// ---
// Vendas
// ---

pub(crate) fn fold_sales_metrics(rows: &[SaleRow], today: NaiveDate) -> SalesMetrics {
    let yesterday = today - Duration::days(1);
    let this_month = month_start(today);
    let (last_month_start, last_month_end) = previous_month(today);

    let mut total_sales = Decimal::ZERO;
    let mut today_sales = Decimal::ZERO;
    let mut yesterday_sales = Decimal::ZERO;
    let mut month_sales = Decimal::ZERO;
    let mut last_month_sales = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;
    let mut today_profit = Decimal::ZERO;
    let mut month_profit = Decimal::ZERO;
    let mut today_orders = 0i64;
    let mut month_orders = 0i64;

    for row in rows {
        let quantity = Decimal::from(row.quantity);
        let revenue = quantity * row.unit_price;
        let profit = quantity * (row.unit_price - row.cost_price);

        total_sales += revenue;
        total_profit += profit;

        // Linhas sem data entram só nos totais acumulados.
        let Some(day) = row.purchase_date.map(|d| d.date_naive()) else {
            continue;
        };
        if day == today {
            today_sales += revenue;
            today_profit += profit;
            today_orders += 1;
        }
        if day == yesterday {
            yesterday_sales += revenue;
        }
        if day >= this_month && day <= today {
            month_sales += revenue;
            month_profit += profit;
            month_orders += 1;
        }
        if day >= last_month_start && day <= last_month_end {
            last_month_sales += revenue;
        }
    }

    let average_order_value = if rows.is_empty() {
        Decimal::ZERO
    } else {
        (total_sales / Decimal::from(rows.len() as i64)).round_dp(2)
    };

    SalesMetrics {
        daily_trend: calculate_trend(today_sales, yesterday_sales),
        monthly_trend: calculate_trend(month_sales, last_month_sales),
        total_sales,
        today_sales,
        yesterday_sales,
        month_sales,
        last_month_sales,
        total_profit,
        today_profit,
        month_profit,
        today_orders,
        month_orders,
        average_order_value,
    }
}

// ---
// Estoque
// ---

// Visão de estoque de um produto já reduzida ao que o dashboard precisa. Com
// variações, vale a MENOR quantidade entre as visíveis (a embalagem que acaba
// primeiro é a que dispara o alerta).
#[derive(Debug)]
pub(crate) struct ProductStock {
    pub id: uuid::Uuid,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub unit_price: Decimal,
}

pub(crate) fn group_product_stock(rows: &[ProductStockRow]) -> Vec<ProductStock> {
    let mut grouped: Vec<ProductStock> = Vec::new();
    for row in rows {
        let visible = match (row.variant_quantity, row.variant_hidden) {
            (Some(quantity), Some(false)) => Some((quantity, row.unit_label.clone())),
            _ => None,
        };

        match grouped.iter_mut().find(|p| p.id == row.id) {
            Some(product) => {
                if let Some((quantity, unit_label)) = visible {
                    if quantity < product.quantity {
                        product.quantity = quantity;
                        product.unit = unit_label.unwrap_or_else(|| product.unit.clone());
                    }
                }
            }
            None => {
                let (quantity, unit) = match visible {
                    Some((quantity, unit_label)) => {
                        (quantity, unit_label.unwrap_or_else(|| row.unit_of_measurement.clone()))
                    }
                    // Sem variação visível vale o rollup do produto.
                    None => (row.product_quantity, row.unit_of_measurement.clone()),
                };
                grouped.push(ProductStock {
                    id: row.id,
                    name: row.name.clone(),
                    category: row.category.clone(),
                    quantity,
                    unit,
                    unit_price: row.unit_price,
                });
            }
        }
    }
    grouped
}

pub(crate) fn severity(quantity: i32) -> Option<StockSeverity> {
    if quantity <= 0 {
        Some(StockSeverity::OutOfStock)
    } else if quantity <= STOCK_CRITICAL_MAX {
        Some(StockSeverity::Critical)
    } else if quantity <= STOCK_LOW_MAX {
        Some(StockSeverity::Low)
    } else {
        None
    }
}

pub(crate) fn fold_inventory_metrics(products: &[ProductStock]) -> InventoryMetrics {
    let mut in_stock = 0i64;
    let mut low_stock = 0i64;
    let mut critical_stock = 0i64;
    let mut out_of_stock = 0i64;
    let mut total_items = 0i64;
    let mut total_value = Decimal::ZERO;
    let mut categories: Vec<&str> = Vec::new();

    for product in products {
        total_items += i64::from(product.quantity.max(0));
        total_value += Decimal::from(product.quantity.max(0)) * product.unit_price;
        if let Some(category) = product.category.as_deref() {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        match severity(product.quantity) {
            Some(StockSeverity::OutOfStock) => out_of_stock += 1,
            Some(StockSeverity::Critical) => critical_stock += 1,
            Some(StockSeverity::Low) => low_stock += 1,
            None => in_stock += 1,
        }
    }

    let total_products = products.len() as i64;
    let stock_health = if total_products > 0 {
        (Decimal::from(in_stock * 100) / Decimal::from(total_products)).round_dp(1)
    } else {
        Decimal::ZERO
    };

    InventoryMetrics {
        total_products,
        total_items,
        total_value,
        in_stock,
        low_stock,
        critical_stock,
        out_of_stock,
        total_categories: categories.len() as i64,
        stock_health,
        alerts_count: low_stock + critical_stock + out_of_stock,
    }
}

pub(crate) fn low_stock_alerts(products: &[ProductStock]) -> Vec<LowStockAlert> {
    let mut alerts: Vec<LowStockAlert> = products
        .iter()
        .filter_map(|product| {
            severity(product.quantity).map(|severity| LowStockAlert {
                id: product.id,
                name: product.name.clone(),
                quantity: product.quantity,
                category: product.category.clone(),
                unit: product.unit.clone(),
                severity,
            })
        })
        .collect();
    alerts.sort_by_key(|a| a.quantity);
    alerts.truncate(10);
    alerts
}

pub(crate) fn category_distribution(products: &[ProductStock]) -> Vec<CategoryDistributionEntry> {
    let mut entries: Vec<CategoryDistributionEntry> = Vec::new();
    for product in products {
        let category = product.category.as_deref().unwrap_or(SEM_CATEGORIA);
        let stock = i64::from(product.quantity.max(0));
        let value = Decimal::from(product.quantity.max(0)) * product.unit_price;

        match entries.iter_mut().find(|e| e.category == category) {
            Some(entry) => {
                entry.products += 1;
                entry.stock += stock;
                entry.value += value;
            }
            None => entries.push(CategoryDistributionEntry {
                category: category.to_string(),
                products: 1,
                stock,
                value,
            }),
        }
    }
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

// ---
// Avarias
// ---

pub(crate) fn fold_damaged_metrics(rows: &[DamagedRow], today: NaiveDate) -> DamagedMetrics {
    let this_month = month_start(today);
    let mut total_damaged = 0i64;
    let mut total_loss = Decimal::ZERO;
    let mut month_damaged = 0i64;
    let mut month_loss = Decimal::ZERO;

    for row in rows {
        let loss = Decimal::from(row.quantity) * row.unit_price;
        total_damaged += i64::from(row.quantity);
        total_loss += loss;

        let day = row.date.unwrap_or_else(|| row.created_at.date_naive());
        if day >= this_month && day <= today {
            month_damaged += i64::from(row.quantity);
            month_loss += loss;
        }
    }

    DamagedMetrics {
        total_damaged,
        total_loss,
        month_damaged,
        month_loss,
        total_reports: rows.len() as i64,
    }
}

// ---
// Gráfico de 7 dias
// ---

// Janela fixa terminando hoje; dia sem venda aparece zerado em vez de sumir.
pub(crate) fn fill_chart(rows: &[DaySalesRow], today: NaiveDate) -> Vec<SalesChartEntry> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let (sales, orders) = rows
                .iter()
                .find(|r| r.sale_date == date)
                .map(|r| (r.sales, r.orders))
                .unwrap_or((Decimal::ZERO, 0));
            SalesChartEntry { date, day: date.format("%a").to_string(), sales, orders }
        })
        .collect()
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct DashboardService {
    dashboard: DashboardRepository,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(dashboard: DashboardRepository, clock: Arc<dyn Clock>) -> Self {
        Self { dashboard, clock }
    }

    pub async fn overview(&self) -> Result<DashboardData, AppError> {
        let today = self.clock.now().date_naive();
        let this_month = month_start(today);

        let sale_rows = self.dashboard.sale_rows().await?;
        let stock_rows = self.dashboard.product_stock_rows().await?;
        let damaged_rows = self.dashboard.damaged_rows().await?;

        let products = group_product_stock(&stock_rows);

        let customers = CustomerMetrics {
            total_customers: self.dashboard.count_customers().await?,
            today_customers: self.dashboard.count_customers_on(today).await?,
            month_customers: self.dashboard.count_customers_between(this_month, today).await?,
        };

        let recent_transactions = self.recent_transactions().await?;

        let top_products = self
            .dashboard
            .top_products(5)
            .await?
            .into_iter()
            .enumerate()
            .map(|(i, row)| TopProductEntry {
                rank: i + 1,
                name: row.name,
                quantity_sold: row.quantity_sold,
                revenue: row.revenue,
                orders: row.orders,
                category: row.category.unwrap_or_else(|| SEM_CATEGORIA.to_string()),
                current_stock: row.current_stock,
            })
            .collect();

        let chart_rows =
            self.dashboard.sales_by_day(today - Duration::days(6), today).await?;

        Ok(DashboardData {
            sales: fold_sales_metrics(&sale_rows, today),
            inventory: fold_inventory_metrics(&products),
            customers,
            damaged: fold_damaged_metrics(&damaged_rows, today),
            recent_transactions,
            top_products,
            low_stock_alerts: low_stock_alerts(&products),
            sales_chart: fill_chart(&chart_rows, today),
            category_distribution: category_distribution(&products),
        })
    }

    async fn recent_transactions(&self) -> Result<Vec<RecentTransaction>, AppError> {
        let customers = self.dashboard.recent_customers(10).await?;
        let ids: Vec<uuid::Uuid> = customers.iter().map(|c| c.id).collect();
        let totals = self.dashboard.customer_totals(&ids).await?;

        Ok(customers
            .into_iter()
            .map(|customer| {
                let total = totals.iter().find(|t| t.customer_id == customer.id);
                RecentTransaction {
                    id: customer.id,
                    customer_name: customer.name,
                    customer_phone: customer.phone.unwrap_or_default(),
                    total_amount: total.map(|t| t.total_amount).unwrap_or(Decimal::ZERO),
                    items_count: total.map(|t| t.items_count).unwrap_or(0),
                    purchase_date: customer.purchase_date,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sale(quantity: i32, unit_price: i64, cost_price: i64, day: Option<NaiveDate>) -> SaleRow {
        SaleRow {
            quantity,
            purchase_date: day
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt)),
            unit_price: Decimal::from(unit_price),
            cost_price: Decimal::from(cost_price),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tendencia_partindo_de_zero_e_cem_por_cento_para_cima() {
        let trend = calculate_trend(Decimal::from(50), Decimal::ZERO);
        assert_eq!(trend, Trend { value: Decimal::from(100), direction: TrendDirection::Up });

        let trend = calculate_trend(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(trend, Trend { value: Decimal::ZERO, direction: TrendDirection::Neutral });
    }

    #[test]
    fn tendencia_de_queda_com_valor_absoluto() {
        // 150 -> 100: queda de 33.3%
        let trend = calculate_trend(Decimal::from(100), Decimal::from(150));
        assert_eq!(trend.direction, TrendDirection::Down);
        assert_eq!(trend.value.to_string(), "33.3");
    }

    #[test]
    fn janelas_de_venda_respeitam_dia_e_mes() {
        let today = date(2025, 3, 15);
        let rows = vec![
            sale(2, 10, 4, Some(today)),             // hoje: 20 de venda, 12 de lucro
            sale(1, 10, 4, Some(date(2025, 3, 14))), // ontem
            sale(3, 10, 4, Some(date(2025, 3, 1))),  // mesmo mês
            sale(5, 10, 4, Some(date(2025, 2, 28))), // mês passado
            sale(1, 10, 4, None),                    // sem data: só nos totais
        ];

        let metrics = fold_sales_metrics(&rows, today);
        assert_eq!(metrics.total_sales, Decimal::from(120));
        assert_eq!(metrics.today_sales, Decimal::from(20));
        assert_eq!(metrics.today_profit, Decimal::from(12));
        assert_eq!(metrics.yesterday_sales, Decimal::from(10));
        assert_eq!(metrics.month_sales, Decimal::from(60));
        assert_eq!(metrics.last_month_sales, Decimal::from(50));
        assert_eq!(metrics.today_orders, 1);
        assert_eq!(metrics.month_orders, 3);
    }

    #[test]
    fn virada_de_ano_usa_dezembro_como_mes_anterior() {
        let today = date(2025, 1, 10);
        let rows = vec![sale(1, 100, 0, Some(date(2024, 12, 31)))];
        let metrics = fold_sales_metrics(&rows, today);
        assert_eq!(metrics.last_month_sales, Decimal::from(100));
        assert_eq!(metrics.month_sales, Decimal::ZERO);
    }

    fn stock_row(
        id: Uuid,
        name: &str,
        category: Option<&str>,
        product_quantity: i32,
        variant: Option<(i32, bool, &str)>,
    ) -> ProductStockRow {
        ProductStockRow {
            id,
            name: name.to_string(),
            category: category.map(str::to_string),
            unit_of_measurement: "un".to_string(),
            product_quantity,
            unit_price: Decimal::from(10),
            unit_label: variant.map(|(_, _, label)| label.to_string()),
            variant_quantity: variant.map(|(q, _, _)| q),
            variant_hidden: variant.map(|(_, hidden, _)| hidden),
        }
    }

    #[test]
    fn estoque_efetivo_e_a_menor_variacao_visivel() {
        let id = Uuid::new_v4();
        let rows = vec![
            stock_row(id, "Arroz", Some("Grãos"), 30, Some((25, false, "1kg"))),
            stock_row(id, "Arroz", Some("Grãos"), 30, Some((5, false, "5kg"))),
            stock_row(id, "Arroz", Some("Grãos"), 30, Some((1, true, "saco"))), // oculta: ignorada
        ];
        let products = group_product_stock(&rows);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].quantity, 5);
        assert_eq!(products[0].unit, "5kg");
    }

    #[test]
    fn produto_sem_variacoes_usa_o_proprio_saldo() {
        let rows = vec![stock_row(Uuid::new_v4(), "Sal", None, 7, None)];
        let products = group_product_stock(&rows);
        assert_eq!(products[0].quantity, 7);
        assert_eq!(products[0].unit, "un");
    }

    #[test]
    fn faixas_de_severidade_nos_limites() {
        assert_eq!(severity(0), Some(StockSeverity::OutOfStock));
        assert_eq!(severity(1), Some(StockSeverity::Critical));
        assert_eq!(severity(10), Some(StockSeverity::Critical));
        assert_eq!(severity(11), Some(StockSeverity::Low));
        assert_eq!(severity(20), Some(StockSeverity::Low));
        assert_eq!(severity(21), None);
    }

    #[test]
    fn metricas_de_estoque_contam_faixas_e_saude() {
        let rows = vec![
            stock_row(Uuid::new_v4(), "A", Some("X"), 0, None),
            stock_row(Uuid::new_v4(), "B", Some("X"), 5, None),
            stock_row(Uuid::new_v4(), "C", Some("Y"), 15, None),
            stock_row(Uuid::new_v4(), "D", Some("Y"), 50, None),
        ];
        let metrics = fold_inventory_metrics(&group_product_stock(&rows));
        assert_eq!(metrics.total_products, 4);
        assert_eq!(metrics.out_of_stock, 1);
        assert_eq!(metrics.critical_stock, 1);
        assert_eq!(metrics.low_stock, 1);
        assert_eq!(metrics.in_stock, 1);
        assert_eq!(metrics.alerts_count, 3);
        assert_eq!(metrics.total_categories, 2);
        assert_eq!(metrics.stock_health.to_string(), "25.0");
        assert_eq!(metrics.total_items, 70);
        assert_eq!(metrics.total_value, Decimal::from(700));
    }

    #[test]
    fn alertas_ordenados_do_mais_vazio_para_o_menos() {
        let rows = vec![
            stock_row(Uuid::new_v4(), "C", None, 15, None),
            stock_row(Uuid::new_v4(), "A", None, 0, None),
            stock_row(Uuid::new_v4(), "B", None, 5, None),
            stock_row(Uuid::new_v4(), "D", None, 50, None), // saudável: fora da lista
        ];
        let alerts = low_stock_alerts(&group_product_stock(&rows));
        let names: Vec<&str> = alerts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(alerts[0].severity, StockSeverity::OutOfStock);
    }

    #[test]
    fn distribuicao_agrupa_sem_categoria() {
        let rows = vec![
            stock_row(Uuid::new_v4(), "A", Some("Grãos"), 10, None),
            stock_row(Uuid::new_v4(), "B", None, 100, None),
            stock_row(Uuid::new_v4(), "C", Some("Grãos"), 20, None),
        ];
        let entries = category_distribution(&group_product_stock(&rows));
        assert_eq!(entries.len(), 2);
        // ordenado por valor: "Sem categoria" (1000) antes de "Grãos" (300)
        assert_eq!(entries[0].category, "Sem categoria");
        assert_eq!(entries[1].category, "Grãos");
        assert_eq!(entries[1].products, 2);
        assert_eq!(entries[1].stock, 30);
    }

    #[test]
    fn avarias_do_mes_usam_a_data_do_relato() {
        let today = date(2025, 3, 15);
        let rows = vec![
            DamagedRow {
                quantity: 2,
                unit_price: Decimal::from(10),
                date: Some(date(2025, 3, 10)),
                created_at: Utc::now(),
            },
            DamagedRow {
                quantity: 3,
                unit_price: Decimal::from(10),
                date: Some(date(2025, 2, 10)),
                created_at: Utc::now(),
            },
        ];
        let metrics = fold_damaged_metrics(&rows, today);
        assert_eq!(metrics.total_damaged, 5);
        assert_eq!(metrics.total_loss, Decimal::from(50));
        assert_eq!(metrics.month_damaged, 2);
        assert_eq!(metrics.month_loss, Decimal::from(20));
        assert_eq!(metrics.total_reports, 2);
    }

    #[test]
    fn grafico_preenche_dias_sem_venda_com_zero() {
        let today = date(2025, 3, 15);
        let rows = vec![DaySalesRow {
            sale_date: date(2025, 3, 13),
            sales: Decimal::from(70),
            orders: 3,
        }];
        let chart = fill_chart(&rows, today);
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[0].date, date(2025, 3, 9));
        assert_eq!(chart[6].date, today);
        assert_eq!(chart[4].sales, Decimal::from(70));
        assert_eq!(chart[4].orders, 3);
        assert_eq!(chart[6].sales, Decimal::ZERO);
    }
}
