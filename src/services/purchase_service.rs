// src/services/purchase_service.rs
//
// A transação de compra: resolve/cria o cliente, trava as variações tocadas,
// valida TODOS os itens antes de aplicar qualquer baixa (lote tudo-ou-nada),
// persiste as linhas de venda, agrega uma vez por produto e registra a
// notificação, tudo num único commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{customer_repo::NewLineItem, CustomerRepository, NotificationRepository, ProductRepository},
    models::{crm::CustomerWithProducts, inventory::ProductVariant},
    services::aggregator::VariantAggregator,
};

// Quem está comprando: um cliente existente ou um cadastro feito na hora.
// Se a compra falhar, o cadastro novo também sofre rollback.
#[derive(Debug, Clone)]
pub enum PurchaseCustomer {
    Existing(Uuid),
    New { name: String, phone: Option<String> },
}

#[derive(Debug, Clone)]
pub struct PurchaseLine {
    pub product_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub category: String,
    pub unit: String,
    pub quantity: i32,
    pub purchase_date: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct PurchaseOutcome {
    pub reference: String,
    pub customer: CustomerWithProducts,
    pub items: usize,
}

// Plano de baixas já validado: total por variação e produtos distintos a
// reagregar (cada um uma vez só, na ordem em que apareceram).
#[derive(Debug, PartialEq)]
pub(crate) struct DeductionPlan {
    pub deductions: Vec<(Uuid, i32)>,
    pub product_ids: Vec<Uuid>,
}

// Validação sequencial dos itens contra o estoque travado. Itens repetidos na
// mesma variação enxergam o saldo já consumido pelos anteriores; o primeiro
// item que não couber falha a compra nomeando o produto.
pub(crate) fn plan_deductions(
    items: &[PurchaseLine],
    variants: &HashMap<Uuid, ProductVariant>,
) -> Result<DeductionPlan, AppError> {
    let mut remaining: HashMap<Uuid, i32> =
        variants.iter().map(|(id, v)| (*id, v.quantity)).collect();
    let mut totals: Vec<(Uuid, i32)> = Vec::new();
    let mut product_ids: Vec<Uuid> = Vec::new();

    for item in items {
        let variant = variants.get(&item.variant_id).ok_or(AppError::VariantNotFound)?;

        let available = remaining
            .get_mut(&item.variant_id)
            .ok_or(AppError::VariantNotFound)?;
        if *available < item.quantity {
            return Err(AppError::NotEnoughStockFor(item.product_name.clone()));
        }
        *available -= item.quantity;

        match totals.iter_mut().find(|(id, _)| *id == item.variant_id) {
            Some((_, total)) => *total += item.quantity,
            None => totals.push((item.variant_id, item.quantity)),
        }
        if !product_ids.contains(&variant.product_id) {
            product_ids.push(variant.product_id);
        }
    }

    Ok(DeductionPlan { deductions: totals, product_ids })
}

// Referência legível da compra, ex.: PUR-20260830143000-3f9a1c
pub(crate) fn format_reference(now: DateTime<Utc>, suffix: &str) -> String {
    format!("PUR-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

#[derive(Clone)]
pub struct PurchaseService {
    pool: PgPool,
    customers: CustomerRepository,
    products: ProductRepository,
    notifications: NotificationRepository,
    aggregator: VariantAggregator,
    clock: Arc<dyn Clock>,
}

impl PurchaseService {
    pub fn new(
        pool: PgPool,
        customers: CustomerRepository,
        products: ProductRepository,
        notifications: NotificationRepository,
        aggregator: VariantAggregator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { pool, customers, products, notifications, aggregator, clock }
    }

    pub async fn purchase(
        &self,
        customer: PurchaseCustomer,
        purchase_date: Option<DateTime<Utc>>,
        items: Vec<PurchaseLine>,
    ) -> Result<PurchaseOutcome, AppError> {
        let now = self.clock.now();
        let suffix = Uuid::new_v4().simple().to_string();
        let reference = format_reference(now, &suffix[suffix.len() - 6..]);

        let mut tx = self.pool.begin().await?;

        // 1. Resolve ou cria o cliente
        let customer = match customer {
            PurchaseCustomer::Existing(id) => self
                .customers
                .find(&mut tx, id)
                .await?
                .ok_or(AppError::CustomerNotFound)?,
            PurchaseCustomer::New { name, phone } => {
                self.customers
                    .create(&mut tx, &name, phone.as_deref(), purchase_date.unwrap_or(now))
                    .await?
            }
        };

        // 2. Lock exclusivo exatamente nas variações referenciadas
        let mut variant_ids: Vec<Uuid> = Vec::new();
        for item in &items {
            if !variant_ids.contains(&item.variant_id) {
                variant_ids.push(item.variant_id);
            }
        }
        let locked = self.products.lock_variants(&mut tx, &variant_ids).await?;
        let locked: HashMap<Uuid, ProductVariant> =
            locked.into_iter().map(|v| (v.id, v)).collect();

        // 3. Valida tudo antes de aplicar qualquer baixa
        let plan = plan_deductions(&items, &locked)?;

        // 4. Aplica as baixas (lote completo; qualquer erro desfaz tudo)
        for (variant_id, quantity) in &plan.deductions {
            self.products.adjust_variant_quantity(&mut tx, *variant_id, -quantity).await?;
        }

        // 5. Persiste as linhas de venda
        let line_items: Vec<NewLineItem> = items
            .iter()
            .map(|item| NewLineItem {
                product_name: item.product_name.clone(),
                category: Some(item.category.clone()),
                unit: Some(item.unit.clone()),
                quantity: item.quantity,
                purchase_date: Some(item.purchase_date.or(purchase_date).unwrap_or(now)),
            })
            .collect();
        self.customers.insert_line_items(&mut tx, customer.id, &line_items).await?;

        // 6. Reagrega uma vez por produto tocado
        for product_id in &plan.product_ids {
            self.aggregator.refresh(&mut tx, *product_id).await?;
        }

        // 7. Notificação resumindo a compra
        self.notifications
            .create(
                &mut tx,
                "customer_purchase",
                &format!(
                    "Compra {} processada para {} ({} itens).",
                    reference,
                    customer.name,
                    line_items.len()
                ),
                None,
            )
            .await?;

        // 8. Devolve o cliente com as linhas já persistidas
        let customer = self
            .customers
            .find_with_products(&mut tx, customer.id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        tx.commit().await?;

        tracing::info!("Compra {} registrada ({} itens).", reference, line_items.len());
        Ok(PurchaseOutcome { reference, customer, items: line_items.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn variant(id: Uuid, product_id: Uuid, quantity: i32) -> ProductVariant {
        ProductVariant {
            id,
            product_id,
            sku: None,
            unit_label: "1kg".to_string(),
            cost_price: Decimal::ZERO,
            unit_price: Decimal::ONE,
            quantity,
            conversion_factor: Decimal::ONE,
            barcode: None,
            is_default: true,
            hidden: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(variant_id: Uuid, product_id: Uuid, name: &str, quantity: i32) -> PurchaseLine {
        PurchaseLine {
            product_id,
            variant_id,
            product_name: name.to_string(),
            category: "Grãos".to_string(),
            unit: "1kg".to_string(),
            quantity,
            purchase_date: None,
        }
    }

    #[test]
    fn baixas_somam_o_pedido_por_variacao() {
        let pid = Uuid::new_v4();
        let v1 = Uuid::new_v4();
        let v2 = Uuid::new_v4();
        let variants: HashMap<_, _> =
            [(v1, variant(v1, pid, 5)), (v2, variant(v2, pid, 2))].into();

        let items =
            vec![line(v1, pid, "Arroz", 3), line(v2, pid, "Arroz", 2), line(v1, pid, "Arroz", 2)];
        let plan = plan_deductions(&items, &variants).unwrap();

        assert_eq!(plan.deductions, vec![(v1, 5), (v2, 2)]);
        assert_eq!(plan.product_ids, vec![pid]);

        // soma das baixas == soma dos itens pedidos
        let total: i32 = plan.deductions.iter().map(|(_, q)| q).sum();
        let requested: i32 = items.iter().map(|i| i.quantity).sum();
        assert_eq!(total, requested);
    }

    #[test]
    fn variacao_fora_do_lock_falha_com_404() {
        let variants = HashMap::new();
        let err = plan_deductions(&[line(Uuid::new_v4(), Uuid::new_v4(), "Arroz", 1)], &variants)
            .unwrap_err();
        assert!(matches!(err, AppError::VariantNotFound));
    }

    #[test]
    fn estoque_insuficiente_nomeia_o_primeiro_produto_que_falhou() {
        let pid = Uuid::new_v4();
        let v1 = Uuid::new_v4();
        let variants: HashMap<_, _> = [(v1, variant(v1, pid, 5))].into();

        // 6 > 5 disponíveis → falha nomeando "Arroz", nenhum plano produzido
        let err = plan_deductions(&[line(v1, pid, "Arroz", 6)], &variants).unwrap_err();
        match err {
            AppError::NotEnoughStockFor(name) => assert_eq!(name, "Arroz"),
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn itens_repetidos_enxergam_o_saldo_ja_consumido() {
        let pid = Uuid::new_v4();
        let v1 = Uuid::new_v4();
        let variants: HashMap<_, _> = [(v1, variant(v1, pid, 5))].into();

        // 3 + 3 = 6 > 5: o segundo item estoura mesmo que cada um caiba sozinho
        let err =
            plan_deductions(&[line(v1, pid, "Arroz", 3), line(v1, pid, "Arroz", 3)], &variants)
                .unwrap_err();
        assert!(matches!(err, AppError::NotEnoughStockFor(_)));
    }

    #[test]
    fn produtos_distintos_agregam_uma_vez_cada() {
        let pa = Uuid::new_v4();
        let pb = Uuid::new_v4();
        let v1 = Uuid::new_v4();
        let v2 = Uuid::new_v4();
        let v3 = Uuid::new_v4();
        let variants: HashMap<_, _> = [
            (v1, variant(v1, pa, 10)),
            (v2, variant(v2, pa, 10)),
            (v3, variant(v3, pb, 10)),
        ]
        .into();

        let items = vec![
            line(v1, pa, "Arroz", 1),
            line(v2, pa, "Arroz", 1),
            line(v3, pb, "Feijão", 1),
        ];
        let plan = plan_deductions(&items, &variants).unwrap();
        assert_eq!(plan.product_ids, vec![pa, pb]);
    }

    #[test]
    fn referencia_tem_prefixo_data_e_sufixo() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 14, 30, 0).unwrap();
        let reference = format_reference(now, "ab12cd");
        assert_eq!(reference, "PUR-20260830143000-ab12cd");
    }
}
