// src/services/damage_service.rs
//
// Fluxo de avarias: registro do relato, reembolso (transição de mão única) e
// a baixa de estoque correspondente. A baixa é deliberadamente separada do
// relato: registrar a avaria nunca mexe no estoque sozinho.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::{
        damaged_repo::NewDamagedProduct, DamagedProductRepository, NotificationRepository,
        ProductRepository,
    },
    models::damaged::{DamagedProduct, DamagedStats},
    services::{
        aggregator::VariantAggregator,
        stock_service::{ensure_available, resolve_variant},
    },
};

// Guarda da transição de reembolso: só um relato ainda não reembolsado pode
// avançar. O segundo pedido falha antes de qualquer escrita, preservando o
// `refunded_at` original.
pub(crate) fn refund_transition(damaged: &DamagedProduct) -> Result<(), AppError> {
    if damaged.refunded {
        return Err(AppError::AlreadyRefunded);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DamageReport {
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i32,
    pub reason: String,
    pub action_taken: Option<String>,
    pub variant_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub unit_of_measurement: String,
}

#[derive(Clone)]
pub struct DamageService {
    pool: PgPool,
    damaged: DamagedProductRepository,
    products: ProductRepository,
    notifications: NotificationRepository,
    aggregator: VariantAggregator,
    clock: Arc<dyn Clock>,
}

impl DamageService {
    pub fn new(
        pool: PgPool,
        damaged: DamagedProductRepository,
        products: ProductRepository,
        notifications: NotificationRepository,
        aggregator: VariantAggregator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { pool, damaged, products, notifications, aggregator, clock }
    }

    pub async fn list(&self) -> Result<Vec<DamagedProduct>, AppError> {
        self.damaged.list_all().await
    }

    pub async fn stats(&self) -> Result<DamagedStats, AppError> {
        let total_damaged = self.damaged.total_quantity().await?;
        let recent_damages = self.damaged.recent(5).await?;
        Ok(DamagedStats { total_damaged, recent_damages })
    }

    // Registra o relato e a notificação; não toca no estoque.
    pub async fn report(&self, report: DamageReport) -> Result<DamagedProduct, AppError> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let damaged = self
            .damaged
            .create(
                &mut tx,
                &NewDamagedProduct {
                    customer_name: report.customer_name,
                    product_name: report.product_name,
                    quantity: report.quantity,
                    reason: report.reason,
                    action_taken: report.action_taken,
                    variant_id: report.variant_id,
                    date: report.date.unwrap_or_else(|| now.date_naive()),
                    logged_at: now,
                    unit_of_measurement: report.unit_of_measurement,
                },
            )
            .await?;

        self.notifications
            .create(
                &mut tx,
                "damaged_product_reported",
                &format!(
                    "Avaria registrada: {} {} de {} ({}).",
                    damaged.quantity,
                    damaged.unit_of_measurement,
                    damaged.product_name,
                    damaged.customer_name
                ),
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(damaged)
    }

    // Marca o relato como reembolsado. Idempotência negada de propósito:
    // reembolsar duas vezes é erro do chamador, não um no-op.
    pub async fn refund(&self, id: Uuid) -> Result<DamagedProduct, AppError> {
        let mut tx = self.pool.begin().await?;

        let damaged = self
            .damaged
            .find_for_update(&mut tx, id)
            .await?
            .ok_or(AppError::DamagedProductNotFound)?;
        refund_transition(&damaged)?;

        let damaged = self.damaged.mark_refunded(&mut tx, id, self.clock.now()).await?;

        self.notifications
            .create(
                &mut tx,
                "product_refunded",
                &format!(
                    "Reembolsado {} {} de {} para {}.",
                    damaged.quantity,
                    damaged.unit_of_measurement,
                    damaged.product_name,
                    damaged.customer_name
                ),
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(damaged)
    }

    // Baixa de estoque vinda de uma avaria. Com `variant_id` a baixa é direta
    // na variação; sem ele o produto é localizado pelo nome e a variação
    // padrão (ou a primeira) absorve a baixa. Produto sem variações usa o
    // saldo do próprio produto. Saldo nunca fica negativo.
    pub async fn deduct_from_damage(
        &self,
        product_name: &str,
        quantity: i32,
        variant_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(variant_id) = variant_id {
            let variant = self
                .products
                .find_variant_for_update(&mut tx, variant_id)
                .await?
                .ok_or(AppError::VariantNotFound)?;
            ensure_available(variant.quantity, quantity)?;
            self.products.adjust_variant_quantity(&mut tx, variant.id, -quantity).await?;
            self.aggregator.refresh(&mut tx, variant.product_id).await?;
        } else {
            let product = self
                .products
                .find_by_name_for_update(&mut tx, product_name)
                .await?
                .ok_or(AppError::ProductNotFound)?;
            let variants = self.products.list_variants_for_update(&mut tx, product.id).await?;
            if variants.is_empty() {
                ensure_available(product.quantity, quantity)?;
                self.products.adjust_product_quantity(&mut tx, product.id, -quantity).await?;
            } else {
                let variant = resolve_variant(&variants, None)?;
                ensure_available(variant.quantity, quantity)?;
                self.products.adjust_variant_quantity(&mut tx, variant.id, -quantity).await?;
                self.aggregator.refresh(&mut tx, product.id).await?;
            }
        }

        self.notifications
            .create(
                &mut tx,
                "inventory_deducted",
                &format!("Baixa de {} unidades de {} por avaria.", quantity, product_name),
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn relato(refunded: bool) -> DamagedProduct {
        let logged = Utc.with_ymd_and_hms(2026, 8, 10, 9, 0, 0).unwrap();
        DamagedProduct {
            id: Uuid::new_v4(),
            customer_name: "Dona Maria".to_string(),
            product_name: "Ração Premium".to_string(),
            quantity: 2,
            reason: "Embalagem rasgada".to_string(),
            action_taken: None,
            variant_id: None,
            date: logged.date_naive(),
            logged_at: Some(logged),
            unit_of_measurement: "kg".to_string(),
            refunded,
            refunded_at: refunded.then_some(logged),
            created_at: logged,
            updated_at: logged,
        }
    }

    #[test]
    fn relato_pendente_pode_ser_reembolsado() {
        assert!(refund_transition(&relato(false)).is_ok());
    }

    #[test]
    fn segundo_reembolso_falha_e_preserva_o_registro() {
        let damaged = relato(true);
        let original = damaged.refunded_at;

        let err = refund_transition(&damaged).unwrap_err();
        assert!(matches!(err, AppError::AlreadyRefunded));
        // A guarda falha antes de mark_refunded, então o carimbo não muda.
        assert_eq!(damaged.refunded_at, original);
    }
}
