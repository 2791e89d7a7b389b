// src/services/aggregator.rs
//
// Agregador de variações: mantém os campos "rollup" do produto consistentes
// com as variações. Deve rodar depois de qualquer create/update/delete ou
// mudança de estoque em variação, dentro da mesma transação.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{common::error::AppError, db::ProductRepository, models::inventory::ProductVariant};

// O que será espelhado no produto. `sku: None` significa "não mexe no sku
// atual" (a variação padrão não tem um).
#[derive(Debug, Clone, PartialEq)]
pub struct Rollup {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_of_measurement: String,
    pub sku: Option<String>,
}

// Parte pura do agregador: sem variações não há rollup (o produto segue
// autoritativo); com variações, quantity é a soma e preço/unidade espelham a
// variação padrão, ou a primeira na ordem de criação quando nenhuma está
// marcada.
pub(crate) fn compute_rollup(variants: &[ProductVariant]) -> Option<Rollup> {
    if variants.is_empty() {
        return None;
    }

    let quantity: i32 = variants.iter().map(|v| v.quantity).sum();
    let default = variants
        .iter()
        .find(|v| v.is_default)
        .unwrap_or(&variants[0]);

    Some(Rollup {
        quantity,
        unit_price: default.unit_price,
        unit_of_measurement: default.unit_label.clone(),
        sku: default.sku.clone(),
    })
}

#[derive(Clone)]
pub struct VariantAggregator {
    products: ProductRepository,
}

impl VariantAggregator {
    pub fn new(products: ProductRepository) -> Self {
        Self { products }
    }

    // Recarrega as variações e persiste o rollup. Sempre bem-sucedido para um
    // produto válido: sem variações é um no-op.
    pub async fn refresh(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<(), AppError> {
        let variants = self.products.list_variants(conn, product_id).await?;
        if let Some(rollup) = compute_rollup(&variants) {
            self.products.apply_rollup(conn, product_id, &rollup).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn variant(label: &str, quantity: i32, price: i64, is_default: bool) -> ProductVariant {
        ProductVariant {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            sku: None,
            unit_label: label.to_string(),
            cost_price: Decimal::ZERO,
            unit_price: Decimal::new(price, 2),
            quantity,
            conversion_factor: Decimal::ONE,
            barcode: None,
            is_default,
            hidden: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sem_variacoes_nao_ha_rollup() {
        assert_eq!(compute_rollup(&[]), None);
    }

    #[test]
    fn soma_quantidades_e_espelha_a_padrao() {
        // "Arroz": 1kg qty=5 (padrão), 5kg qty=2
        let variants = vec![variant("1kg", 5, 550, true), variant("5kg", 2, 2500, false)];
        let rollup = compute_rollup(&variants).unwrap();
        assert_eq!(rollup.quantity, 7);
        assert_eq!(rollup.unit_of_measurement, "1kg");
        assert_eq!(rollup.unit_price, Decimal::new(550, 2));
    }

    #[test]
    fn padrao_esgotada_continua_espelhada() {
        // Depois de vender as 5 unidades de 1kg o produto recalcula para 2,
        // mas preço/unidade continuam vindo da padrão mesmo zerada.
        let variants = vec![variant("1kg", 0, 550, true), variant("5kg", 2, 2500, false)];
        let rollup = compute_rollup(&variants).unwrap();
        assert_eq!(rollup.quantity, 2);
        assert_eq!(rollup.unit_of_measurement, "1kg");
        assert_eq!(rollup.unit_price, Decimal::new(550, 2));
    }

    #[test]
    fn sem_padrao_usa_a_primeira_na_ordem_de_listagem() {
        let variants = vec![variant("500g", 3, 300, false), variant("1kg", 1, 550, false)];
        let rollup = compute_rollup(&variants).unwrap();
        assert_eq!(rollup.unit_of_measurement, "500g");
        assert_eq!(rollup.quantity, 4);
    }

    #[test]
    fn uma_unica_variacao_tambem_agrega() {
        let variants = vec![variant("un", 9, 100, true)];
        let rollup = compute_rollup(&variants).unwrap();
        assert_eq!(rollup.quantity, 9);
    }

    #[test]
    fn sku_da_padrao_so_entra_quando_existe() {
        let mut with_sku = variant("1kg", 5, 550, true);
        with_sku.sku = Some("ARZ-1KG".to_string());
        let rollup = compute_rollup(&[with_sku, variant("5kg", 2, 2500, false)]).unwrap();
        assert_eq!(rollup.sku.as_deref(), Some("ARZ-1KG"));

        let rollup = compute_rollup(&[variant("1kg", 5, 550, true)]).unwrap();
        assert_eq!(rollup.sku, None);
    }
}
