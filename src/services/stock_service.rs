// src/services/stock_service.rs
//
// Livro de estoque: entradas (receive) e baixas (deduct) sobre uma variação ou
// sobre um produto sem variações. Toda mutação roda em transação própria, com
// lock de linha antes de validar saldo, e termina com refresh do agregador.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::inventory::{Product, ProductVariant, ProductWithVariants},
    services::aggregator::VariantAggregator,
};

// Política de resolução de alvo quando o produto TEM variações:
// id explícito → aquela variação (precisa pertencer à lista); sem id → a
// marcada como padrão; sem padrão → a primeira na ordem de criação.
// Lista vazia é responsabilidade do chamador (caminho "produto sem variações").
pub(crate) fn resolve_variant<'a>(
    variants: &'a [ProductVariant],
    variant_id: Option<Uuid>,
) -> Result<&'a ProductVariant, AppError> {
    let variant = match variant_id {
        Some(id) => variants.iter().find(|v| v.id == id),
        None => variants.iter().find(|v| v.is_default).or_else(|| variants.first()),
    };
    variant.ok_or(AppError::VariantNotFound)
}

// Valida o saldo lido sob lock de linha antes de qualquer UPDATE. A baixa
// exige o saldo inteiro disponível; baixa parcial não existe.
pub(crate) fn ensure_available(available: i32, requested: i32) -> Result<(), AppError> {
    if available < requested {
        return Err(AppError::InsufficientStock { available, requested });
    }
    Ok(())
}

#[derive(Clone)]
pub struct StockService {
    pool: PgPool,
    products: ProductRepository,
    aggregator: VariantAggregator,
}

impl StockService {
    pub fn new(pool: PgPool, products: ProductRepository, aggregator: VariantAggregator) -> Self {
        Self { pool, products, aggregator }
    }

    // --- ENTRADA DE ESTOQUE ---
    // Sempre bem-sucedida para um alvo válido (quantity > 0 validado antes).
    pub async fn receive(
        &self,
        product_id: Uuid,
        quantity: i32,
        variant_id: Option<Uuid>,
    ) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self
            .products
            .find_by_id(&mut tx, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let variants = self.products.list_variants_for_update(&mut tx, product.id).await?;

        if variants.is_empty() {
            self.products.adjust_product_quantity(&mut tx, product.id, quantity).await?;
        } else {
            let target = resolve_variant(&variants, variant_id)?;
            self.products.adjust_variant_quantity(&mut tx, target.id, quantity).await?;
            self.aggregator.refresh(&mut tx, product.id).await?;
        }

        let result = self.reload(&mut tx, product.id).await?;
        tx.commit().await?;
        Ok(result)
    }

    // --- BAIXA POR ID ---
    pub async fn deduct_by_id(
        &self,
        product_id: Uuid,
        quantity: i32,
        variant_id: Option<Uuid>,
    ) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;
        let product = self
            .products
            .find_by_id_for_update(&mut tx, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let result = self.deduct_locked(&mut tx, &product, quantity, variant_id).await?;
        tx.commit().await?;
        Ok(result)
    }

    // --- BAIXA POR NOME ---
    pub async fn deduct_by_name(
        &self,
        product_name: &str,
        quantity: i32,
        variant_id: Option<Uuid>,
    ) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;
        let product = self
            .products
            .find_by_name_for_update(&mut tx, product_name)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let result = self.deduct_locked(&mut tx, &product, quantity, variant_id).await?;
        tx.commit().await?;
        Ok(result)
    }

    // Baixa com a linha do produto já travada pelo chamador: trava também as
    // variações, valida saldo e só então aplica. Saldo insuficiente aborta a
    // transação inteira.
    async fn deduct_locked(
        &self,
        conn: &mut PgConnection,
        product: &Product,
        quantity: i32,
        variant_id: Option<Uuid>,
    ) -> Result<ProductWithVariants, AppError> {
        let variants = self.products.list_variants_for_update(conn, product.id).await?;

        if variants.is_empty() {
            ensure_available(product.quantity, quantity)?;
            self.products.adjust_product_quantity(conn, product.id, -quantity).await?;
        } else {
            let target = resolve_variant(&variants, variant_id)?;
            ensure_available(target.quantity, quantity)?;
            self.products.adjust_variant_quantity(conn, target.id, -quantity).await?;
            self.aggregator.refresh(conn, product.id).await?;
        }

        self.reload(conn, product.id).await
    }

    // --- ENTRADA/BAIXA DIRETAS EM UMA VARIAÇÃO (sub-recurso) ---

    pub async fn receive_variant(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<(ProductVariant, ProductWithVariants), AppError> {
        let mut tx = self.pool.begin().await?;

        let variant = self.lock_owned_variant(&mut tx, product_id, variant_id).await?;
        let updated = self.products.adjust_variant_quantity(&mut tx, variant.id, quantity).await?;
        self.aggregator.refresh(&mut tx, product_id).await?;

        let product = self.reload(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok((updated, product))
    }

    pub async fn deduct_variant(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<(ProductVariant, ProductWithVariants), AppError> {
        let mut tx = self.pool.begin().await?;

        let variant = self.lock_owned_variant(&mut tx, product_id, variant_id).await?;
        ensure_available(variant.quantity, quantity)?;
        let updated = self.products.adjust_variant_quantity(&mut tx, variant.id, -quantity).await?;
        self.aggregator.refresh(&mut tx, product_id).await?;

        let product = self.reload(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok((updated, product))
    }

    // Trava a variação e confere se pertence mesmo ao produto da rota.
    async fn lock_owned_variant(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<ProductVariant, AppError> {
        let variant = self
            .products
            .find_variant_for_update(conn, variant_id)
            .await?
            .ok_or(AppError::VariantNotFound)?;
        if variant.product_id != product_id {
            return Err(AppError::VariantNotFound);
        }
        Ok(variant)
    }

    async fn reload(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<ProductWithVariants, AppError> {
        let product = self
            .products
            .find_by_id(conn, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        let variants = self.products.list_variants(conn, product_id).await?;
        Ok(ProductWithVariants { product, variants })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn variant(id: Uuid, label: &str, is_default: bool) -> ProductVariant {
        ProductVariant {
            id,
            product_id: Uuid::new_v4(),
            sku: None,
            unit_label: label.to_string(),
            cost_price: Decimal::ZERO,
            unit_price: Decimal::ONE,
            quantity: 10,
            conversion_factor: Decimal::ONE,
            barcode: None,
            is_default,
            hidden: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn id_explicito_resolve_aquela_variacao() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let variants = vec![variant(a, "1kg", true), variant(b, "5kg", false)];
        assert_eq!(resolve_variant(&variants, Some(b)).unwrap().id, b);
    }

    #[test]
    fn id_desconhecido_e_erro() {
        let variants = vec![variant(Uuid::new_v4(), "1kg", true)];
        let err = resolve_variant(&variants, Some(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, AppError::VariantNotFound));
    }

    #[test]
    fn sem_id_cai_na_padrao() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let variants = vec![variant(a, "1kg", false), variant(b, "5kg", true)];
        assert_eq!(resolve_variant(&variants, None).unwrap().id, b);
    }

    #[test]
    fn saldo_exato_passa_na_validacao() {
        assert!(ensure_available(5, 5).is_ok());
        assert!(ensure_available(10, 3).is_ok());
    }

    #[test]
    fn saldo_insuficiente_reporta_disponivel_e_pedido() {
        let err = ensure_available(5, 7).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientStock { available: 5, requested: 7 }
        ));
    }

    #[test]
    fn saldo_zerado_nao_aceita_baixa() {
        assert!(ensure_available(0, 1).is_err());
    }

    #[test]
    fn sem_padrao_cai_na_primeira() {
        let a = Uuid::new_v4();
        let variants = vec![variant(a, "1kg", false), variant(Uuid::new_v4(), "5kg", false)];
        assert_eq!(resolve_variant(&variants, None).unwrap().id, a);
    }
}
