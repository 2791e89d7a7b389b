// src/services/product_service.rs
//
// CRUD de produtos e de suas variações. Toda escrita roda em transação e
// termina num refresh do agregador, para que os campos rollup do produto
// nunca fiquem defasados em relação às variações.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        product_repo::{NewProduct, NewVariant},
        ProductRepository,
    },
    models::inventory::{Product, ProductVariant, ProductWithVariants},
    services::aggregator::VariantAggregator,
};

#[derive(Debug, Clone)]
pub struct VariantInput {
    pub id: Option<Uuid>,
    pub sku: Option<String>,
    pub unit_label: String,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub conversion_factor: Option<Decimal>,
    pub barcode: Option<String>,
    pub is_default: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub sku: Option<String>,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub unit_of_measurement: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub variants: Vec<VariantInput>,
}

// Normaliza as flags de padrão num lote de variações: a primeira marcada
// explicitamente vence, as demais são limpas; sem nenhuma marcada, a primeira
// da lista vira a padrão.
pub(crate) fn normalize_default(variants: &mut [VariantInput]) {
    if variants.is_empty() {
        return;
    }
    let chosen = variants.iter().position(|v| v.is_default).unwrap_or(0);
    for (i, v) in variants.iter_mut().enumerate() {
        v.is_default = i == chosen;
    }
}

#[derive(Clone)]
pub struct ProductService {
    pool: PgPool,
    products: ProductRepository,
    aggregator: VariantAggregator,
}

impl ProductService {
    pub fn new(pool: PgPool, products: ProductRepository, aggregator: VariantAggregator) -> Self {
        Self { pool, products, aggregator }
    }

    pub async fn list(&self) -> Result<Vec<ProductWithVariants>, AppError> {
        let products = self.products.list_all().await?;
        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let mut variants = self.products.list_variants_for_products(&ids).await?;

        let mut result = Vec::with_capacity(products.len());
        for product in products {
            let (mine, rest): (Vec<_>, Vec<_>) =
                variants.into_iter().partition(|v| v.product_id == product.id);
            variants = rest;
            result.push(ProductWithVariants { product, variants: mine });
        }
        Ok(result)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductWithVariants, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.load(&mut conn, id).await
    }

    pub async fn create(&self, mut input: ProductInput) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self
            .products
            .create_product(
                &mut tx,
                &NewProduct {
                    name: input.name.clone(),
                    sku: input.sku.clone(),
                    cost_price: input.cost_price,
                    unit_price: input.unit_price,
                    quantity: input.quantity,
                    unit_of_measurement: input.unit_of_measurement.clone(),
                    category: input.category.clone(),
                    image_url: input.image_url.clone(),
                },
            )
            .await?;

        if input.variants.is_empty() {
            // Sem variações no payload o produto ganha uma única variação
            // padrão espelhando os campos base.
            self.products
                .create_variant(
                    &mut tx,
                    product.id,
                    &NewVariant {
                        sku: input.sku.clone(),
                        unit_label: input.unit_of_measurement.clone(),
                        cost_price: input.cost_price,
                        unit_price: input.unit_price,
                        quantity: input.quantity,
                        conversion_factor: Decimal::ONE,
                        barcode: None,
                        is_default: true,
                        hidden: false,
                    },
                )
                .await?;
        } else {
            normalize_default(&mut input.variants);
            for v in &input.variants {
                self.products
                    .create_variant(
                        &mut tx,
                        product.id,
                        &NewVariant {
                            sku: v.sku.clone(),
                            unit_label: v.unit_label.clone(),
                            cost_price: v.cost_price,
                            unit_price: v.unit_price,
                            quantity: v.quantity,
                            conversion_factor: v.conversion_factor.unwrap_or(Decimal::ONE),
                            barcode: v.barcode.clone(),
                            is_default: v.is_default,
                            hidden: v.hidden,
                        },
                    )
                    .await?;
            }
        }

        self.aggregator.refresh(&mut tx, product.id).await?;
        let result = self.load(&mut tx, product.id).await?;
        tx.commit().await?;

        tracing::info!("Produto '{}' criado.", result.product.name);
        Ok(result)
    }

    pub async fn update(
        &self,
        id: Uuid,
        mut input: ProductInput,
    ) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;

        let current =
            self.products.find_by_id(&mut tx, id).await?.ok_or(AppError::ProductNotFound)?;
        self.products
            .update_product_base(
                &mut tx,
                &Product {
                    name: input.name.clone(),
                    sku: input.sku.clone(),
                    unit_price: input.unit_price,
                    unit_of_measurement: input.unit_of_measurement.clone(),
                    category: input.category.clone(),
                    image_url: input.image_url.clone(),
                    ..current
                },
            )
            .await?;

        let existing = self.products.list_variants_for_update(&mut tx, id).await?;

        if input.variants.is_empty() {
            // Payload só com campos base: produto de variação única espelha
            // os campos na sua variação para o rollup não divergir.
            if let [only] = existing.as_slice() {
                self.products
                    .update_variant(
                        &mut tx,
                        &ProductVariant {
                            sku: input.sku.clone(),
                            unit_label: input.unit_of_measurement.clone(),
                            cost_price: input.cost_price,
                            unit_price: input.unit_price,
                            ..only.clone()
                        },
                    )
                    .await?;
            }
        } else {
            normalize_default(&mut input.variants);
            let mut default_id: Option<Uuid> = None;
            for v in &input.variants {
                let saved = match v.id {
                    Some(variant_id) => {
                        let current = existing
                            .iter()
                            .find(|e| e.id == variant_id)
                            .ok_or(AppError::VariantNotFound)?;
                        self.products
                            .update_variant(
                                &mut tx,
                                &ProductVariant {
                                    sku: v.sku.clone(),
                                    unit_label: v.unit_label.clone(),
                                    cost_price: v.cost_price,
                                    unit_price: v.unit_price,
                                    quantity: v.quantity,
                                    conversion_factor: v
                                        .conversion_factor
                                        .unwrap_or(current.conversion_factor),
                                    barcode: v.barcode.clone(),
                                    is_default: v.is_default,
                                    hidden: v.hidden,
                                    ..current.clone()
                                },
                            )
                            .await?
                    }
                    None => {
                        self.products
                            .create_variant(
                                &mut tx,
                                id,
                                &NewVariant {
                                    sku: v.sku.clone(),
                                    unit_label: v.unit_label.clone(),
                                    cost_price: v.cost_price,
                                    unit_price: v.unit_price,
                                    quantity: v.quantity,
                                    conversion_factor: v
                                        .conversion_factor
                                        .unwrap_or(Decimal::ONE),
                                    barcode: v.barcode.clone(),
                                    is_default: v.is_default,
                                    hidden: v.hidden,
                                },
                            )
                            .await?
                    }
                };
                if v.is_default {
                    default_id = Some(saved.id);
                }
            }
            // Variações fora do lote podem ter ficado com is_default antigo.
            if let Some(default_id) = default_id {
                self.products.set_default_variant(&mut tx, id, default_id).await?;
            }
        }

        self.aggregator.refresh(&mut tx, id).await?;
        let result = self.load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(result)
    }

    pub async fn set_hidden(&self, id: Uuid, hidden: bool) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;
        let product = self.products.set_hidden(&mut tx, id, hidden).await?;
        tx.commit().await?;
        Ok(product)
    }

    // --- Variações como sub-recurso ---

    pub async fn create_variant(
        &self,
        product_id: Uuid,
        v: VariantInput,
    ) -> Result<(ProductVariant, ProductWithVariants), AppError> {
        let mut tx = self.pool.begin().await?;

        self.products
            .find_by_id(&mut tx, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        let count = self.products.count_variants(&mut tx, product_id).await?;
        let is_default = v.is_default || count == 0;
        if v.is_default && count > 0 {
            self.products.clear_default_variants(&mut tx, product_id).await?;
        }

        let variant = self
            .products
            .create_variant(
                &mut tx,
                product_id,
                &NewVariant {
                    sku: v.sku,
                    unit_label: v.unit_label,
                    cost_price: v.cost_price,
                    unit_price: v.unit_price,
                    quantity: v.quantity,
                    conversion_factor: v.conversion_factor.unwrap_or(Decimal::ONE),
                    barcode: v.barcode,
                    is_default,
                    hidden: v.hidden,
                },
            )
            .await?;

        self.aggregator.refresh(&mut tx, product_id).await?;
        let product = self.load(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok((variant, product))
    }

    pub async fn update_variant(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
        v: VariantInput,
    ) -> Result<(ProductVariant, ProductWithVariants), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.lock_owned_variant(&mut tx, product_id, variant_id).await?;
        if v.is_default && !current.is_default {
            self.products.clear_default_variants(&mut tx, product_id).await?;
        }

        let variant = self
            .products
            .update_variant(
                &mut tx,
                &ProductVariant {
                    sku: v.sku,
                    unit_label: v.unit_label,
                    cost_price: v.cost_price,
                    unit_price: v.unit_price,
                    quantity: v.quantity,
                    conversion_factor: v.conversion_factor.unwrap_or(current.conversion_factor),
                    barcode: v.barcode,
                    is_default: v.is_default,
                    hidden: v.hidden,
                    ..current
                },
            )
            .await?;

        self.ensure_default(&mut tx, product_id).await?;
        self.aggregator.refresh(&mut tx, product_id).await?;
        let product = self.load(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok((variant, product))
    }

    // A última variação não pode ser removida: produto com variações nunca
    // volta ao modo variantless por remoção.
    pub async fn delete_variant(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;

        self.lock_owned_variant(&mut tx, product_id, variant_id).await?;
        let count = self.products.count_variants(&mut tx, product_id).await?;
        if count <= 1 {
            return Err(AppError::LastVariant);
        }

        self.products.delete_variant(&mut tx, variant_id).await?;
        self.ensure_default(&mut tx, product_id).await?;
        self.aggregator.refresh(&mut tx, product_id).await?;
        let product = self.load(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn toggle_variant_hidden(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<(ProductVariant, ProductWithVariants), AppError> {
        let mut tx = self.pool.begin().await?;

        self.lock_owned_variant(&mut tx, product_id, variant_id).await?;
        let variant = self.products.toggle_variant_hidden(&mut tx, variant_id).await?;

        self.aggregator.refresh(&mut tx, product_id).await?;
        let product = self.load(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok((variant, product))
    }

    pub async fn set_default_variant(
        &self,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<ProductWithVariants, AppError> {
        let mut tx = self.pool.begin().await?;

        self.lock_owned_variant(&mut tx, product_id, variant_id).await?;
        self.products.set_default_variant(&mut tx, product_id, variant_id).await?;

        // O rollup espelha a variação padrão; trocar a padrão muda o espelho.
        self.aggregator.refresh(&mut tx, product_id).await?;
        let product = self.load(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok(product)
    }

    // ---

    async fn load(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<ProductWithVariants, AppError> {
        let product =
            self.products.find_by_id(conn, id).await?.ok_or(AppError::ProductNotFound)?;
        let variants = self.products.list_variants(conn, id).await?;
        Ok(ProductWithVariants { product, variants })
    }

    // Trava a variação e confere que ela pertence ao produto da rota.
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

    // Depois de remover ou desmarcar, garante que alguma variação seja a
    // padrão (a primeira por ordem de criação).
    async fn ensure_default(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<(), AppError> {
        let variants = self.products.list_variants(conn, product_id).await?;
        if !variants.iter().any(|v| v.is_default) {
            if let Some(first) = variants.first() {
                self.products.set_default_variant(conn, product_id, first.id).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(is_default: bool) -> VariantInput {
        VariantInput {
            id: None,
            sku: None,
            unit_label: "1kg".to_string(),
            cost_price: Decimal::ZERO,
            unit_price: Decimal::ONE,
            quantity: 0,
            conversion_factor: None,
            barcode: None,
            is_default,
            hidden: false,
        }
    }

    #[test]
    fn sem_padrao_explicito_a_primeira_assume() {
        let mut variants = vec![input(false), input(false), input(false)];
        normalize_default(&mut variants);
        let flags: Vec<bool> = variants.iter().map(|v| v.is_default).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn apenas_a_primeira_marcada_permanece_padrao() {
        let mut variants = vec![input(false), input(true), input(true)];
        normalize_default(&mut variants);
        let flags: Vec<bool> = variants.iter().map(|v| v.is_default).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn lote_vazio_nao_quebra() {
        let mut variants: Vec<VariantInput> = vec![];
        normalize_default(&mut variants);
        assert!(variants.is_empty());
    }
}
