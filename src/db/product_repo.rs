// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{Product, ProductVariant},
    services::aggregator::Rollup,
};

// Campos de uma variação nova. Agrupados em struct porque a lista de colunas é
// longa demais para uma assinatura posicional.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub sku: Option<String>,
    pub unit_label: String,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub conversion_factor: Decimal,
    pub barcode: Option<String>,
    pub is_default: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub unit_of_measurement: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura (pool principal)
    // ---

    pub async fn list_all(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    // Variações de vários produtos de uma vez, para montar a listagem sem N+1.
    pub async fn list_variants_for_products(
        &self,
        product_ids: &[Uuid],
    ) -> Result<Vec<ProductVariant>, AppError> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = ANY($1) ORDER BY created_at ASC, id ASC",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(variants)
    }

    // ---
    // Escrita / leitura transacional (recebem a conexão da transação)
    // ---

    pub async fn find_by_id(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(product)
    }

    pub async fn find_by_name(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(product)
    }

    // Variante com lock de linha, para baixas em produto sem variações: o
    // saldo lido precisa continuar válido até o UPDATE na mesma transação.
    pub async fn find_by_id_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(product)
    }

    pub async fn find_by_name_for_update(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<Product>, AppError> {
        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE name = $1 FOR UPDATE")
                .bind(name)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(product)
    }

    pub async fn create_product(
        &self,
        conn: &mut PgConnection,
        new: &NewProduct,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, sku, cost_price, unit_price, quantity, unit_of_measurement, category, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.sku)
        .bind(new.cost_price)
        .bind(new.unit_price)
        .bind(new.quantity)
        .bind(&new.unit_of_measurement)
        .bind(&new.category)
        .bind(&new.image_url)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::ProductNameAlreadyExists(new.name.clone());
                }
            }
            e.into()
        })
    }

    pub async fn update_product_base(
        &self,
        conn: &mut PgConnection,
        product: &Product,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, sku = $3, unit_price = $4, unit_of_measurement = $5,
                category = $6, image_url = $7, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.unit_price)
        .bind(&product.unit_of_measurement)
        .bind(&product.category)
        .bind(&product.image_url)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::ProductNameAlreadyExists(product.name.clone());
                }
            }
            e.into()
        })
    }

    pub async fn set_hidden(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        hidden: bool,
    ) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET hidden = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(hidden)
        .fetch_optional(&mut *conn)
        .await?;
        product.ok_or(AppError::ProductNotFound)
    }

    // Delta de estoque no próprio produto (caminho sem variações).
    pub async fn adjust_product_quantity(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        delta: i32,
    ) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET quantity = quantity + $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;
        Ok(product)
    }

    // Persiste o rollup calculado pelo agregador. O sku só é sobrescrito
    // quando a variação padrão tem um (COALESCE mantém o valor atual).
    pub async fn apply_rollup(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        rollup: &Rollup,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products
            SET quantity = $2, unit_price = $3, unit_of_measurement = $4,
                sku = COALESCE($5, sku), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .bind(rollup.quantity)
        .bind(rollup.unit_price)
        .bind(&rollup.unit_of_measurement)
        .bind(&rollup.sku)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    // ---
    // Variações
    // ---

    pub async fn list_variants(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<Vec<ProductVariant>, AppError> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(variants)
    }

    // Mesma listagem, mas com lock exclusivo de linha: usada antes de validar
    // e mutar estoque, para serializar com compras concorrentes.
    pub async fn list_variants_for_update(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<Vec<ProductVariant>, AppError> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE product_id = $1 ORDER BY created_at ASC, id ASC FOR UPDATE",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(variants)
    }

    // Lock exclusivo exatamente nas variações tocadas por uma compra.
    pub async fn lock_variants(
        &self,
        conn: &mut PgConnection,
        variant_ids: &[Uuid],
    ) -> Result<Vec<ProductVariant>, AppError> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(variant_ids)
        .fetch_all(&mut *conn)
        .await?;
        Ok(variants)
    }

    pub async fn find_variant_for_update(
        &self,
        conn: &mut PgConnection,
        variant_id: Uuid,
    ) -> Result<Option<ProductVariant>, AppError> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            "SELECT * FROM product_variants WHERE id = $1 FOR UPDATE",
        )
        .bind(variant_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(variant)
    }

    pub async fn create_variant(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        new: &NewVariant,
    ) -> Result<ProductVariant, AppError> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            INSERT INTO product_variants
                (product_id, sku, unit_label, cost_price, unit_price, quantity,
                 conversion_factor, barcode, is_default, hidden)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(&new.sku)
        .bind(&new.unit_label)
        .bind(new.cost_price)
        .bind(new.unit_price)
        .bind(new.quantity)
        .bind(new.conversion_factor)
        .bind(&new.barcode)
        .bind(new.is_default)
        .bind(new.hidden)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn update_variant(
        &self,
        conn: &mut PgConnection,
        variant: &ProductVariant,
    ) -> Result<ProductVariant, AppError> {
        sqlx::query_as::<_, ProductVariant>(
            r#"
            UPDATE product_variants
            SET sku = $2, unit_label = $3, cost_price = $4, unit_price = $5,
                quantity = $6, conversion_factor = $7, barcode = $8,
                is_default = $9, hidden = $10, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(variant.id)
        .bind(&variant.sku)
        .bind(&variant.unit_label)
        .bind(variant.cost_price)
        .bind(variant.unit_price)
        .bind(variant.quantity)
        .bind(variant.conversion_factor)
        .bind(&variant.barcode)
        .bind(variant.is_default)
        .bind(variant.hidden)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn delete_variant(
        &self,
        conn: &mut PgConnection,
        variant_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM product_variants WHERE id = $1")
            .bind(variant_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    // Delta de estoque em uma variação. As validações de saldo acontecem antes,
    // com a linha já travada; o CHECK do banco é só a última linha de defesa.
    pub async fn adjust_variant_quantity(
        &self,
        conn: &mut PgConnection,
        variant_id: Uuid,
        delta: i32,
    ) -> Result<ProductVariant, AppError> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            "UPDATE product_variants SET quantity = quantity + $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(variant_id)
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;
        Ok(variant)
    }

    pub async fn toggle_variant_hidden(
        &self,
        conn: &mut PgConnection,
        variant_id: Uuid,
    ) -> Result<ProductVariant, AppError> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            "UPDATE product_variants SET hidden = NOT hidden, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(variant_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(variant)
    }

    // Transição de estado explícita: exatamente uma variação padrão por
    // produto. Um UPDATE só, sem toggles avulsos de boolean.
    pub async fn set_default_variant(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE product_variants SET is_default = (id = $2), updated_at = now() WHERE product_id = $1",
        )
        .bind(product_id)
        .bind(variant_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn clear_default_variants(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE product_variants SET is_default = FALSE, updated_at = now() WHERE product_id = $1",
        )
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn count_variants(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM product_variants WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }
}
