//! Products Repository

use sqlx::{Postgres, Transaction, query, query_as, query_scalar};
use storefront::{Product, ProductUuid};
use uuid::Uuid;

use crate::domain::products::{data::NewProduct, records::ProductRecord};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const CREATE_PRODUCT_IMAGES_SQL: &str = include_str!("sql/create_product_images.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let records = query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        Ok(records.into_iter().map(|record| record.0).collect())
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Product, sqlx::Error> {
        let record = query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(record.0)
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
    ) -> Result<ProductUuid, sqlx::Error> {
        let uuid: Uuid = query_scalar(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.category)
            .bind(&product.description)
            .bind(&product.image_url)
            .fetch_one(&mut **tx)
            .await?;

        if !product.images.is_empty() {
            let image_uuids: Vec<Uuid> = product.images.iter().map(|_| Uuid::now_v7()).collect();
            let image_urls: Vec<&str> = product
                .images
                .iter()
                .map(|image| image.image_url.as_str())
                .collect();
            let sort_orders: Vec<i32> = product.images.iter().map(|image| image.sort_order).collect();

            query(CREATE_PRODUCT_IMAGES_SQL)
                .bind(uuid)
                .bind(&image_uuids)
                .bind(&image_urls)
                .bind(&sort_orders)
                .execute(&mut **tx)
                .await?;
        }

        Ok(ProductUuid::from_uuid(uuid))
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
