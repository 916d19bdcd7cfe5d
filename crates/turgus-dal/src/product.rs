use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::OffsetDateTime;

use crate::{Error, error::Result};

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateProduct {
    #[garde(range(min = 1))]
    pub category_id: i64,
    #[garde(range(min = 1))]
    pub subcategory_id: Option<i64>,
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(range(min = 0.0))]
    pub price: f64,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    #[garde(range(min = 0))]
    pub amount_in_stock: i64,
    #[garde(length(max = 1023))]
    pub image_url: Option<String>,
}

/// Partial update, absent fields keep their current value.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UpdateProduct {
    #[garde(range(min = 1))]
    pub category_id: Option<i64>,
    #[garde(range(min = 1))]
    pub subcategory_id: Option<i64>,
    #[garde(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[garde(range(min = 0.0))]
    pub price: Option<f64>,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    #[garde(range(min = 0))]
    pub amount_in_stock: Option<i64>,
    #[garde(length(max = 1023))]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub amount_in_stock: i64,
    pub image_url: Option<String>,
    pub created: OffsetDateTime,
}

const PRODUCT_FIELDS: &str =
    "id, user_id, category_id, subcategory_id, name, price, description, amount_in_stock, image_url, created";

pub type ProductRepository = ProductRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct ProductRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> ProductRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn get(&self, id: i64) -> Result<Product> {
        let sql = format!("SELECT {PRODUCT_FIELDS} FROM product WHERE id = ?");
        let record = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        record.ok_or_else(|| Error::RecordNotFound("Product".to_string()))
    }

    pub async fn list_all(&self) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_FIELDS} FROM product ORDER BY id");
        let records = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn list_by_seller(&self, user_id: i64) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_FIELDS} FROM product WHERE user_id = ? ORDER BY id");
        let records = sqlx::query_as::<_, Product>(&sql)
            .bind(user_id)
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql =
            format!("SELECT {PRODUCT_FIELDS} FROM product WHERE id IN ({placeholders}) ORDER BY id");
        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let records = query.fetch_all(&self.executor).await?;
        Ok(records)
    }

    /// Case insensitive substring match on the product name.
    pub async fn search(&self, needle: &str) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_FIELDS} FROM product WHERE name LIKE ? COLLATE NOCASE ORDER BY id"
        );
        let pattern = format!("%{needle}%");
        let records = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM product")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn create(&self, user_id: i64, payload: CreateProduct) -> Result<Product> {
        let result = sqlx::query(
            "INSERT INTO product (user_id, category_id, subcategory_id, name, price, description, amount_in_stock, image_url, created) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(payload.category_id)
        .bind(payload.subcategory_id)
        .bind(&payload.name)
        .bind(payload.price)
        .bind(&payload.description)
        .bind(payload.amount_in_stock)
        .bind(&payload.image_url)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn update(&self, id: i64, user_id: i64, payload: UpdateProduct) -> Result<Product> {
        let current = self.get(id).await?;
        if current.user_id != user_id {
            return Err(Error::NotOwner("Product".to_string()));
        }

        sqlx::query(
            "UPDATE product SET category_id = ?, subcategory_id = ?, name = ?, price = ?, \
             description = ?, amount_in_stock = ?, image_url = ? WHERE id = ?",
        )
        .bind(payload.category_id.unwrap_or(current.category_id))
        .bind(payload.subcategory_id.or(current.subcategory_id))
        .bind(payload.name.unwrap_or(current.name))
        .bind(payload.price.unwrap_or(current.price))
        .bind(payload.description.or(current.description))
        .bind(payload.amount_in_stock.unwrap_or(current.amount_in_stock))
        .bind(payload.image_url.or(current.image_url))
        .bind(id)
        .execute(&self.executor)
        .await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<()> {
        let current = self.get(id).await?;
        if current.user_id != user_id {
            return Err(Error::NotOwner("Product".to_string()));
        }

        sqlx::query("DELETE FROM product WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        Ok(())
    }
}
