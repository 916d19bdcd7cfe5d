use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::OffsetDateTime;

use crate::{Error, error::Result};

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created: OffsetDateTime,
}

pub type BookmarkRepository = BookmarkRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct BookmarkRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookmarkRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn find(&self, user_id: i64, product_id: i64) -> Result<Option<Bookmark>> {
        let record = sqlx::query_as::<_, Bookmark>(
            "SELECT id, user_id, product_id, created FROM bookmark WHERE user_id = ? AND product_id = ?",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn create(&self, user_id: i64, product_id: i64) -> Result<Bookmark> {
        let result = sqlx::query(
            "INSERT INTO bookmark (user_id, product_id, created) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        let record = sqlx::query_as::<_, Bookmark>(
            "SELECT id, user_id, product_id, created FROM bookmark WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn delete(&self, user_id: i64, product_id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM bookmark WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Bookmark".to_string()))
        } else {
            Ok(())
        }
    }
}
