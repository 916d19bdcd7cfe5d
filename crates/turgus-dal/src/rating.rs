use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::OffsetDateTime;

use crate::error::Result;

/// A 1-5 star score, optionally paired with a free text review.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub stars: i64,
    pub comment: Option<String>,
    pub created: OffsetDateTime,
}

impl Rating {
    /// A rating with a non-empty comment doubles as a review.
    pub fn is_review(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.is_empty())
    }
}

pub type RatingRepository = RatingRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct RatingRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> RatingRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn list_for_product(&self, product_id: i64) -> Result<Vec<Rating>> {
        let records = sqlx::query_as::<_, Rating>(
            "SELECT id, user_id, product_id, stars, comment, created FROM rating WHERE product_id = ?",
        )
        .bind(product_id)
        .fetch_all(&self.executor)
        .await?;
        Ok(records)
    }

    /// All ratings a given user has handed out, oldest first.
    pub async fn list_by_rater(&self, user_id: i64) -> Result<Vec<Rating>> {
        let records = sqlx::query_as::<_, Rating>(
            "SELECT id, user_id, product_id, stars, comment, created FROM rating WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.executor)
        .await?;
        Ok(records)
    }

    pub async fn list_for_products(&self, product_ids: &[i64]) -> Result<Vec<Rating>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; product_ids.len()].join(",");
        let sql = format!(
            "SELECT id, user_id, product_id, stars, comment, created FROM rating WHERE product_id IN ({placeholders})"
        );
        let mut query = sqlx::query_as::<_, Rating>(&sql);
        for id in product_ids {
            query = query.bind(id);
        }
        let records = query.fetch_all(&self.executor).await?;
        Ok(records)
    }
}
