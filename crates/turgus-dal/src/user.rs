use serde::{Deserialize, Serialize};
use sqlx::Pool;
use time::OffsetDateTime;

use crate::{Error, error::Result};

/// Account record as visible to the listing endpoints. Credentials and
/// account management belong to the auth service, not this crate.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub contacts: Option<String>,
    pub created: OffsetDateTime,
}

pub type UserRepository = UserRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let record = sqlx::query_as::<_, User>(
            "SELECT id, username, email, contacts, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?;
        record.ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        let record = sqlx::query_as::<_, User>(
            "SELECT id, username, email, contacts, created FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.executor)
        .await?;
        record.ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT id, username, email, contacts, created FROM users WHERE id IN ({placeholders})"
        );
        let mut query = sqlx::query_as::<_, User>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let records = query.fetch_all(&self.executor).await?;
        Ok(records)
    }
}
