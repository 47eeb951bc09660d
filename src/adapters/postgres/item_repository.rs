//! PostgreSQL implementation of ItemRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{ContentRef, Item};
use crate::domain::foundation::{DomainError, ItemId};
use crate::ports::ItemRepository;

use super::{corrupt, db_error};

pub struct PostgresItemRepository {
    pool: PgPool,
}

impl PostgresItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    title: String,
    visibility: String,
    content_ref: String,
    cached_length: Option<i32>,
}

impl TryFrom<ItemRow> for Item {
    type Error = DomainError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let cached_length = row
            .cached_length
            .map(u32::try_from)
            .transpose()
            .map_err(corrupt("cached_length"))?;

        Ok(Item {
            id: ItemId::from_uuid(row.id),
            title: row.title,
            visibility: row.visibility.parse().map_err(corrupt("visibility"))?,
            content_ref: ContentRef::new(row.content_ref).map_err(corrupt("content_ref"))?,
            cached_length,
        })
    }
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, DomainError> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT id, title, visibility, content_ref, cached_length FROM items WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find item"))?;

        row.map(Item::try_from).transpose()
    }

    async fn record_length(&self, id: &ItemId, length: u32) -> Result<bool, DomainError> {
        let length = i32::try_from(length).map_err(|_| {
            DomainError::validation("cached_length", format!("length {} too large", length))
        })?;

        let result = sqlx::query(
            "UPDATE items SET cached_length = $2 WHERE id = $1 AND cached_length IS NULL",
        )
        .bind(id.as_uuid())
        .bind(length)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record item length"))?;

        Ok(result.rows_affected() == 1)
    }
}
