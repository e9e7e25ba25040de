//! Stores repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::StoreRepository;
use crate::{
    error::{AppError, AppResult},
    models::Store,
};

#[derive(Clone)]
pub struct StoresRepository {
    pool: Pool<Postgres>,
}

impl StoresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for StoresRepository {
    /// Get store by ID
    async fn get_store(&self, id: i32) -> AppResult<Store> {
        sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Store {} not found", id)))
    }
}
