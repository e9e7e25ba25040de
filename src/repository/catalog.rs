//! Services and offers repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{OfferRepository, ServiceRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Offer, Service},
};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for CatalogRepository {
    /// Get service by ID
    async fn get_service(&self, id: i32) -> AppResult<Service> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))
    }
}

#[async_trait]
impl OfferRepository for CatalogRepository {
    /// Get offer by ID
    async fn get_offer(&self, id: i32) -> AppResult<Offer> {
        sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", id)))
    }
}
