//! Slotbook booking server
//!
//! Slot availability and reservations for multi-tenant appointment booking,
//! served as a REST JSON API.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Primary pool, pinged by the readiness probe
    pub pool: Pool<Postgres>,
}
