//! Persistence layer.
//!
//! Storage is reached through the repository traits, so backends can be
//! swapped without touching services or handlers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers (axum)                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Services (crate::services) - business rules            │
//! │  - availability / assignment                            │
//! │  - work-log escalation                                  │
//! │  - visibility filtering                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - abstract interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────┐
//!     │  LocalRepository  PostgresRepository │
//!     │   (in-memory)       (Diesel)         │
//!     └──────────────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! ```ignore
//! use gearguard::db::{RepositoryConfig, RepositoryFactory};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepositoryConfig::from_default_location()?;
//!     let repo = RepositoryFactory::from_repository_config(&config).await?;
//!     let teams = repo.list_teams().await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

// ==================== Repository Pattern Exports ====================

pub use repo_config::{find_config_file, RepositoryConfig, CONFIG_FILE_NAME};

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    AccountRepository, DirectoryRepository, ErrorContext, FullRepository, MaintenanceRepository,
    RepositoryError, RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::Arc;

/// Build the repository for the configured backend.
pub async fn init_repository(config: &RepositoryConfig) -> Result<Arc<dyn FullRepository>> {
    RepositoryFactory::from_repository_config(config)
        .await
        .context("Failed to initialize repository")
}
