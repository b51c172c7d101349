//! Document store access for the seating backend.
//!
//! This module provides abstractions for store operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, seat allocation service)  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Directory operations     │
//! │  - Input normalization                                   │
//! │  - Bulk upload reports                                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Module contents
//! - `services`: Directory operations (use these in handlers)
//! - `repository`: Trait definitions for store operations
//! - `repositories::local`: In-memory implementation for tests and local development
//! - `factory`: Factory for creating repository instances
//! - `repo_config`: TOML configuration with environment overrides
//! - `seed`: Start-up seed documents

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod seed;
pub mod services;

pub use repo_config::RepositoryConfig;

// Repository trait and implementations
pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
pub use repository::{
    ConstraintKind, DutyRepository, ErrorContext, ExamRepository, FullRepository,
    RepositoryError, RepositoryResult, RoomRepository, SeatAllocationRepository,
    StudentRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton from configuration.
///
/// Reads `exam-seating.toml` from the default locations (or built-in
/// defaults) with environment overrides, and loads the seed file if one is
/// configured. Calling it again is a no-op.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let config = RepositoryConfig::load().context("Failed to load repository configuration")?;
    let repo = RepositoryFactory::from_repository_config(&config)
        .await
        .context("Failed to create repository")?;
    Ok(REPOSITORY.get_or_init(|| repo))
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
