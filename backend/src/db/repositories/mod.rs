//! Repository implementations module.
//!
//! - `local`: In-memory document store for tests and local development

#[cfg(feature = "local-repo")]
pub mod local;

#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
