//! # Exam Seating Backend
//!
//! Seat allocation engine and REST service for examination halls.
//!
//! Given an exam and a room type, the engine finds every student who must sit
//! the exam on its day, picks the rooms of that type not already taken by
//! another exam in the same slot, and seats the students first-fit, smallest
//! room first, with deterministic seat labels (`A1`..`A10`, `B1`, ...).
//!
//! ## Architecture
//!
//! - [`models`]: Domain records, input normalization and the lenient date parser
//! - [`api`]: Identifier types and serializable result types
//! - [`algorithms`]: Pure kernels (eligibility, room conflicts, seat planning)
//! - [`services`]: Allocation pipeline, room availability and invigilation
//! - [`db`]: Repository traits, in-memory store, configuration and seeding
//! - [`http`]: Axum-based REST API (feature `http-server`)

// RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod api;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
