//! Persistence boundary for Resilience Rituals.
//!
//! This crate provides:
//! - The [`Backend`] trait: the table-oriented store the domain stores talk to
//! - [`SqliteBackend`]: a SQLite implementation of that store
//! - The wire-row mapping between snake_case columns and domain types
//!
//! # Architecture
//!
//! ```text
//! ProfileStore / RitualCatalog (resilience-core)
//!            │
//!            ▼
//!      dyn Backend ──► SqliteBackend
//!                         ├── users
//!                         ├── rituals
//!                         ├── sessions
//!                         ├── badges (seeded from the static catalog)
//!                         ├── user_badges
//!                         └── notification_settings
//! ```
//!
//! Every read and write crosses `rows`, which owns the column names and the
//! conversion to and from domain types. Nothing above this crate sees a
//! column name.

mod backend;
mod rows;
mod sqlite;
mod sqlite_util;

pub use backend::{Backend, BackendError, UserStats};
pub use rows::tables;
pub use sqlite::SqliteBackend;
