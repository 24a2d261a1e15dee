//! Common utilities and shared types for proplet.
//!
//! This crate provides foundational components used across all proplet crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Verification codes**: Redis-backed one-time code store via [`CodeStore`]

pub mod code_store;
pub mod config;
pub mod error;
pub mod id;

pub use code_store::{CodeKind, CodeStore};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
