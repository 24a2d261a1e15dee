//! Core business logic for proplet.

pub mod services;

pub use services::*;
