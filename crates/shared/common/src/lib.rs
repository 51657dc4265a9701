//! Common utilities shared by the workspace crates.
//!
//! This crate provides:
//! - The HTTP-facing error type and its domain error conversion
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult};
