//! Shared types, errors, and configuration for Balanco.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token service
//! - SMS and email delivery clients

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod sms;
pub mod types;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use email::EmailService;
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use sms::SmsService;
