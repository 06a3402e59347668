//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into page-level APIs.
//! - Keep callers decoupled from criteria and storage details.

pub mod blog_service;
pub mod settings_service;

pub use blog_service::{BlogResult, BlogService, BlogServiceError, TagPage};
pub use settings_service::{SettingsResult, SettingsService, SettingsServiceError};
