//! HTTP request handlers for all API endpoints.
//!
//! # Handler Modules
//!
//! - [`analyze`]: single and batch document upload and analysis
//! - [`health`]: liveness check
//! - [`history`]: processing history listing
//! - [`pages`]: HTML loading screen and dashboard
//! - [`progress`]: WebSocket progress channel
//! - [`static_assets`]: embedded CSS and JavaScript
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as `{"success": false, "error": ...}`
//! with a matching status code.

pub mod analyze;
pub mod health;
pub mod history;
pub mod pages;
pub mod progress;
pub mod static_assets;
