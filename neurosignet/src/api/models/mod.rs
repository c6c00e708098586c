//! API request and response data models.
//!
//! These types define the public HTTP and WebSocket contract and are annotated with `utoipa`
//! for the generated OpenAPI document.
//!
//! - [`analysis`]: upload forms, single and batch analysis responses
//! - [`health`]: health check payload
//! - [`history`]: processing history pagination
//! - [`progress`]: WebSocket progress frames

pub mod analysis;
pub mod health;
pub mod history;
pub mod progress;
