//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Pages** (`/`, `/dashboard`): browser entry points
//! - **System** (`/api/health`): liveness
//! - **Analysis** (`/api/v1/analyze`, `/api/v1/batch-analyze`, `/api/v1/history`)
//! - **Progress** (`/ws/progress`): WebSocket progress channel
//!
//! OpenAPI documentation is served at `/api/docs` when the server is running.

pub mod handlers;
pub mod models;
