//! # InfoDot Backend Library
//!
//! Core library of the InfoDotGame blog API: user accounts with email
//! verification, bearer session tokens, a CSRF guard and article CRUD with
//! cover image uploads.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: HTTP server; a single fallback handler hosts the dispatcher
//! - **SQLx**: Asynchronous database operations with SQLite
//! - **Tokio**: Async runtime
//! - **Serde**: Serialization/deserialization for JSON APIs
//!
//! Requests pass the CORS filter, then the dispatcher, which runs the CSRF check,
//! resolves the route against a regex table built once at startup and invokes a
//! freshly constructed controller with the coerced path parameters.
//!
//! ## Core Components
//!
//! - [`app`]: Router assembly (static uploads, dispatcher, layers)
//! - [`config`]: Layered configuration
//! - [`db`]: Database schema initialization
//! - [`envelope`]: Success side of the JSON response envelope
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`middleware`]: CORS, CSRF and bearer authentication
//! - [`repository`]: SQL access for users and articles
//! - [`router`]: Route table, parameter coercion and dispatch
//! - [`routes`]: Controllers
//! - [`sanitize`]: Tag stripping, escaping and slugs
//! - [`services`]: Mail delivery and reCAPTCHA verification
//! - [`state`]: Shared application state
//! - [`token`]: HS256 session tokens
//! - [`types`]: Data transfer objects and shared type definitions
//! - [`uploads`]: Cover image validation and storage

pub mod app;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod repository;
pub mod router;
pub mod routes;
pub mod sanitize;
pub mod services;
pub mod state;
pub mod token;
pub mod types;
pub mod uploads;

#[cfg(test)]
mod tests;
