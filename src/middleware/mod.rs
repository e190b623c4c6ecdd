//! Request-boundary concerns shared by every endpoint.
//!
//! - `cors`: response headers and preflight short-circuit (runs as an axum layer)
//! - `csrf`: shared-secret header guard consulted by the dispatcher
//! - `auth`: bearer-token verification called by controllers before mutations

pub mod auth;
pub mod cors;
pub mod csrf;
