//! Integration and unit tests for the InfoDot API.
//!
//! ## Test Modules
//!
//! - **support**: Test app setup, fakes for mail and reCAPTCHA, request helpers
//! - **api_tests**: Dispatcher, CSRF, CORS and health endpoints
//! - **article_api_tests**: Article CRUD, ownership and cover uploads
//! - **user_api_tests**: Registration, email verification, login, reCAPTCHA
//! - **error_tests**: Error envelope and conversions
//! - **config_tests**: Configuration loading and validation
//! - **db_tests**: Schema and constraint behavior
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test
//! cargo test article_api_tests
//! ```

pub mod article_api_tests;
pub mod support;
