//! HTTP API module
//!
//! The request-routing boundary of the secrets engine: fixed schemas per
//! operation, API-key authentication, and the error-to-status mapping.
//!
//! # Usage
//! ```ignore
//! let service = Arc::new(SecretsService::new(config_store, cache));
//! let state = AppState::new(api_key, service.clone());
//! let router = create_api_router(state);
//! ```

mod error;
mod handlers;
mod middleware;
mod router;
mod service;
pub mod types;

pub use middleware::{AppState, cors_layer};
pub use router::create_api_router;
pub use service::{DatadogSecretsService, SecretsService};
