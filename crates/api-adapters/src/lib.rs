//! # api-adapters
//!
//! HTTP transport for Pressroom. Handlers translate requests into service
//! calls with an explicit `Identity` and map `DomainError` onto status codes.
//! The axum router is compiled with the `web-axum` feature (on by default).

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use extract::{CurrentIdentity, JsonBody, PathParam, QueryParams};
#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
