//! # auth-adapters
//!
//! Implementations of the `IdentityGate` port.
//! The JWT gate is compiled with the `auth-jwt` feature.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtIdentityGate;
