//! # domains
//!
//! Domain models, the shared error type, and the port traits every adapter
//! implements. This crate performs no I/O.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::*;
pub use models::*;
pub use ports::*;
