//! API middleware components

pub mod admin_auth;

pub use admin_auth::{AdminToken, RequireAdmin};
