//! Infrastructure layer - External service implementations

pub mod cache;
pub mod credentials;
pub mod logging;
pub mod observability;
pub mod storage;
pub mod usage;
