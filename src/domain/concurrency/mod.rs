//! Bounded, order-preserving execution of independent async tasks

mod runner;

pub use runner::{BoundedRunner, TaskError, TaskOutcome, DEFAULT_CONCURRENCY};
