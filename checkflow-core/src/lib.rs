//! # Checkflow Core Library
//!
//! Maker-checker approval workflow: request lifecycle, hierarchical routing,
//! append-only audit trail, statistics, the user and unit directory, the
//! JSON store and the HTTP binding.

pub mod app;
pub mod audit;
pub mod error;
pub mod hierarchy;
pub mod identity;
pub mod models;
pub mod server;
pub mod services;
pub mod store;
pub mod workflow;

pub use app::Checkflow;
pub use error::WorkflowError;
