//! Data models for checkflow

pub mod audit;
pub mod configuration;
pub mod identity;
pub mod ids;
pub mod statistics;
pub mod unit;
pub mod workflow;

pub use audit::*;
pub use configuration::*;
pub use identity::*;
pub use ids::*;
pub use statistics::*;
pub use unit::*;
pub use workflow::*;
