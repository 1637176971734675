//! Request lifecycle, routing and query surfaces

pub mod engine;
pub mod locks;
pub mod routing;
pub mod statistics;
pub mod validation;

pub use engine::*;
pub use locks::RequestLocks;
pub use routing::Routing;
