//! Cross-cutting services

pub mod logging;

pub use logging::*;
