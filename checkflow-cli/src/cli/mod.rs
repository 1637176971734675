//! CLI command handling

pub mod admin;
pub mod admin_handlers;
pub mod context;
pub mod handlers;
pub mod request;
pub mod request_handlers;
