pub mod api;
pub mod core;
pub mod session;

pub use self::core::CheckflowServer;
pub use api::{create_api_routes, AppState};
pub use session::SessionRegistry;
