//! Gateway server implementation

pub mod auth;
mod dispatch;
mod router;
mod server;
pub mod streaming;

pub use auth::{AuthGate, auth_middleware};
pub use router::{AppState, create_router};
pub use server::Gateway;
