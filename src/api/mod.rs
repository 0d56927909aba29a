//! API layer - HTTP invocation surface
//!
//! This module contains all HTTP-related concerns:
//! - Request handlers for migrations, credentials and tokens
//! - Custom extractors
//! - Route definitions

pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
