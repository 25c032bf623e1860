//! # parkline-server
//!
//! The thin request layer over the parkline engines: an axum router, the
//! error→status bridge, gateway-verified identity extraction, environment
//! configuration, and the process lifecycle that owns the overstay
//! sweeper. All business rules live in `parkline-core`; handlers validate
//! argument shapes and relay engine outcomes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use identity::Identity;
pub use routes::build_router;
pub use state::AppState;
