//! HTTP service for image uploads into a content-addressed directory.

pub mod constants;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use setup::{initialize_app, initialize_state};
pub use state::AppState;
