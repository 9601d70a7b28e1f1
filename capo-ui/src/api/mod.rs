//! HTTP API handlers for capo-ui

pub mod health;
pub mod identity;
pub mod prompter;
pub mod reading;
pub mod settings;
pub mod songs;
pub mod sse;
pub mod transfer;

pub use health::health_routes;
pub use identity::{identity_middleware, identity_routes};
pub use prompter::prompter_routes;
pub use reading::reading_routes;
pub use settings::settings_routes;
pub use songs::song_routes;
pub use sse::event_routes;
pub use transfer::transfer_routes;
