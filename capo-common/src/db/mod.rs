//! Database initialization and stores

pub mod init;
pub mod profiles;
pub mod settings;
pub mod songs;

pub use init::*;
