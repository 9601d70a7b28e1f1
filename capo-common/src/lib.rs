//! # CapoCanto Common Library
//!
//! Shared code for the CapoCanto service including:
//! - Song records, categories and draft validation
//! - CSV import/export codec
//! - Tempo-linked auto-scroll controller
//! - Prompter rotation and display settings
//! - Database initialization and stores
//! - Configuration loading

pub mod autoscroll;
pub mod config;
pub mod csv;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod identity;
pub mod prompter;
pub mod settings;
pub mod song;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use song::{Song, SongCategory, SongDraft};
