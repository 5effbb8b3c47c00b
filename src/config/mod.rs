//! Configuration module for card projects
//!
//! Provides types, discovery and loading for `card.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
