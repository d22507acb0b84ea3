//! civic-feed/crates/domains/src/lib.rs
//!
//! The central domain models and port definitions for the civic-feed client.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
