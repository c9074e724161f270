//! # vellum-core
//!
//! Core types, traits, and abstractions for the vellum note backend.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other vellum crates depend on: domain models, the shared error
//! type, repository traits, and UUID helpers.

pub mod error;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;
