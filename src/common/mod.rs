//! Common types, traits, and error definitions for planner_server
//!
//! This module provides the foundational building blocks shared by the
//! strategies, the planning engine and the server.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
