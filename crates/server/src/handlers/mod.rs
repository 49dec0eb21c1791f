//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `consultkit-server`.

pub mod export;
pub mod general;
pub mod template;

pub use export::*;
pub use general::*;
pub use template::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
