//! # Prompt Template Modules
//!
//! `tasks` holds the default templates; `core` holds the builders that fill
//! them in.

pub mod core;
pub mod tasks;

pub use self::core::{render_template, PromptTemplates};
