//! Search domain model.
//!
//! # Responsibility
//! - Define boolean-mode directives and the term sanitizer.
//! - Define owned result rows handed back to callers.

pub mod directive;
pub mod row;
