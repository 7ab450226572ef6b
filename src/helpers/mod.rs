//! Helper functions for content presentation
//!
//! Small pure utilities used by the loader and by callers rendering
//! compiled documents: slugs, display text, excerpts, dates.

pub mod date;
pub mod text;

pub use date::*;
pub use text::*;
