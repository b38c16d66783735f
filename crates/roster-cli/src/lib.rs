//! CLI library components for roster imports.

pub mod logging;
pub mod pipeline;
