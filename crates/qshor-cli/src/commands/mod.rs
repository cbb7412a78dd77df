//! CLI command implementations.

pub mod common;
pub mod factor;
pub mod order;
pub mod version;
