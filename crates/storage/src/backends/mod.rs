//! Storage backends.

pub mod filesystem;
pub mod memory;
