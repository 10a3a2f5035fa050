//! Core plumbing — types, config parsing, errors, artifact storage.

pub mod error;
pub mod parser;
pub mod store;
pub mod types;
