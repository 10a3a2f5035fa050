//! Batch jobs — taxonomy, food split, raw dishes, ingredient resolution, export.
//!
//! Each job takes the resolved `DataPaths`, reads its inputs, computes its
//! output in memory, and writes it once, atomically.

pub mod dishes;
pub mod export;
pub mod foods;
pub mod resolver;
pub mod taxonomy;
