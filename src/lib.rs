//! nutriprep — offline preparation of food and recipe data.
//!
//! Spreadsheets in, JSON out: a food-type taxonomy, one food file per type,
//! raw recipes, and recipes whose ingredients are resolved to food ids.

pub mod cli;
pub mod core;
pub mod jobs;
pub mod sheet;
