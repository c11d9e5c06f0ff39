//! Utility modules shared across the pipeline.

pub mod errors;
pub mod file_handler;
pub mod paths;
pub mod string_utils;
