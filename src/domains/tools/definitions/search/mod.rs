//! Search tools module.

pub mod web;

pub use web::{SearchWebParams, SearchWebTool};
