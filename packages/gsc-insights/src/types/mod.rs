//! Data types for the insights library.

pub mod config;
pub mod dataset;
pub mod experience;
pub mod inspection;
pub mod outcome;
pub mod period;
pub mod query;
pub mod row;
