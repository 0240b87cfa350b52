//! Execution strategies for groups of remote calls.
//!
//! - [`sequential`] - strict order with a fixed inter-call delay; aborts on
//!   the first failure
//! - [`aggregate`] - bounded concurrent fan-out that never aborts

pub mod aggregate;
pub mod sequential;

pub use aggregate::Aggregator;
pub use sequential::{ensure_batch_size, run_sequential};
