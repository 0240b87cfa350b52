//! Adapters from the REST clients to the core traits.

#[cfg(feature = "google")]
pub mod google;
