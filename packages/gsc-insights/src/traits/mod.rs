//! Core trait abstractions for the insights library.
//!
//! These are the seams to the transport collaborator; the `google` feature
//! provides reqwest-backed implementations and [`crate::testing`] provides
//! mocks.

pub mod page_experience;
pub mod search_console;
