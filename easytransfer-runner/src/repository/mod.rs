//! Repository layer
//!
//! Repositories are stateless HTTP adapters that abstract communication with
//! the transfer server. They take the credentials of the current poll cycle
//! on every call, so credential edits apply from the next cycle on.
//!
//! All repositories are trait-based to enable testing and mocking.

mod requests;

pub use requests::{HttpRequestRepository, RequestRepository};
