//! Scheduler layer for the runner
//!
//! This layer polls the server for transfer requests and drives each one
//! through execution and reporting. The transition logic lives in a pure
//! state machine; the poller performs the I/O it asks for.

pub mod machine;
pub mod poller;

pub use poller::JobPoller;
