//! Core domain types
//!
//! These types are shared between the agent (which executes jobs) and the
//! tools around it (which configure it and inspect the server).

pub mod credentials;
pub mod job;
