//! Data Transfer Objects for talking to the transfer server
//!
//! These mirror the JSON bodies the server sends and accepts. Incoming bodies
//! are lenient (every field optional) and are turned into domain types by
//! explicit classification, so a malformed body never panics the agent.

pub mod health;
pub mod request;
