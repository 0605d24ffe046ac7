//! Service layer
//!
//! Services contain the agent's business logic. The session service turns a
//! job into a carrier session and waits for the host to report its outcome.

mod session;

pub use session::{SessionError, SessionExecutor};
