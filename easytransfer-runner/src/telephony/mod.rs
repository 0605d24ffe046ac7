//! Telephony capability boundary
//!
//! The agent does not talk to the carrier itself. It asks a host-provided
//! telephony backend to run a carrier session (USSD) and gets the outcome
//! back later through a callback, or asks it to dial an encoded string with
//! no feedback at all. Both are gated by an authorization the host may withhold.

pub mod mmcli;

pub use mmcli::ModemManagerTelephony;

use anyhow::Result;
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio::sync::oneshot;

/// Characters a dial URI carries as-is; everything else is `%XX`-encoded
const DIAL_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'!')
    .remove(b'.')
    .remove(b'~')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*');

/// Whether the host currently lets the agent use telephony
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

/// What a carrier session produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResponse {
    /// Network replied with this text
    Received(String),
    /// Session failed with a backend-specific code
    Failed(i32),
}

/// One-shot callback handed to a backend with each session request
///
/// Exactly one of `on_response` / `on_failure` may be called. Dropping the
/// callback without calling either is visible to the waiting side.
#[derive(Debug)]
pub struct SessionCallback {
    tx: oneshot::Sender<SessionResponse>,
}

impl SessionCallback {
    /// Creates a callback and the receiver its outcome arrives on
    pub fn channel() -> (Self, oneshot::Receiver<SessionResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn on_response(self, text: impl Into<String>) {
        // Receiver gone means the agent stopped waiting; nothing left to do
        let _ = self.tx.send(SessionResponse::Received(text.into()));
    }

    pub fn on_failure(self, code: i32) {
        let _ = self.tx.send(SessionResponse::Failed(code));
    }
}

/// Host telephony backend
#[async_trait]
pub trait Telephony: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Checks whether the host grants telephony use right now
    async fn authorization(&self) -> Authorization;

    /// Whether `send_session_request` is available on this backend
    ///
    /// Backends without it can only dial, and never learn the outcome.
    fn supports_session_requests(&self) -> bool;

    /// Starts a carrier session for `code` and returns immediately
    ///
    /// The outcome is delivered later through `callback`.
    fn send_session_request(&self, code: &str, callback: SessionCallback);

    /// Abandons the session started by the last `send_session_request`
    ///
    /// Once this returns, the backend no longer runs that session and its
    /// callback is never resolved.
    async fn cancel_session(&self) -> Result<()>;

    /// Dials a percent-encoded string, with no outcome feedback
    ///
    /// `encoded` is in dial-URI form (see `encode_dial_string`); backends
    /// that take a plain number decode it first. An `Err` means nothing was dialed.
    async fn dial(&self, encoded: &str) -> Result<()>;
}

/// Percent-encodes a session code for the dial primitive
///
/// Letters, digits and `_-!.~'()*` pass through; everything else (notably
/// `#`) is encoded as UTF-8 `%XX`.
pub fn encode_dial_string(code: &str) -> String {
    utf8_percent_encode(code, DIAL_SAFE).to_string()
}

/// Reverses `encode_dial_string`
pub fn decode_dial_string(encoded: &str) -> Result<String> {
    Ok(percent_decode_str(encoded).decode_utf8()?.into_owned())
}
