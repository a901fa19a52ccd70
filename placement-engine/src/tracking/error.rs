use thiserror::Error;

/// Session-level failures, surfaced at the session-manager boundary.
///
/// Raw tracking-runtime failures are converted into this taxonomy before
/// anything downstream can observe them. Nothing here is fatal: every value
/// degrades to "no session / no surface".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("AR tracking is not supported on this device")]
    UnsupportedPlatform,
    #[error("session request was denied")]
    RequestDenied,
    #[error("session request failed: {0}")]
    RequestFailed(String),
    #[error("session was interrupted")]
    Interrupted,
}

/// Commit was attempted while no surface is under the reticle.
///
/// A benign condition reported to the user, never an abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no valid surface under the reticle")]
pub struct NoValidSurface;
