use thiserror::Error;

/// Error taxonomy for API calls.
///
/// Every variant has already been surfaced to the user as a notice by the
/// time the caller sees it; the error is re-raised so the calling view can
/// also react (stop a spinner, keep a form open). None of these are fatal.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport status 401 or envelope code 401. The session has been
    /// cleared and the UI pointed at login by the time this is returned.
    #[error("Unauthorized - session expired")]
    Unauthorized,

    /// Envelope code other than 200/401, carrying the server's message.
    #[error("{message}")]
    Application { code: i64, message: String },

    /// Transport-level failure: unreachable host, timeout, malformed body.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 200 envelope that is structurally unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
