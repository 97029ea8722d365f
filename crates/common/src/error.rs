use thiserror::Error;

/// Error taxonomy for the hidden-service rendezvous protocol.
///
/// Within a descriptor fetch, `CircuitFailure` and `UpstreamHttp` are
/// recovered locally by advancing to the next responsible directory.
/// Targeted single-directory requests and the introduction handshake have
/// no alternate candidate, so the same kinds propagate to the caller.
#[derive(Debug, Error)]
pub enum HsError {
    #[error("malformed onion address: {0}")]
    MalformedAddress(String),

    #[error("no hidden-service directories in consensus")]
    NoDirectoriesAvailable,

    #[error("directory {0} not found in consensus")]
    DirectoryNotFound(String),

    #[error("circuit failure: {0}")]
    CircuitFailure(String),

    /// Non-200 reply from a directory. Carries the raw status line and body
    /// so a caller-facing layer can forward the original response.
    #[error("upstream HTTP error: {response}")]
    UpstreamHttp { response: String },

    #[error("introduction point {0} not found in consensus")]
    IntroductionPointUnknown(String),

    /// Protocol-level invariant violation. Fatal, never retried.
    #[error("protocol invariant violated: {0}")]
    ProtocolInvariant(String),
}

/// Result type for hidden-service operations
pub type Result<T> = std::result::Result<T, HsError>;

impl HsError {
    pub fn circuit(msg: impl Into<String>) -> Self {
        Self::CircuitFailure(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::ProtocolInvariant(msg.into())
    }
}
