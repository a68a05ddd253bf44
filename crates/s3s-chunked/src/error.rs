//! Error types

/// Boxed error carried by upstream sources and providers
pub type StdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while framing a payload
#[derive(Debug, thiserror::Error)]
pub enum ChunkedEncodingError {
    /// The upstream byte source failed
    #[error("ChunkedEncodingError: Upstream: {0}")]
    Upstream(StdError),
    /// A chunk extension provider or trailer provider failed
    #[error("ChunkedEncodingError: Provider: {0}")]
    Provider(StdError),
    /// The terminal chunk has already been produced
    #[error("ChunkedEncodingError: Finished")]
    Finished,
}

/// Invalid encoder configuration, detected before any I/O
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Chunk size must be positive
    #[error("ConfigError: InvalidChunkSize: {0}")]
    InvalidChunkSize(usize),
    /// Trailers are written after the terminal chunk, which is disabled
    #[error("ConfigError: TrailersRequireTerminalChunk")]
    TrailersRequireTerminalChunk,
}

/// Errors raised while preparing a request for aws-chunked signing
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// Neither `content-length` nor an explicit payload length is available
    #[error("SignerError: MissingContentLength")]
    MissingContentLength,
    /// `content-length` is not a valid integer
    #[error("SignerError: InvalidContentLength")]
    InvalidContentLength,
    /// A header named by `x-amz-trailer` is not present on the request
    #[error("SignerError: MissingTrailerHeader: {0}")]
    MissingTrailerHeader(String),
    /// Unknown `x-amz-content-sha256` streaming value
    #[error("SignerError: UnsupportedMode: {0}")]
    UnsupportedMode(String),
    /// The signing key does not match the streaming mode's algorithm
    #[error("SignerError: KeyMismatch: expected {expected}, found {found}")]
    KeyMismatch {
        expected: crate::sig_v4::SigningAlgorithm,
        found: crate::sig_v4::SigningAlgorithm,
    },
    /// The key material is not a valid signing key
    #[error("SignerError: InvalidSigningKey")]
    InvalidSigningKey,
    /// A header value could not be converted
    #[error("SignerError: InvalidHeaderValue")]
    InvalidHeaderValue,
    /// Invalid encoder configuration
    #[error("SignerError: Config: {0}")]
    Config(#[from] ConfigError),
}

impl From<http::header::InvalidHeaderValue> for SignerError {
    fn from(_: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeaderValue
    }
}

impl From<http::header::ToStrError> for SignerError {
    fn from(_: http::header::ToStrError) -> Self {
        Self::InvalidHeaderValue
    }
}
