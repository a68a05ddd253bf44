//! Header names used by aws-chunked requests

use http::HeaderName;

pub use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};

pub const X_AMZ_CONTENT_SHA256: HeaderName = HeaderName::from_static("x-amz-content-sha256");

pub const X_AMZ_DECODED_CONTENT_LENGTH: HeaderName = HeaderName::from_static("x-amz-decoded-content-length");

pub const X_AMZ_TRAILER: HeaderName = HeaderName::from_static("x-amz-trailer");

/// Trailer carrying the signature over the preceding trailers
pub const X_AMZ_TRAILER_SIGNATURE: &str = "x-amz-trailer-signature";

/// Chunk extension carrying the rolling chunk signature
pub const CHUNK_SIGNATURE: &str = "chunk-signature";

/// `content-encoding` token for aws-chunked bodies
pub const AWS_CHUNKED: &str = "aws-chunked";
