//! AWS Signature Version 4 for chunked payloads
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html>
//!
//! Chunks are signed either with `SigV4` ([`SigningKey`]) or with `SigV4a`
//! ([`EcdsaSigningKey`]). Both implement [`ChunkSigningKey`].

mod amz_date;
pub use self::amz_date::{AmzDate, ParseAmzDateError};

mod methods;
pub use self::methods::*;

mod v4a;
pub use self::v4a::EcdsaSigningKey;

mod rolling;
pub use self::rolling::RollingSigner;

mod providers;
pub use self::providers::{SigV4ChunkExtension, SigV4TrailerSignature};

/// `x-amz-content-sha256` value for signed chunks without trailers
pub const STREAMING_SIGNED_PAYLOAD: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";

/// `x-amz-content-sha256` value for unsigned chunks followed by trailers
pub const STREAMING_UNSIGNED_PAYLOAD_TRAILER: &str = "STREAMING-UNSIGNED-PAYLOAD-TRAILER";

/// `x-amz-content-sha256` value for signed chunks followed by signed trailers
pub const STREAMING_SIGNED_PAYLOAD_TRAILER: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD-TRAILER";

/// `x-amz-content-sha256` value for `SigV4a` signed chunks without trailers
pub const STREAMING_ECDSA_SIGNED_PAYLOAD: &str = "STREAMING-AWS4-ECDSA-P256-SHA256-PAYLOAD";

/// `x-amz-content-sha256` value for `SigV4a` signed chunks followed by signed trailers
pub const STREAMING_ECDSA_SIGNED_PAYLOAD_TRAILER: &str = "STREAMING-AWS4-ECDSA-P256-SHA256-PAYLOAD-TRAILER";

/// Hex-encoded SHA-256 of the empty string
pub const EMPTY_STRING_SHA256_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
