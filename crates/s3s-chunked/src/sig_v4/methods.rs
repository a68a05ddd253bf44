//! Signing key derivation and strings to sign

use super::{AmzDate, EMPTY_STRING_SHA256_HASH};

use crate::encoding::Trailer;
use crate::header::CHUNK_SIGNATURE;

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// An AWS secret access key
#[derive(Clone)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(Zeroizing::new(value))
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[SENSITIVE-SECRET-KEY]")
    }
}

/// The request timestamp plus the `<date>/<region>/<service>/aws4_request` scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    pub amz_date: AmzDate,
    pub region: Box<str>,
    pub service: Box<str>,
}

impl CredentialScope {
    #[must_use]
    pub fn new(amz_date: AmzDate, region: impl Into<Box<str>>, service: impl Into<Box<str>>) -> Self {
        Self {
            amz_date,
            region: region.into(),
            service: service.into(),
        }
    }

    /// `YYYYMMDD/<region>/<service>/aws4_request`
    #[must_use]
    pub fn scope(&self) -> String {
        format!("{}/{}/{}/aws4_request", self.amz_date.fmt_date(), self.region, self.service)
    }
}

/// Algorithms that sign aws-chunked chunks and trailers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// `SigV4`
    HmacSha256,
    /// `SigV4a`
    EcdsaP256Sha256,
}

impl SigningAlgorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha256 => "AWS4-HMAC-SHA256",
            Self::EcdsaP256Sha256 => "AWS4-ECDSA-P256-SHA256",
        }
    }

    /// Length of a signature as written on the wire.
    ///
    /// ECDSA signatures are DER hex padded with `*` to a fixed width.
    #[must_use]
    pub const fn signature_len(self) -> usize {
        match self {
            Self::HmacSha256 => 64,
            Self::EcdsaP256Sha256 => 144,
        }
    }

    /// Length of `;chunk-signature=<signature>`
    #[must_use]
    pub const fn chunk_extension_len(self) -> usize {
        1 + CHUNK_SIGNATURE.len() + 1 + self.signature_len()
    }

    /// `SigV4` scopes carry the region, `SigV4a` scopes do not.
    #[must_use]
    pub fn credential_scope(self, scope: &CredentialScope) -> String {
        match self {
            Self::HmacSha256 => scope.scope(),
            Self::EcdsaP256Sha256 => format!("{}/{}/aws4_request", scope.amz_date.fmt_date(), scope.service),
        }
    }

    /// Chunk string to sign: `<algorithm>-PAYLOAD`, date, scope, previous
    /// signature, empty hash and chunk hash, one per line.
    #[must_use]
    pub fn chunk_string_to_sign(self, scope: &CredentialScope, prev_signature: &str, chunk_data: &[u8]) -> String {
        let mut ans = self.string_to_sign_head("PAYLOAD", scope, prev_signature);
        ans.push_str(EMPTY_STRING_SHA256_HASH);
        ans.push('\n');
        ans.push_str(&hex_sha256(chunk_data));
        ans
    }

    /// Trailer string to sign: `<algorithm>-TRAILER`, date, scope, previous
    /// signature and the hash of the canonical trailers, one per line.
    #[must_use]
    pub fn trailer_string_to_sign(self, scope: &CredentialScope, prev_signature: &str, canonical_trailers: &[u8]) -> String {
        let mut ans = self.string_to_sign_head("TRAILER", scope, prev_signature);
        ans.push_str(&hex_sha256(canonical_trailers));
        ans
    }

    fn string_to_sign_head(self, kind: &str, scope: &CredentialScope, prev_signature: &str) -> String {
        let mut ans = String::with_capacity(256);

        ans.push_str(self.as_str());
        ans.push('-');
        ans.push_str(kind);
        ans.push('\n');
        ans.push_str(&scope.amz_date.fmt_iso8601());
        ans.push('\n');
        ans.push_str(&self.credential_scope(scope));
        ans.push('\n');
        // padding is not part of the signature
        ans.push_str(prev_signature.trim_end_matches('*'));
        ans.push('\n');

        ans
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key that signs chunk and trailer strings to sign
pub trait ChunkSigningKey: Send + Sync + fmt::Debug + 'static {
    fn algorithm(&self) -> SigningAlgorithm;

    /// Returns the signature of `string_to_sign` as written on the wire
    fn sign(&self, string_to_sign: &str) -> String;
}

/// A derived `SigV4` signing key
#[derive(Clone)]
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    /// Derives the key with the HMAC chain `AWS4<secret>` → date → region → service → `aws4_request`.
    #[must_use]
    pub fn derive(secret_key: &SecretKey, scope: &CredentialScope) -> Self {
        let secret = Zeroizing::new(format!("AWS4{}", secret_key.expose()));
        let k_date = hmac_sha256(secret.as_bytes(), scope.amz_date.fmt_date().as_bytes());
        let k_region = hmac_sha256(&k_date, scope.region.as_bytes());
        let k_service = hmac_sha256(&k_region, scope.service.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        Self(Zeroizing::new(k_signing.to_vec()))
    }

    /// Wraps key material that was derived elsewhere.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex HMAC-SHA256 of `string_to_sign`
    #[must_use]
    pub fn sign(&self, string_to_sign: &str) -> String {
        hex(hmac_sha256(&self.0, string_to_sign.as_bytes()))
    }
}

impl ChunkSigningKey for SigningKey {
    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::HmacSha256
    }

    fn sign(&self, string_to_sign: &str) -> String {
        SigningKey::sign(self, string_to_sign)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[SENSITIVE-SIGNING-KEY]")
    }
}

pub(super) fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut m = <Hmac<Sha256>>::new_from_slice(key).expect("HMAC can take key of any size");
    m.update(data);
    m.finalize().into_bytes().into()
}

pub(super) fn hex(data: impl AsRef<[u8]>) -> String {
    hex_simd::encode_to_string(data, hex_simd::AsciiCase::Lower)
}

/// Lowercase hex SHA-256
#[must_use]
pub fn hex_sha256(data: &[u8]) -> String {
    hex(Sha256::digest(data))
}

/// Signs `string_to_sign` with a key derived from `secret_key` and `scope`
#[must_use]
pub fn calculate_signature(string_to_sign: &str, secret_key: &SecretKey, scope: &CredentialScope) -> String {
    SigningKey::derive(secret_key, scope).sign(string_to_sign)
}

/// <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming.html>
#[must_use]
pub fn create_chunk_string_to_sign(scope: &CredentialScope, prev_signature: &str, chunk_data: &[u8]) -> String {
    SigningAlgorithm::HmacSha256.chunk_string_to_sign(scope, prev_signature, chunk_data)
}

/// <https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-streaming-trailers.html>
#[must_use]
pub fn create_trailer_string_to_sign(scope: &CredentialScope, prev_signature: &str, canonical_trailers: &[u8]) -> String {
    SigningAlgorithm::HmacSha256.trailer_string_to_sign(scope, prev_signature, canonical_trailers)
}

/// Renders trailers as `name:v1,v2\n` lines with lowercase names sorted by name
#[must_use]
pub fn canonical_trailers(trailers: &[Trailer]) -> Vec<u8> {
    let mut lines: Vec<(String, String)> = trailers
        .iter()
        .map(|t| (t.name.to_ascii_lowercase(), t.values.join(",")))
        .collect();
    lines.sort_by(|a, b| a.0.cmp(&b.0));

    let mut ans = Vec::new();
    for (name, value) in &lines {
        ans.extend_from_slice(name.as_bytes());
        ans.push(b':');
        ans.extend_from_slice(value.as_bytes());
        ans.push(b'\n');
    }
    ans
}
