//! `SigV4a` signing keys (ECDSA P-256)

use super::methods::{hex, hmac_sha256};
use super::{ChunkSigningKey, SecretKey, SigningAlgorithm};

use crate::error::SignerError;

use std::fmt;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, VerifyingKey};
use zeroize::Zeroizing;

/// Order of the P-256 group minus two, big-endian
const ORDER_MINUS_TWO: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, //
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x4f, //
];

/// A `SigV4a` signing key.
///
/// Signatures are DER-encoded, hex-encoded and right-padded with `*` to
/// [`SigningAlgorithm::signature_len`] characters, so every chunk header has
/// the same length.
#[derive(Clone)]
pub struct EcdsaSigningKey(p256::ecdsa::SigningKey);

impl EcdsaSigningKey {
    /// Derives the key pair for an access key with the NIST SP 800-108
    /// counter-mode KDF over HMAC-SHA256 keyed by `AWS4A<secret>`.
    ///
    /// # Errors
    /// Returns [`SignerError::InvalidSigningKey`] if no candidate scalar is in range
    pub fn derive(access_key_id: &str, secret_key: &SecretKey) -> Result<Self, SignerError> {
        let key = Zeroizing::new(format!("AWS4A{}", secret_key.expose()));

        for counter in 1..=254u8 {
            let mut input = Vec::with_capacity(64 + access_key_id.len());
            input.extend_from_slice(&1u32.to_be_bytes());
            input.extend_from_slice(SigningAlgorithm::EcdsaP256Sha256.as_str().as_bytes());
            input.push(0);
            input.extend_from_slice(access_key_id.as_bytes());
            input.push(counter);
            input.extend_from_slice(&256u32.to_be_bytes());

            let candidate = Zeroizing::new(hmac_sha256(key.as_bytes(), &input));
            if *candidate > ORDER_MINUS_TWO {
                continue;
            }

            let mut scalar = Zeroizing::new(*candidate);
            increment_be(&mut scalar);
            return Self::from_bytes(&*scalar);
        }

        Err(SignerError::InvalidSigningKey)
    }

    /// Wraps a big-endian private scalar.
    ///
    /// # Errors
    /// Returns [`SignerError::InvalidSigningKey`] if `bytes` is not a valid P-256 scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        let key = p256::ecdsa::SigningKey::from_slice(bytes).map_err(|_| SignerError::InvalidSigningKey)?;
        Ok(Self(key))
    }

    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.0.verifying_key()
    }
}

fn increment_be(bytes: &mut [u8; 32]) {
    for b in bytes.iter_mut().rev() {
        let (x, overflow) = b.overflowing_add(1);
        *b = x;
        if !overflow {
            break;
        }
    }
}

impl ChunkSigningKey for EcdsaSigningKey {
    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::EcdsaP256Sha256
    }

    fn sign(&self, string_to_sign: &str) -> String {
        let signature: Signature = self.0.sign(string_to_sign.as_bytes());
        let der = hex(signature.to_der().as_bytes());
        let width = SigningAlgorithm::EcdsaP256Sha256.signature_len();
        format!("{der:*<width$}")
    }
}

impl fmt::Debug for EcdsaSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[SENSITIVE-SIGNING-KEY]")
    }
}
