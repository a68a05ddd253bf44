use super::{ChunkSigningKey, SigningAlgorithm};

use std::sync::{Arc, Mutex, PoisonError};

/// Chained signer: every signature feeds into the next string to sign.
///
/// The previous signature is held under a lock for the whole signing step, so
/// two signatures of one chain are never computed concurrently.
#[derive(Debug)]
pub struct RollingSigner {
    signing_key: Arc<dyn ChunkSigningKey>,
    previous: Mutex<Box<str>>,
}

impl RollingSigner {
    #[must_use]
    pub fn new(signing_key: Arc<dyn ChunkSigningKey>, seed_signature: impl Into<Box<str>>) -> Self {
        Self {
            signing_key,
            previous: Mutex::new(seed_signature.into()),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.signing_key.algorithm()
    }

    /// Builds the string to sign from the previous signature, signs it and
    /// stores the result as the new previous signature.
    ///
    /// Returns the new signature as written on the wire.
    #[must_use]
    pub fn sign(&self, string_to_sign: impl FnOnce(&str) -> String) -> String {
        let mut previous = self.previous.lock().unwrap_or_else(PoisonError::into_inner);
        let signature = self.signing_key.sign(&string_to_sign(&**previous));
        *previous = signature.as_str().into();
        signature
    }

    #[must_use]
    pub fn previous_signature(&self) -> String {
        self.previous.lock().unwrap_or_else(PoisonError::into_inner).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig_v4::{AmzDate, CredentialScope, EcdsaSigningKey, SigningKey, create_chunk_string_to_sign};

    #[test]
    fn chains_previous_signature() {
        let scope = CredentialScope::new(AmzDate::parse("19700101T000000Z").unwrap(), "us-east-1", "s3");
        let signer = RollingSigner::new(Arc::new(SigningKey::from_bytes(b"key".to_vec())), "sig");
        assert_eq!(signer.previous_signature(), "sig");

        let data = b"{\"TableName\": \"foo\"}";
        let expected = [
            "082f5b0e588893570e152b401a886161ee772ed066948f68c8f01aee11cca4f8",
            "777b02ec61ce7934578b1efe6fbe08c21ae4a8cdf66a709d3b4fd320dddd2839",
            "84abdae650f64dee4d703d41c7d87c8bc251c22b8c493c75ce24431b60b73937",
            "aff22ddad9d4388233fe9bc47e9c552a6e9ba9285af79555d2ce7fdaab726320",
            "30e55f4e1c1fd444c06e9be42d9594b8fd7ead436bc67a58b5350ffd58b6aaa5",
        ];
        for (chunk, expected) in data.chunks(4).zip(expected) {
            let seen_previous = signer.previous_signature();
            let signature = signer.sign(|prev| {
                assert_eq!(prev, seen_previous);
                create_chunk_string_to_sign(&scope, prev, chunk)
            });
            assert_eq!(signature, expected);
            assert_eq!(signer.previous_signature(), expected);
        }

        let terminal = signer.sign(|prev| create_chunk_string_to_sign(&scope, prev, b""));
        assert_eq!(terminal, "825ad80195cae47f54984835543ff2179c2c5a53c324059cd632e50259384ee3");
    }

    #[test]
    fn ecdsa_chain_stores_padded_signature() {
        let scope = CredentialScope::new(AmzDate::parse("19700101T000000Z").unwrap(), "us-east-1", "s3");
        let key = Arc::new(EcdsaSigningKey::from_bytes(&[0x11; 32]).unwrap());
        let signer = RollingSigner::new(Arc::clone(&key) as Arc<dyn ChunkSigningKey>, "seed");
        assert_eq!(signer.algorithm(), SigningAlgorithm::EcdsaP256Sha256);

        let algorithm = signer.algorithm();
        let first = signer.sign(|prev| algorithm.chunk_string_to_sign(&scope, prev, b"abcd"));
        assert_eq!(first.len(), 144);
        assert_eq!(signer.previous_signature(), first);

        let mut string_to_sign = String::new();
        let _ = signer.sign(|prev| {
            string_to_sign = algorithm.chunk_string_to_sign(&scope, prev, b"");
            string_to_sign.clone()
        });
        assert!(string_to_sign.contains(&format!("\n{}\n", first.trim_end_matches('*'))));
    }
}
