//! Signing providers for the chunk encoder

use super::{CredentialScope, RollingSigner, canonical_trailers};

use crate::encoding::{ChunkExtension, ChunkExtensionProvider, Trailer, TrailerProvider};
use crate::error::StdError;
use crate::header::{CHUNK_SIGNATURE, X_AMZ_TRAILER_SIGNATURE};

use std::sync::Arc;

/// Adds `;chunk-signature=<signature>` to every chunk, including the terminal one.
///
/// The string to sign follows the algorithm of the signer's key.
#[derive(Debug, Clone)]
pub struct SigV4ChunkExtension {
    signer: Arc<RollingSigner>,
    scope: Arc<CredentialScope>,
}

impl SigV4ChunkExtension {
    #[must_use]
    pub fn new(signer: Arc<RollingSigner>, scope: Arc<CredentialScope>) -> Self {
        Self { signer, scope }
    }
}

impl ChunkExtensionProvider for SigV4ChunkExtension {
    fn extension(&mut self, chunk: &[u8]) -> Result<ChunkExtension, StdError> {
        let algorithm = self.signer.algorithm();
        let signature = self
            .signer
            .sign(|prev| algorithm.chunk_string_to_sign(&self.scope, prev, chunk));
        Ok(ChunkExtension::new(CHUNK_SIGNATURE, signature))
    }
}

/// Emits `x-amz-trailer-signature:<signature>` signed over the preceding trailers
#[derive(Debug, Clone)]
pub struct SigV4TrailerSignature {
    signer: Arc<RollingSigner>,
    scope: Arc<CredentialScope>,
}

impl SigV4TrailerSignature {
    #[must_use]
    pub fn new(signer: Arc<RollingSigner>, scope: Arc<CredentialScope>) -> Self {
        Self { signer, scope }
    }
}

impl TrailerProvider for SigV4TrailerSignature {
    fn trailer(&mut self, preceding: &[Trailer]) -> Result<Trailer, StdError> {
        let canonical = canonical_trailers(preceding);
        let algorithm = self.signer.algorithm();
        let signature = self
            .signer
            .sign(|prev| algorithm.trailer_string_to_sign(&self.scope, prev, &canonical));
        Ok(Trailer::single(X_AMZ_TRAILER_SIGNATURE, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig_v4::{AmzDate, ChunkSigningKey, EcdsaSigningKey, SigningAlgorithm, SigningKey};

    use p256::ecdsa::Signature;
    use p256::ecdsa::signature::Verifier;

    fn epoch_signer() -> (Arc<RollingSigner>, Arc<CredentialScope>) {
        let scope = CredentialScope::new(AmzDate::parse("19700101T000000Z").unwrap(), "us-east-1", "s3");
        let signer = RollingSigner::new(Arc::new(SigningKey::from_bytes(b"key".to_vec())), "sig");
        (Arc::new(signer), Arc::new(scope))
    }

    #[test]
    fn chunk_extension_signs_in_order() {
        let (signer, scope) = epoch_signer();
        let mut ext = SigV4ChunkExtension::new(signer, scope);

        let first = ext.extension(b"{\"Ta").unwrap();
        assert_eq!(first.name.as_ref(), b"chunk-signature");
        assert_eq!(
            first.value.as_deref(),
            Some(&b"082f5b0e588893570e152b401a886161ee772ed066948f68c8f01aee11cca4f8"[..])
        );

        let second = ext.extension(b"bleN").unwrap();
        assert_eq!(
            second.value.as_deref(),
            Some(&b"777b02ec61ce7934578b1efe6fbe08c21ae4a8cdf66a709d3b4fd320dddd2839"[..])
        );
    }

    #[test]
    fn trailer_signature_covers_preceding_trailers() {
        let (signer, scope) = epoch_signer();
        let mut ext = SigV4ChunkExtension::new(Arc::clone(&signer), Arc::clone(&scope));
        for chunk in b"{\"TableName\": \"foo\"}".chunks(4) {
            ext.extension(chunk).unwrap();
        }
        ext.extension(b"").unwrap();
        assert_eq!(
            signer.previous_signature(),
            "825ad80195cae47f54984835543ff2179c2c5a53c324059cd632e50259384ee3"
        );

        let mut provider = SigV4TrailerSignature::new(signer, scope);
        let trailer = provider
            .trailer(&[Trailer::single("x-amz-checksum-crc32", "oL+a/g==")])
            .unwrap();
        assert_eq!(
            trailer,
            Trailer::single(
                "x-amz-trailer-signature",
                "23457d04f4a8e279780cb91e28d4fbd1c6a2dd678d419705461a80514cea206c"
            )
        );
    }

    #[test]
    fn ecdsa_signatures_verify_against_strings_to_sign() {
        let scope = Arc::new(CredentialScope::new(AmzDate::parse("19700101T000000Z").unwrap(), "us-east-1", "s3"));
        let key = Arc::new(EcdsaSigningKey::from_bytes(&[0x11; 32]).unwrap());
        let signer = Arc::new(RollingSigner::new(Arc::clone(&key) as Arc<dyn ChunkSigningKey>, "seed"));
        let algorithm = SigningAlgorithm::EcdsaP256Sha256;

        let verify = |wire: &[u8], string_to_sign: &str| {
            let wire = std::str::from_utf8(wire).unwrap();
            let der = hex_simd::decode_to_vec(wire.trim_end_matches('*')).unwrap();
            let signature = Signature::from_der(&der).unwrap();
            key.verifying_key().verify(string_to_sign.as_bytes(), &signature).unwrap();
        };

        let mut ext = SigV4ChunkExtension::new(Arc::clone(&signer), Arc::clone(&scope));
        let first = ext.extension(b"abcd").unwrap();
        let first = first.value.unwrap();
        assert_eq!(first.len(), 144);
        verify(&first, &algorithm.chunk_string_to_sign(&scope, "seed", b"abcd"));

        let prev = signer.previous_signature();
        let mut provider = SigV4TrailerSignature::new(Arc::clone(&signer), Arc::clone(&scope));
        let preceding = [Trailer::single("x-amz-checksum-crc32", "oL+a/g==")];
        let trailer = provider.trailer(&preceding).unwrap();
        assert_eq!(trailer.name, "x-amz-trailer-signature");
        assert_eq!(trailer.values[0].len(), 144);
        let canonical = canonical_trailers(&preceding);
        verify(trailer.values[0].as_bytes(), &algorithm.trailer_string_to_sign(&scope, &prev, &canonical));
    }
}
