//! aws-chunked payload encoder
//!
//! `s3s-chunked` produces request bodies in the `aws-chunked` content
//! encoding used by S3 streaming uploads: the payload is split into
//! length-prefixed chunks, each chunk may carry a rolling `SigV4`
//! `chunk-signature`, and a zero-length terminal chunk is followed by trailers
//! such as a checksum and a trailer signature.
//!
//! # Features
//!
//! - **Framing**: [`encoding::ChunkEncoder`] with pluggable chunk extensions and trailers
//! - **Blocking and async front-ends**: [`encoding::ChunkedEncodedReader`] implements
//!   [`std::io::Read`], [`encoding::ChunkedEncodedPublisher`] implements `Stream`
//! - **Signing**: [`sig_v4::RollingSigner`] chains chunk and trailer signatures made
//!   with `SigV4` ([`sig_v4::SigningKey`]) or `SigV4a` ([`sig_v4::EcdsaSigningKey`])
//! - **Checksums**: CRC32, CRC32C, CRC64NVME, SHA-1, SHA-256 and MD5 trailers with a
//!   request-scoped [`checksum::ChecksumCache`]
//! - **Request preparation**: [`payload::AwsChunkedPayloadSigner`] rewrites request
//!   headers and computes the exact encoded `content-length`
//! - **Configuration**: static and hot-reload providers in [`config`]
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use s3s_chunked::config::ChunkedEncodingConfig;
//! use s3s_chunked::encoding::{ChunkedEncodedReader, Providers, Trailer};
//!
//! let config = ChunkedEncodingConfig::with_chunk_size(3).unwrap();
//! let providers = Providers::new().trailer(Trailer::single("foo", "1"));
//! let mut reader = ChunkedEncodedReader::new(&b"abcd"[..], &config, providers).unwrap();
//!
//! let mut body = String::new();
//! reader.read_to_string(&mut body).unwrap();
//! assert_eq!(body, "3\r\nabc\r\n1\r\nd\r\n0\r\nfoo:1\r\n\r\n");
//! ```
//!
//! # Modules
//!
//! - [`encoding`]: Chunk framing, extension and trailer providers, reader and publisher
//! - [`sig_v4`]: Signing key derivation, strings to sign, rolling signer
//! - [`checksum`]: Checksum algorithms and the checksum trailer cache
//! - [`payload`]: aws-chunked request preparation
//! - [`config`]: Encoder configuration
//! - [`header`]: Header names

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::bool_assert_comparison,  // I don't like `assert!(!expression)`. It's very misleading.
    clippy::multiple_crate_versions, // Sometimes not fixable
    clippy::module_name_repetitions,
    clippy::single_match_else,
    clippy::wildcard_imports,
    clippy::let_underscore_untyped,
    clippy::needless_continue,
)]

mod error;
pub use self::error::*;

pub mod checksum;
pub mod config;
pub mod encoding;
pub mod header;
pub mod payload;
pub mod sig_v4;
