//! aws-chunked framing
//!
//! ```text
//! chunk        = hex-length *( ";" ext-name [ "=" ext-value ] ) CRLF payload CRLF
//! terminal     = "0" *( ";" ext-name [ "=" ext-value ] ) CRLF
//! trailer-line = trailer-name ":" value *( "," value ) CRLF
//! stream       = 1*chunk terminal *trailer-line CRLF
//! ```
//!
//! [`ChunkEncoder`] holds the framing state shared by the blocking
//! [`ChunkedEncodedReader`] and the async [`ChunkedEncodedPublisher`].

mod frame;
pub use self::frame::{ChunkHeader, HexLength, write_chunk, write_chunk_header, write_trailer_block};

mod extension;
pub use self::extension::{ChunkExtension, ChunkExtensionProvider, FnExtension, extension_fn};

mod trailer;
pub use self::trailer::{FnTrailer, Trailer, TrailerProvider, trailer_fn};

mod encoder;
pub use self::encoder::{ChunkEncoder, Providers};

mod blocking;
pub use self::blocking::ChunkedEncodedReader;

mod publisher;
pub use self::publisher::{ChunkedEncodedPublisher, ChunkedReceiver};
