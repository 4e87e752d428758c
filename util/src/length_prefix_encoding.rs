//! Length-prefixed fields as used by the factotum `authinfo` record.
//!
//! Every field is encoded as a little-endian [u16] length ([HEADER_SIZE] bytes)
//! followed by exactly that many bytes of payload. Fields are simply
//! concatenated; there is no outer framing.
//!
//! ```
//! use factotum_util::length_prefix_encoding::{decoder::FieldDecoder, encoder::FieldEncoder};
//!
//! let mut enc = FieldEncoder::new();
//! enc.push(b"glenda")?.push(b"")?;
//! let buf = enc.into_inner();
//! assert_eq!(buf, b"\x06\x00glenda\x00\x00");
//!
//! let mut dec = FieldDecoder::new(&buf);
//! assert_eq!(dec.next_field()?, b"glenda");
//! assert_eq!(dec.next_field()?, b"");
//! assert!(dec.next_field().is_err());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod decoder;
pub mod encoder;

/// Size in bytes of the length header preceding every field
pub const HEADER_SIZE: usize = std::mem::size_of::<u16>();
