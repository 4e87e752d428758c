use thiserror::Error;

use crate::result::ensure_or;

use super::HEADER_SIZE;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Boundary check failures while decoding a field
pub enum FieldDecodeError {
    /// Fewer than [HEADER_SIZE] bytes were left where a length header was expected
    #[error("Truncated length header ({avail} bytes left)")]
    TruncatedHeader { avail: usize },
    /// The length header announced more bytes than the buffer holds
    #[error("Field of {declared} bytes exceeds the {avail} bytes left in the buffer")]
    FieldTooLarge { declared: usize, avail: usize },
}

/// Decodes consecutive length-prefixed fields from a borrowed buffer.
///
/// The decoder never copies; fields are returned as subslices of the input.
/// On error the read position is left untouched.
#[derive(Debug, Clone)]
pub struct FieldDecoder<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> FieldDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    /// Number of bytes consumed so far, headers included
    pub fn bytes_read(&self) -> usize {
        self.off
    }

    /// The bytes that have not been decoded yet
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.off..]
    }

    /// Peeks at the length header of the next field
    pub fn next_field_len(&self) -> Result<usize, FieldDecodeError> {
        let rest = self.remaining();
        ensure_or(
            rest.len() >= HEADER_SIZE,
            FieldDecodeError::TruncatedHeader { avail: rest.len() },
        )?;
        Ok(u16::from_le_bytes([rest[0], rest[1]]) as usize)
    }

    /// Decodes the next field and advances past it
    pub fn next_field(&mut self) -> Result<&'a [u8], FieldDecodeError> {
        let declared = self.next_field_len()?;
        let body = &self.remaining()[HEADER_SIZE..];
        ensure_or(
            declared <= body.len(),
            FieldDecodeError::FieldTooLarge {
                declared,
                avail: body.len(),
            },
        )?;
        self.off += HEADER_SIZE + declared;
        Ok(&body[..declared])
    }
}
