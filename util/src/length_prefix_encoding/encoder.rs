use thiserror::Error;

use super::HEADER_SIZE;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Field of {len} bytes does not fit a {HEADER_SIZE} byte length header")]
/// The field is longer than the length header can express
pub struct FieldTooLongError {
    pub len: usize,
}

/// Appends length-prefixed fields to a growing buffer
#[derive(Debug, Default, Clone)]
pub struct FieldEncoder {
    buf: Vec<u8>,
}

impl FieldEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one field, header first
    pub fn push(&mut self, field: &[u8]) -> Result<&mut Self, FieldTooLongError> {
        let len = u16::try_from(field.len()).map_err(|_| FieldTooLongError { len: field.len() })?;
        self.buf.reserve(HEADER_SIZE + field.len());
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(field);
        Ok(self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
