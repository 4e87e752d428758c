//! The `authinfo` record produced by a finished authentication.

use std::fmt;
use std::str::{from_utf8, Utf8Error};

use zeroize::Zeroize;

use factotum_util::length_prefix_encoding::{
    decoder::{FieldDecodeError, FieldDecoder},
    encoder::{FieldEncoder, FieldTooLongError},
};

/// Result of a successful authentication (`AuthInfo`)
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Info {
    /// caller id
    pub caller_id: String,
    /// server id
    pub server_id: String,
    /// capability (only valid on server side)
    pub cap: String,
    /// secret shared with the peer
    pub secret: Vec<u8>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InfoDecodeError {
    #[error("authinfo field {field} is truncated")]
    Truncated {
        field: &'static str,
        #[source]
        source: FieldDecodeError,
    },
    #[error("authinfo field {field} is not valid UTF-8")]
    Utf8 {
        field: &'static str,
        #[source]
        source: Utf8Error,
    },
}

impl Info {
    /// Decodes the wire representation, ignoring any trailing bytes
    pub fn decode(buf: &[u8]) -> Result<Self, InfoDecodeError> {
        Self::decode_prefix(buf).map(|(info, _)| info)
    }

    /// Decodes the wire representation and returns the bytes after it
    pub fn decode_prefix(buf: &[u8]) -> Result<(Self, &[u8]), InfoDecodeError> {
        let mut dec = FieldDecoder::new(buf);
        let caller_id = text_field(&mut dec, "cuid")?;
        let server_id = text_field(&mut dec, "suid")?;
        let cap = text_field(&mut dec, "cap")?;
        let secret = field(&mut dec, "secret")?.to_vec();
        let info = Info {
            caller_id,
            server_id,
            cap,
            secret,
        };
        Ok((info, dec.remaining()))
    }

    /// Encodes the record in the layout [Info::decode] reads
    pub fn encode(&self) -> Result<Vec<u8>, FieldTooLongError> {
        let mut enc = FieldEncoder::new();
        enc.push(self.caller_id.as_bytes())?
            .push(self.server_id.as_bytes())?
            .push(self.cap.as_bytes())?
            .push(&self.secret)?;
        Ok(enc.into_inner())
    }
}

fn field<'a>(
    dec: &mut FieldDecoder<'a>,
    field: &'static str,
) -> Result<&'a [u8], InfoDecodeError> {
    dec.next_field()
        .map_err(|source| InfoDecodeError::Truncated { field, source })
}

fn text_field(dec: &mut FieldDecoder<'_>, name: &'static str) -> Result<String, InfoDecodeError> {
    let bytes = field(dec, name)?;
    from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|source| InfoDecodeError::Utf8 {
            field: name,
            source,
        })
}

impl Drop for Info {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Info")
            .field("caller_id", &self.caller_id)
            .field("server_id", &self.server_id)
            .field("cap", &self.cap)
            .field("secret", &format_args!("<{} bytes redacted>", self.secret.len()))
            .finish()
    }
}
