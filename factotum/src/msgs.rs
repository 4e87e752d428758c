//! Wire format of the factotum rpc file.
//!
//! A request is `verb + ' ' + arg`; a reply is a status token, optionally
//! followed by a single space and a payload. Both directions are limited to
//! [MAX_MSG_SIZE] bytes.

use std::fmt;

/// Maximum size of a single request or reply (`AuthRpcMax`)
pub const MAX_MSG_SIZE: usize = 4096;

/// Reply status reported by the agent for every rpc call
#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum Status {
    /// The key in use is wrong; the payload describes it
    BadKey,
    /// The conversation finished; `authinfo` may be queried
    Done,
    /// The agent failed; the payload is a human readable message
    Error,
    /// A key is missing or incomplete; the payload describes it
    NeedKey,
    /// Success; the payload, if any, is the result
    Ok,
    /// The conversation expects a `write` next
    Phase,
    /// The last `write` was too short; the payload is the total length wanted
    TooSmall,
}

impl Status {
    /// All statuses in the order replies are matched against them
    pub const ALL: [Status; 7] = [
        Status::BadKey,
        Status::Done,
        Status::Error,
        Status::NeedKey,
        Status::Ok,
        Status::Phase,
        Status::TooSmall,
    ];

    /// The token used on the wire
    pub fn token(&self) -> &'static str {
        match self {
            Status::BadKey => "badkey",
            Status::Done => "done",
            Status::Error => "error",
            Status::NeedKey => "needkey",
            Status::Ok => "ok",
            Status::Phase => "phase",
            Status::TooSmall => "toosmall",
        }
    }

    /// Whether the agent is asking for key material
    pub fn wants_key(&self) -> bool {
        matches!(self, Status::NeedKey | Status::BadKey)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("bad rpc response: {}", String::from_utf8_lossy(.0))]
/// The reply does not start with a known status token
pub struct InvalidReplyError(pub Vec<u8>);

/// Splits a reply into its status and payload.
///
/// The payload borrows from `reply` and is empty when the reply consists of
/// the bare token.
pub fn classify(reply: &[u8]) -> Result<(Status, &[u8]), InvalidReplyError> {
    for status in Status::ALL {
        let token = status.token().as_bytes();
        let rest = match reply.strip_prefix(token) {
            Some(rest) => rest,
            None => continue,
        };
        match rest.split_first() {
            None => return Ok((status, rest)),
            Some((b' ', payload)) => return Ok((status, payload)),
            Some(_) => continue,
        }
    }
    Err(InvalidReplyError(reply.to_vec()))
}

/// Formats a request into `buf`, returning the number of bytes used.
///
/// Returns `None` without touching `buf` when the request does not fit.
pub fn encode_request(buf: &mut [u8], verb: &str, arg: &[u8]) -> Option<usize> {
    let len = request_len(verb, arg);
    if len > buf.len() {
        return None;
    }
    let (head, tail) = buf.split_at_mut(verb.len());
    head.copy_from_slice(verb.as_bytes());
    tail[0] = b' ';
    tail[1..1 + arg.len()].copy_from_slice(arg);
    Some(len)
}

/// Length of the request `verb + ' ' + arg` on the wire
pub fn request_len(verb: &str, arg: &[u8]) -> usize {
    verb.len() + 1 + arg.len()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bare_tokens_have_empty_payload() {
        for status in Status::ALL {
            let (got, payload) = classify(status.token().as_bytes()).unwrap();
            assert_eq!(got, status);
            assert!(payload.is_empty());
        }
    }

    #[test]
    fn payload_follows_single_space() {
        for status in Status::ALL {
            let reply = format!("{status} proto=pass dom=example.com");
            let (got, payload) = classify(reply.as_bytes()).unwrap();
            assert_eq!(got, status);
            assert_eq!(payload, b"proto=pass dom=example.com");
        }
        // Only the first space is a separator
        let (_, payload) = classify(b"ok  two").unwrap();
        assert_eq!(payload, b" two");
        let (_, payload) = classify(b"ok ").unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn unknown_replies_are_rejected() {
        let replies: [&[u8]; 6] = [b"", b"okay", b"oK", b"phased out", b"toosmall\n", b"what"];
        for reply in replies {
            assert_eq!(classify(reply), Err(InvalidReplyError(reply.to_vec())));
        }
        let err = classify(b"nope").unwrap_err();
        assert_eq!(err.to_string(), "bad rpc response: nope");
    }

    #[test]
    fn binary_payload_is_untouched() {
        let reply = b"ok \x00\xff\x01 ";
        let (status, payload) = classify(reply).unwrap();
        assert_eq!(status, Status::Ok);
        assert_eq!(payload, b"\x00\xff\x01 ");
    }

    #[test]
    fn request_layout() {
        let mut buf = [0u8; 16];
        assert_eq!(encode_request(&mut buf, "read", b""), Some(5));
        assert_eq!(&buf[..5], b"read ");
        assert_eq!(encode_request(&mut buf, "write", b"abc"), Some(9));
        assert_eq!(&buf[..9], b"write abc");
        assert_eq!(encode_request(&mut buf, "write", &[0u8; 11]), None);
        assert_eq!(encode_request(&mut buf, "write", &[1u8; 10]), Some(16));
    }

    #[test]
    fn display_uses_wire_token() {
        assert_eq!(Status::TooSmall.to_string(), "toosmall");
        assert_eq!(Status::NeedKey.to_string(), "needkey");
        assert!(Status::BadKey.wants_key());
        assert!(!Status::Phase.wants_key());
    }
}
