//! Client for the factotum(4) rpc protocol.
//!
//! Factotum is a key agent: it holds keys and runs the authentication
//! protocols that use them, so the programs relying on it never see the key
//! material. This crate speaks the request/reply protocol of factotum's `rpc`
//! file. The main entry point is [auth::Factotum]; [rpc::Rpc] gives access to
//! single calls and [proxy] relays a complete authentication conversation
//! between a peer and the agent.

use std::io;

pub mod attrs;
pub mod auth;
pub mod cli;
pub mod config;
pub mod info;
pub mod key;
pub mod msgs;
pub mod proxy;
pub mod rpc;
pub mod transport;

#[cfg(test)]
pub mod testutils;

pub use auth::{Factotum, UserPasswd};
pub use info::Info;
pub use key::{GetKeyError, HelperKeyResolver, KeyResolver};
pub use msgs::{Status, MAX_MSG_SIZE};
pub use rpc::{Limits, Rpc};
pub use transport::{Endpoint, MountTransport, Transport};

#[derive(thiserror::Error, Debug)]
pub enum FactotumError {
    #[error("request too big: {size} bytes exceed the limit of {} bytes", msgs::MAX_MSG_SIZE)]
    RequestTooLarge { size: usize },
    #[error("error talking to factotum")]
    Transport(#[from] io::Error),
    #[error(transparent)]
    BadResponse(#[from] msgs::InvalidReplyError),
    #[error("factotum: {0}")]
    Agent(String),
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("could not obtain key {attrs}")]
    GetKey {
        attrs: String,
        #[source]
        source: GetKeyError,
    },
    #[error("rpc {verb} failed: unexpected status {status}")]
    ProtocolViolation { verb: &'static str, status: Status },
    #[error("bad factotum rpc response: {0}")]
    MalformedResponse(String),
    #[error("malformed parameters, missing {0}")]
    MalformedParams(&'static str),
    #[error("bad authinfo")]
    BadAuthInfo(#[from] info::InfoDecodeError),
    #[error("rpc write failed: unexpected status {0}")]
    ProxyWriteFailed(Status),
    #[error("rpc write failed: unusable toosmall request {0:?}")]
    TooSmallOverflow(String),
    #[error("error talking to peer")]
    Peer(#[source] io::Error),
    #[error("giving up after {limit} {what}")]
    RetryLimitExceeded { what: &'static str, limit: usize },
}

pub type Result<T, E = FactotumError> = std::result::Result<T, E>;
