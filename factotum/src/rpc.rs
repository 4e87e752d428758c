//! A single open factotum rpc file.

use std::ops::Range;

use factotum_util::result::bail_if;
use log::{debug, trace};
use zeroize::Zeroize;

use crate::info::Info;
use crate::key::KeyResolver;
use crate::msgs::{self, Status, MAX_MSG_SIZE};
use crate::transport::{Endpoint, Transport, RPC_FILE};
use crate::{FactotumError, Result};

/// Optional bounds on the retry loops.
///
/// Factotum itself never guarantees progress: a key resolver may report
/// success without installing a usable key and a conversation may run
/// forever. With the default (no limits) the loops are unbounded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// How often a single call is retried after `needkey`/`badkey`
    pub max_key_retries: Option<usize>,
    /// How many `read` rounds a proxied conversation may take
    pub max_rounds: Option<usize>,
}

/// An opened factotum rpc file.
///
/// Owns the endpoint and a buffer for one message. Requests are strictly
/// sequential; dropping the value closes the endpoint.
pub struct Rpc<E: Endpoint> {
    endpoint: E,
    buf: Box<[u8; MAX_MSG_SIZE]>,
    limits: Limits,
}

impl<E: Endpoint> Rpc<E> {
    pub fn new(endpoint: E) -> Self {
        Self::with_limits(endpoint, Limits::default())
    }

    pub fn with_limits(endpoint: E, limits: Limits) -> Self {
        Self {
            endpoint,
            buf: Box::new([0u8; MAX_MSG_SIZE]),
            limits,
        }
    }

    /// Opens the rpc file of `transport`
    pub fn open<T>(transport: &T, limits: Limits) -> Result<Self>
    where
        T: Transport<Endpoint = E>,
    {
        Ok(Self::with_limits(transport.open(RPC_FILE)?, limits))
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Sends one request and returns the status and payload of the reply.
    ///
    /// An `error` reply is turned into [FactotumError::Agent].
    pub fn call(&mut self, verb: &str, arg: &[u8]) -> Result<(Status, &[u8])> {
        let (status, payload) = self.transact(verb, arg)?;
        Ok((status, &self.buf[payload]))
    }

    /// Like [Rpc::call], but if the key involved is missing or incomplete
    /// `getkey` is asked to obtain it and the call is repeated.
    pub fn call_need_key(
        &mut self,
        mut getkey: Option<&mut (dyn KeyResolver + '_)>,
        verb: &str,
        arg: &[u8],
    ) -> Result<(Status, &[u8])> {
        let mut retries = 0usize;
        loop {
            let (status, payload) = self.transact(verb, arg)?;
            if !status.wants_key() {
                return Ok((status, &self.buf[payload]));
            }

            let attrs = String::from_utf8_lossy(&self.buf[payload]).into_owned();
            let getkey = match getkey.as_deref_mut() {
                Some(getkey) => getkey,
                None => return Err(FactotumError::KeyNotFound(attrs)),
            };
            if let Some(limit) = self.limits.max_key_retries {
                bail_if(
                    retries >= limit,
                    FactotumError::RetryLimitExceeded {
                        what: "key retries",
                        limit,
                    },
                )?;
            }
            retries += 1;

            debug!("factotum {verb}: {status} {attrs}; asking for key");
            getkey
                .get_key(&attrs)
                .map_err(|source| FactotumError::GetKey { attrs, source })?;
        }
    }

    /// Fetches the `authinfo` of a finished conversation
    pub fn get_info(&mut self) -> Result<Info> {
        match self.call("authinfo", b"")? {
            (Status::Ok, payload) => Ok(Info::decode(payload)?),
            (status, _) => Err(FactotumError::ProtocolViolation {
                verb: "authinfo",
                status,
            }),
        }
    }

    /// Performs the exchange, returning the payload as a range of `self.buf`
    fn transact(&mut self, verb: &str, arg: &[u8]) -> Result<(Status, Range<usize>)> {
        let len = msgs::encode_request(&mut self.buf[..], verb, arg).ok_or(
            FactotumError::RequestTooLarge {
                size: msgs::request_len(verb, arg),
            },
        )?;
        trace!("factotum rpc -> {verb} ({} bytes)", arg.len());
        self.endpoint.send_msg(&self.buf[..len])?;

        let n = self.endpoint.recv_msg(&mut self.buf[..])?;
        let reply = &self.buf[..n.min(MAX_MSG_SIZE)];
        let (status, payload) = msgs::classify(reply)?;
        trace!("factotum rpc <- {status} ({} bytes)", payload.len());

        let start = reply.len() - payload.len();
        match status {
            Status::Error => Err(FactotumError::Agent(
                String::from_utf8_lossy(payload).into_owned(),
            )),
            status => Ok((status, start..reply.len())),
        }
    }

    /// Clears the message buffer, which may hold passwords and secrets
    fn wipe(&mut self) {
        self.buf[..].zeroize();
    }
}

impl<E: Endpoint> Drop for Rpc<E> {
    fn drop(&mut self) {
        self.wipe();
    }
}
