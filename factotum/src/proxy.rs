//! Relaying an authentication conversation between a peer and factotum.
//!
//! Factotum drives the conversation. After `start`, the proxy repeatedly
//! issues `read`:
//!
//! - `ok` carries a message for the peer, which is forwarded verbatim,
//! - `phase` means factotum now expects data from the peer; the proxy issues
//!   `write` with what it has, and while factotum answers `toosmall n` it
//!   reads more from the peer until `n` bytes in total are available,
//! - `done` ends the conversation; the negotiated [Info] is then fetched
//!   with `authinfo`.

use std::io::{Read, Write};

use factotum_util::result::{bail_if, ensure_or};
use log::{debug, trace};

use crate::attrs;
use crate::info::Info;
use crate::key::KeyResolver;
use crate::msgs::{Status, MAX_MSG_SIZE};
use crate::rpc::{Limits, Rpc};
use crate::transport::Endpoint;
use crate::{FactotumError, Result};

/// State of a proxied conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Start,
    /// Waiting for factotum's next move
    Read,
    /// Feeding peer data to factotum
    Write,
    /// Conversation finished; fetching authinfo
    Finish,
}

/// Drives one conversation over an open rpc file
pub struct Proxy<'a, 'k, E: Endpoint, P: Read + Write> {
    rpc: &'a mut Rpc<E>,
    peer: &'a mut P,
    getkey: Option<&'a mut (dyn KeyResolver + 'k)>,
    state: ProxyState,
    rounds: usize,
}

impl<'a, 'k, E: Endpoint, P: Read + Write> Proxy<'a, 'k, E, P> {
    pub fn new(
        rpc: &'a mut Rpc<E>,
        peer: &'a mut P,
        getkey: Option<&'a mut (dyn KeyResolver + 'k)>,
    ) -> Self {
        Self {
            rpc,
            peer,
            getkey,
            state: ProxyState::Start,
            rounds: 0,
        }
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    /// Number of `read` rounds performed so far
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Runs the conversation to completion.
    ///
    /// `params` must name at least the protocol (`proto=`) and the role
    /// (`role=`).
    pub fn run(&mut self, params: &str) -> Result<Info> {
        loop {
            match self.state {
                ProxyState::Start => self.start(params)?,
                ProxyState::Read => self.read()?,
                ProxyState::Write => self.write()?,
                ProxyState::Finish => return self.rpc.get_info(),
            }
        }
    }

    fn start(&mut self, params: &str) -> Result<()> {
        for attr in ["proto", "role"] {
            if !attrs::has_attr(params, attr) {
                return Err(FactotumError::MalformedParams(attr));
            }
        }
        debug!("proxy start: {params}");
        match self.rpc.call("start", params.as_bytes())? {
            (Status::Ok, _) => {
                self.state = ProxyState::Read;
                Ok(())
            }
            (status, _) => Err(FactotumError::ProtocolViolation {
                verb: "start",
                status,
            }),
        }
    }

    fn read(&mut self) -> Result<()> {
        if let Limits {
            max_rounds: Some(limit),
            ..
        } = self.rpc.limits()
        {
            bail_if(
                self.rounds >= limit,
                FactotumError::RetryLimitExceeded {
                    what: "rounds",
                    limit,
                },
            )?;
        }
        self.rounds += 1;

        let (status, payload) = self
            .rpc
            .call_need_key(self.getkey.as_deref_mut(), "read", b"")?;
        trace!("proxy round {}: {status}", self.rounds);
        match status {
            Status::Done => self.state = ProxyState::Finish,
            Status::Ok => {
                self.peer.write_all(payload).map_err(FactotumError::Peer)?;
                self.peer.flush().map_err(FactotumError::Peer)?;
            }
            Status::Phase => self.state = ProxyState::Write,
            status => {
                return Err(FactotumError::ProtocolViolation {
                    verb: "read",
                    status,
                })
            }
        }
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            let (status, payload) =
                self.rpc
                    .call_need_key(self.getkey.as_deref_mut(), "write", &buf)?;
            match status {
                Status::Ok => break,
                Status::TooSmall => {
                    let want = parse_too_small(payload, buf.len())?;
                    let have = buf.len();
                    trace!("proxy: factotum wants {want} bytes, reading {}", want - have);
                    buf.resize(want, 0);
                    self.peer
                        .read_exact(&mut buf[have..])
                        .map_err(FactotumError::Peer)?;
                }
                status => return Err(FactotumError::ProxyWriteFailed(status)),
            }
        }
        self.state = ProxyState::Read;
        Ok(())
    }
}

/// Total length requested by a `toosmall` reply.
///
/// The request must grow what was already sent and stay within a message.
fn parse_too_small(payload: &[u8], have: usize) -> Result<usize> {
    let unusable = || FactotumError::TooSmallOverflow(String::from_utf8_lossy(payload).into_owned());
    let want: usize = std::str::from_utf8(payload)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(unusable)?;
    ensure_or(want > have && want <= MAX_MSG_SIZE, unusable())?;
    Ok(want)
}

impl<E: Endpoint> Rpc<E> {
    /// Relays the conversation described by `params` between `peer` and this
    /// rpc file and returns the resulting [Info]
    pub fn proxy<P: Read + Write>(
        &mut self,
        peer: &mut P,
        getkey: Option<&mut (dyn KeyResolver + '_)>,
        params: &str,
    ) -> Result<Info> {
        Proxy::new(self, peer, getkey).run(params)
    }
}
