//! High level operations, each on its own rpc file.

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;
use zeroize::Zeroize;

use crate::attrs::tokenize;
use crate::config::FactotumConfig;
use crate::info::Info;
use crate::key::{Control, KeyResolver};
use crate::msgs::Status;
use crate::rpc::{Limits, Rpc};
use crate::transport::{MountTransport, Transport};
use crate::{FactotumError, Result};

/// User name and password of a `proto=pass` key
#[derive(Clone, PartialEq, Eq)]
pub struct UserPasswd {
    pub user: String,
    pub password: String,
}

impl Drop for UserPasswd {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}

impl fmt::Debug for UserPasswd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPasswd")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Handle on a factotum reachable through `T`.
///
/// Every operation opens its own rpc file and closes it when done.
#[derive(Debug, Clone)]
pub struct Factotum<T: Transport> {
    transport: T,
    limits: Limits,
}

impl Factotum<MountTransport> {
    /// Factotum mounted at `mtpt`
    pub fn mount<P: AsRef<Path>>(mtpt: P) -> Self {
        Self::new(MountTransport::new(mtpt.as_ref()))
    }

    pub fn from_config(config: &FactotumConfig) -> Self {
        Self::mount(&config.mount_point).with_limits(config.limits())
    }
}

impl<T: Transport> Factotum<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Opens a fresh rpc file
    pub fn rpc(&self) -> Result<Rpc<T::Endpoint>> {
        Rpc::open(&self.transport, self.limits)
    }

    /// Opens the control file
    pub fn control(&self) -> Result<Control<T::Endpoint>> {
        Control::open(&self.transport)
    }

    /// Returns user name and password of the key matching `params`.
    ///
    /// `params` is an attribute-value list such as
    /// `proto=pass service=imap server=mail.example.com`; `getkey` is called
    /// to obtain missing information (if any).
    pub fn get_user_password(
        &self,
        mut getkey: Option<&mut (dyn KeyResolver + '_)>,
        params: &str,
    ) -> Result<UserPasswd> {
        let mut rpc = self.rpc()?;

        match rpc.call_need_key(getkey.as_deref_mut(), "start", params.as_bytes())? {
            (Status::Ok, _) => {}
            (status, _) => {
                return Err(FactotumError::ProtocolViolation {
                    verb: "start",
                    status,
                })
            }
        }

        let payload = match rpc.call_need_key(getkey.as_deref_mut(), "read", b"")? {
            (Status::Ok, payload) => payload,
            (status, _) => {
                return Err(FactotumError::ProtocolViolation {
                    verb: "read",
                    status,
                })
            }
        };

        let payload = std::str::from_utf8(payload).map_err(|_| {
            FactotumError::MalformedResponse("user and password are not valid UTF-8".into())
        })?;
        let mut up = tokenize(payload);
        if up.len() != 2 {
            let n = up.len();
            up.iter_mut().for_each(|tok| tok.zeroize());
            return Err(FactotumError::MalformedResponse(format!(
                "expected user and password, got {n} tokens"
            )));
        }
        let password = up.pop().unwrap_or_default();
        let user = up.pop().unwrap_or_default();
        debug!("factotum: found password for {user}");
        Ok(UserPasswd { user, password })
    }

    /// Fetches `authinfo` on a fresh rpc file
    pub fn get_info(&self) -> Result<Info> {
        self.rpc()?.get_info()
    }

    /// Authenticates with `peer` using the protocol described by `params`.
    ///
    /// See [crate::proxy] for the conversation that takes place.
    pub fn proxy<P: Read + Write>(
        &self,
        peer: &mut P,
        getkey: Option<&mut (dyn KeyResolver + '_)>,
        params: &str,
    ) -> Result<Info> {
        self.rpc()?.proxy(peer, getkey, params)
    }
}
