//! How the agent is reached.
//!
//! The rpc logic only needs to open a named endpoint and exchange whole
//! messages with it. [MountTransport] implements this for a factotum
//! file system mounted into the local namespace; other transports (e.g. a
//! 9P client) can be plugged in by implementing [Transport].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use factotum_util::io::{ReadMessageExt, WriteMessageExt};

/// Default mount point of factotum on Plan 9
pub const DEFAULT_MOUNT_POINT: &str = "/mnt/factotum";

/// Name of the request/reply endpoint
pub const RPC_FILE: &str = "rpc";

/// Name of the control endpoint
pub const CTL_FILE: &str = "ctl";

/// One open, message oriented endpoint.
///
/// Every [Endpoint::send_msg] transfers exactly one message and every
/// [Endpoint::recv_msg] receives at most one.
pub trait Endpoint {
    fn send_msg(&mut self, msg: &[u8]) -> io::Result<()>;

    /// Receives one message into `buf`, returning its length
    fn recv_msg(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<E: Endpoint + ?Sized> Endpoint for &mut E {
    fn send_msg(&mut self, msg: &[u8]) -> io::Result<()> {
        (**self).send_msg(msg)
    }

    fn recv_msg(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv_msg(buf)
    }
}

impl Endpoint for File {
    fn send_msg(&mut self, msg: &[u8]) -> io::Result<()> {
        self.write_message(msg)
    }

    fn recv_msg(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_message(buf)
    }
}

/// Opens endpoints of the agent by name
pub trait Transport {
    type Endpoint: Endpoint;

    fn open(&self, name: &str) -> io::Result<Self::Endpoint>;
}

/// Reaches factotum through its mounted file system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTransport {
    mtpt: PathBuf,
}

impl Default for MountTransport {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_POINT)
    }
}

impl MountTransport {
    pub fn new<P: Into<PathBuf>>(mtpt: P) -> Self {
        Self { mtpt: mtpt.into() }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mtpt
    }
}

impl Transport for MountTransport {
    type Endpoint = File;

    fn open(&self, name: &str) -> io::Result<File> {
        let path = self.mtpt.join(name);
        log::trace!("opening factotum endpoint {}", path.display());
        OpenOptions::new().read(true).write(true).open(&path)
    }
}
