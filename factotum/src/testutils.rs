//! Helpers used in tests: a scripted agent and a scripted peer

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use crate::transport::{Endpoint, Transport};

pub fn setup_logging() {
    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder.filter_level(log::LevelFilter::Trace);
    log_builder.is_test(true);
    let _ = log_builder.try_init();
}

#[derive(Debug, Default)]
struct AgentState {
    script: VecDeque<(&'static str, Vec<u8>)>,
    pending: Option<Vec<u8>>,
    requests: Vec<Vec<u8>>,
    opened: Vec<String>,
}

/// Plays back canned replies, checking the verb of every request.
///
/// Clones share the same script so tests can inspect what was sent after
/// handing an endpoint to the code under test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    state: Arc<Mutex<AgentState>>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<(&'static str, Vec<u8>)>) -> Self {
        let state = AgentState {
            script: script.into(),
            ..AgentState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn endpoint(&self) -> AgentEndpoint {
        AgentEndpoint {
            state: self.state.clone(),
        }
    }

    /// Every request received so far, verbatim
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Verbs of all requests received so far
    pub fn verbs(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|req| {
                let verb = req.split(|&b| b == b' ').next().unwrap_or_default();
                String::from_utf8_lossy(verb).into_owned()
            })
            .collect()
    }

    /// Names of the endpoints opened through [Transport::open]
    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    /// Number of scripted replies not consumed yet
    pub fn replies_left(&self) -> usize {
        self.state.lock().unwrap().script.len()
    }
}

impl Transport for ScriptedAgent {
    type Endpoint = AgentEndpoint;

    fn open(&self, name: &str) -> io::Result<AgentEndpoint> {
        self.state.lock().unwrap().opened.push(name.to_owned());
        Ok(self.endpoint())
    }
}

#[derive(Debug)]
pub struct AgentEndpoint {
    state: Arc<Mutex<AgentState>>,
}

impl Endpoint for AgentEndpoint {
    fn send_msg(&mut self, msg: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(msg.to_vec());
        let (verb, reply) = state.script.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted")
        })?;
        if !msg.starts_with(verb.as_bytes()) || msg.get(verb.len()) != Some(&b' ') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "expected {verb} request, got {:?}",
                    String::from_utf8_lossy(msg)
                ),
            ));
        }
        state.pending = Some(reply);
        Ok(())
    }

    fn recv_msg(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let reply = self
            .state
            .lock()
            .unwrap()
            .pending
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no reply pending"))?;
        let n = reply.len().min(buf.len());
        buf[..n].copy_from_slice(&reply[..n]);
        Ok(n)
    }
}

/// Endpoint that only records what is written to it
#[derive(Debug, Default)]
pub struct RecordingEndpoint {
    pub sent: Vec<Vec<u8>>,
}

impl Endpoint for RecordingEndpoint {
    fn send_msg(&mut self, msg: &[u8]) -> io::Result<()> {
        self.sent.push(msg.to_vec());
        Ok(())
    }

    fn recv_msg(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "write only"))
    }
}

/// The remote side of a proxied conversation
#[derive(Debug, Default)]
pub struct ScriptedPeer {
    incoming: VecDeque<u8>,
    /// Number of bytes handed out by each read call
    pub reads: Vec<usize>,
    /// Messages written to the peer
    pub written: Vec<Vec<u8>>,
}

impl ScriptedPeer {
    pub fn new(incoming: &[u8]) -> Self {
        Self {
            incoming: incoming.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn unread(&self) -> usize {
        self.incoming.len()
    }
}

impl Read for ScriptedPeer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.incoming.len());
        for (dst, src) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *dst = src;
        }
        self.reads.push(n);
        Ok(n)
    }
}

impl Write for ScriptedPeer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
