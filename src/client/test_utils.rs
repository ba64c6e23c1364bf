//! Scripted transport and connector for channel and session tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use crate::client::connection::{Connector, Transport};
use crate::error::ConnectError;
use crate::Endpoint;

/// One scripted outcome for a blocking receive.
#[derive(Debug)]
enum Scripted {
    Datagram(Vec<u8>),
    Silence,
    Error(io::ErrorKind),
}

#[derive(Debug, Default)]
struct WireState {
    sent: Vec<String>,
    replies: VecDeque<Scripted>,
    events: VecDeque<Vec<u8>>,
}

/// Shared script and send log. Clones see the same state, so a test keeps a
/// handle while the transport itself lives inside a channel or session.
#[derive(Debug, Clone, Default)]
pub(crate) struct Wire {
    state: Rc<RefCell<WireState>>,
}

impl Wire {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a datagram for the next blocking receive.
    pub(crate) fn reply(&self, text: &str) {
        self.state
            .borrow_mut()
            .replies
            .push_back(Scripted::Datagram(text.as_bytes().to_vec()));
    }

    /// Makes the next blocking receive wait forever.
    pub(crate) fn silence(&self) {
        self.state.borrow_mut().replies.push_back(Scripted::Silence);
    }

    /// Makes the next blocking receive fail.
    pub(crate) fn io_error(&self, kind: io::ErrorKind) {
        self.state
            .borrow_mut()
            .replies
            .push_back(Scripted::Error(kind));
    }

    /// Queues a datagram that is already waiting (seen by non-blocking polls).
    pub(crate) fn event(&self, text: &str) {
        self.state
            .borrow_mut()
            .events
            .push_back(text.as_bytes().to_vec());
    }

    /// Commands sent so far, in order.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    /// Creates a transport backed by this wire.
    pub(crate) fn transport(&self) -> ScriptedTransport {
        ScriptedTransport { wire: self.clone() }
    }
}

/// Transport that plays back a [`Wire`] script.
#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    wire: Wire,
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        self.wire
            .state
            .borrow_mut()
            .sent
            .push(String::from_utf8_lossy(datagram).into_owned());
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.wire.state.borrow_mut().replies.pop_front();
        match next {
            Some(Scripted::Datagram(bytes)) => {
                let len = bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&bytes[..len]);
                Ok(len)
            }
            Some(Scripted::Error(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(Scripted::Silence) | None => std::future::pending().await,
        }
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        let next = self.wire.state.borrow_mut().events.pop_front();
        Ok(next.map(|bytes| {
            let len = bytes.len().min(buf.len());
            buf[..len].copy_from_slice(&bytes[..len]);
            len
        }))
    }
}

/// Connector whose connect attempts succeed or fail as scripted.
///
/// Every successful connect hands out a transport on the same [`Wire`].
/// Once the outcome script runs out, connects succeed.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    wire: Wire,
    outcomes: RefCell<VecDeque<bool>>,
    attempts: Cell<usize>,
    endpoints: RefCell<Vec<Endpoint>>,
}

impl ScriptedConnector {
    pub(crate) fn new(wire: &Wire) -> Self {
        Self {
            wire: wire.clone(),
            ..Self::default()
        }
    }

    /// Makes the next connect attempt fail.
    pub(crate) fn refuse_next(&self) {
        self.outcomes.borrow_mut().push_back(false);
    }

    /// Number of connect attempts so far.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.get()
    }

    /// Endpoints passed to connect, in order.
    pub(crate) fn endpoints(&self) -> Vec<Endpoint> {
        self.endpoints.borrow().clone()
    }
}

impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<ScriptedTransport, ConnectError> {
        self.attempts.set(self.attempts.get() + 1);
        self.endpoints.borrow_mut().push(endpoint.clone());
        let succeed = self.outcomes.borrow_mut().pop_front().unwrap_or(true);
        if succeed {
            Ok(self.wire.transport())
        } else {
            Err(ConnectError::Connect {
                path: endpoint.socket_path(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "scripted refusal"),
            })
        }
    }
}

/// In-memory output sink whose contents stay readable after it is boxed.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedOutput {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedOutput {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    /// Drops everything written so far.
    pub(crate) fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

impl Write for SharedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A control directory path that never exists, for tests that must not
/// discover anything.
pub(crate) fn missing_dir() -> PathBuf {
    PathBuf::from("/nonexistent/apctl-test-ctrl")
}
