//! Request/reply control channel to one daemon.
//!
//! Every command is one datagram and every reply is one datagram. There is
//! no request identifier on the wire, so exactly one request may be
//! outstanding at a time; `&mut self` on [`ControlChannel::request`] enforces
//! that. Once the channel is attached the daemon also pushes unsolicited
//! event datagrams, recognisable by a leading `<` (the `<N>` priority
//! prefix). Events that arrive while a reply is awaited are queued and handed
//! out through [`ControlChannel::pending`] and
//! [`ControlChannel::receive_event`].

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::{timeout, timeout_at, Instant};

use crate::client::connection::{Connector, Transport};
use crate::error::{ConnectError, RequestError};
use crate::Endpoint;

/// Largest reply the client accepts, in bytes.
pub const MAX_REPLY_LEN: usize = 4096;

/// Leading bytes of a reply that rejects the command.
const FAILURE_SENTINEL: &[u8] = b"FAIL";

/// Time allowed for `DETACH` while closing.
const DETACH_TIMEOUT: Duration = Duration::from_secs(2);

/// A successful (non-`FAIL`) reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: String,
}

impl Reply {
    /// Wraps reply text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the full reply text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the reply up to (not including) the first line break.
    pub fn first_line(&self) -> &str {
        self.text.split('\n').next().unwrap_or_default()
    }

    /// Consumes the reply, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Classifies raw reply bytes for `command`.
///
/// Anything whose first four bytes are `FAIL` is a daemon-level rejection,
/// whatever follows.
pub fn classify_reply(command: &str, raw: &[u8]) -> Result<Reply, RequestError> {
    let text = String::from_utf8_lossy(raw).into_owned();
    if raw.starts_with(FAILURE_SENTINEL) {
        return Err(RequestError::Rejected {
            command: command.to_string(),
            reply: text,
        });
    }
    Ok(Reply { text })
}

fn is_event(datagram: &[u8]) -> bool {
    datagram.first() == Some(&b'<')
}

fn event_text(datagram: &[u8]) -> String {
    String::from_utf8_lossy(datagram)
        .trim_end_matches('\n')
        .to_string()
}

/// An open control connection to one daemon.
///
/// Invariants: the channel is attached only while open, and closing always
/// detaches first. [`close`](Self::close) may be called any number of times.
#[derive(Debug)]
pub struct ControlChannel<T> {
    endpoint: Endpoint,
    transport: Option<T>,
    attached: bool,
    events: VecDeque<String>,
}

impl<T: Transport> ControlChannel<T> {
    /// Opens a channel to `endpoint`. The channel starts detached.
    pub async fn open<K>(connector: &K, endpoint: Endpoint) -> Result<Self, ConnectError>
    where
        K: Connector<Transport = T>,
    {
        let transport = connector.connect(&endpoint).await?;
        Ok(Self::from_transport(endpoint, transport))
    }

    /// Wraps an already connected transport.
    pub fn from_transport(endpoint: Endpoint, transport: T) -> Self {
        Self {
            endpoint,
            transport: Some(transport),
            attached: false,
            events: VecDeque::new(),
        }
    }

    /// Returns the endpoint this channel was opened to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns true until [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Returns true while subscribed to unsolicited events.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Sends `command` verbatim and waits up to `limit` for its reply.
    ///
    /// Event datagrams received in the meantime are queued, not returned.
    /// A `FAIL` reply comes back as [`RequestError::Rejected`].
    pub async fn request(&mut self, command: &str, limit: Duration) -> Result<Reply, RequestError> {
        let Self {
            transport, events, ..
        } = self;
        let transport = transport.as_mut().ok_or(RequestError::NotConnected)?;

        // Anything already queued predates this request; only events are kept.
        absorb_queued(transport, events);

        tracing::debug!(command, "sending control command");
        transport
            .send(command.as_bytes())
            .await
            .map_err(|source| RequestError::Transport {
                command: command.to_string(),
                source,
            })?;

        let deadline = Instant::now() + limit;
        let mut buf = vec![0u8; MAX_REPLY_LEN + 1];
        loop {
            let len = match timeout_at(deadline, transport.recv(&mut buf)).await {
                Err(_) => {
                    return Err(RequestError::Timeout {
                        command: command.to_string(),
                    })
                }
                Ok(Err(source)) => {
                    return Err(RequestError::Transport {
                        command: command.to_string(),
                        source,
                    })
                }
                Ok(Ok(len)) => len,
            };

            if len > MAX_REPLY_LEN {
                return Err(RequestError::ReplyTooLarge {
                    command: command.to_string(),
                    max: MAX_REPLY_LEN,
                });
            }

            let datagram = &buf[..len];
            if is_event(datagram) {
                tracing::trace!("queued event received during request");
                events.push_back(event_text(datagram));
                continue;
            }
            return classify_reply(command, datagram);
        }
    }

    /// Subscribes to unsolicited events. A no-op when already attached.
    pub async fn attach(&mut self, limit: Duration) -> Result<(), RequestError> {
        if self.attached {
            return Ok(());
        }
        let reply = self.request("ATTACH", limit).await?;
        if reply.text().trim_end() != "OK" {
            return Err(RequestError::Unexpected {
                command: "ATTACH".to_string(),
                reply: reply.text().trim_end().to_string(),
            });
        }
        self.attached = true;
        tracing::debug!(endpoint = %self.endpoint, "attached for events");
        Ok(())
    }

    /// Unsubscribes from events. A no-op when not attached.
    ///
    /// The channel counts as detached afterwards even if the daemon did not
    /// acknowledge.
    pub async fn detach(&mut self, limit: Duration) -> Result<(), RequestError> {
        if !self.attached {
            return Ok(());
        }
        self.attached = false;
        self.request("DETACH", limit).await?;
        tracing::debug!(endpoint = %self.endpoint, "detached from events");
        Ok(())
    }

    /// Returns true when at least one event is ready to be received.
    ///
    /// Never waits.
    pub fn pending(&mut self) -> bool {
        if !self.events.is_empty() {
            return true;
        }
        let Self {
            transport, events, ..
        } = self;
        match transport.as_mut() {
            Some(transport) => {
                absorb_queued(transport, events);
                !events.is_empty()
            }
            None => false,
        }
    }

    /// Returns the next event, waiting up to `limit` for one to arrive.
    pub async fn receive_event(&mut self, limit: Duration) -> Result<String, RequestError> {
        match timeout(limit, self.next_event()).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout {
                command: "event".to_string(),
            }),
        }
    }

    /// Returns the next event, waiting as long as it takes.
    ///
    /// Cancel safe: a datagram is only consumed once it is returned.
    pub async fn next_event(&mut self) -> Result<String, RequestError> {
        if let Some(event) = self.events.pop_front() {
            return Ok(event);
        }
        let transport = self.transport.as_mut().ok_or(RequestError::NotConnected)?;
        let mut buf = vec![0u8; MAX_REPLY_LEN + 1];
        loop {
            let len = transport
                .recv(&mut buf)
                .await
                .map_err(|source| RequestError::Transport {
                    command: "event".to_string(),
                    source,
                })?;
            if let Some(event) = accept_event(&buf[..len]) {
                return Ok(event);
            }
        }
    }

    /// Detaches if attached, then releases the transport.
    ///
    /// Safe to call repeatedly; only the first call does anything.
    pub async fn close(&mut self) {
        if self.transport.is_none() {
            return;
        }
        if let Err(e) = self.detach(DETACH_TIMEOUT).await {
            tracing::debug!(error = %e, "detach during close failed");
        }
        self.transport = None;
        self.events.clear();
        tracing::debug!(endpoint = %self.endpoint, "control channel closed");
    }
}

/// Moves every datagram already waiting on `transport` into `events`.
fn absorb_queued<T: Transport>(transport: &mut T, events: &mut VecDeque<String>) {
    let mut buf = vec![0u8; MAX_REPLY_LEN + 1];
    loop {
        match transport.try_recv(&mut buf) {
            Ok(Some(len)) => events.extend(accept_event(&buf[..len])),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "polling control socket failed");
                break;
            }
        }
    }
}

/// Returns the event carried by a datagram received outside a request.
///
/// Anything else, such as a late reply to a request that timed out, or an
/// oversized datagram, is dropped.
fn accept_event(datagram: &[u8]) -> Option<String> {
    if datagram.len() > MAX_REPLY_LEN {
        tracing::debug!(len = datagram.len(), "dropping oversized datagram");
        return None;
    }
    if !is_event(datagram) {
        tracing::debug!(
            datagram = %String::from_utf8_lossy(datagram).trim_end(),
            "dropping stray reply"
        );
        return None;
    }
    Some(event_text(datagram))
}
