//! Action-monitor mode: run an external program for every daemon event.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::client::{Connector, ControlChannel, Transport};
use crate::error::{RequestError, SessionError};
use crate::session::{EventSink, Session};

/// Strips a leading `<N>` priority tag from an event, if present.
pub fn strip_priority(event: &str) -> &str {
    event
        .strip_prefix('<')
        .and_then(|rest| rest.find('>').map(|end| &rest[end + 1..]))
        .unwrap_or(event)
}

/// Builds the invocation `program <interface> <event>` for one event.
pub fn action_command(program: &Path, interface: &str, event: &str) -> Command {
    let mut command = Command::new(program);
    command.arg(interface).arg(strip_priority(event));
    command
}

/// Runs the action program for one event and waits for it to finish.
pub(super) async fn run_action(program: &Path, interface: &str, event: &str) {
    match action_command(program, interface, event).status().await {
        Ok(status) if status.success() => {
            tracing::debug!(program = %program.display(), event, "action program ran");
        }
        Ok(status) => {
            tracing::warn!(program = %program.display(), %status, "action program failed");
        }
        Err(e) => {
            tracing::warn!(program = %program.display(), error = %e, "cannot run action program");
        }
    }
}

/// Waits for the next event, or forever while disconnected.
async fn next_event<T: Transport>(
    channel: Option<&mut ControlChannel<T>>,
) -> Result<String, RequestError> {
    match channel {
        Some(channel) => channel.next_event().await,
        None => std::future::pending().await,
    }
}

enum Wake {
    Event(Result<String, RequestError>),
    Tick,
    Shutdown,
}

impl<K: Connector> Session<K> {
    /// Connects, attaches and hands every event to `program` until
    /// `shutdown` completes.
    ///
    /// Failing to connect or attach at startup is an error. Afterwards the
    /// link is kept alive and restored exactly as in interactive mode.
    pub async fn run_action_monitor<F>(
        &mut self,
        program: PathBuf,
        shutdown: F,
    ) -> Result<(), SessionError>
    where
        F: Future<Output = ()>,
    {
        self.sink = EventSink::Action(program);
        self.connect().await?;
        if let Err(e) = self.attach().await {
            self.close().await;
            return Err(e.into());
        }
        tracing::info!(interface = ?self.interface(), "monitoring events");

        tokio::pin!(shutdown);
        let period = self.config.ping_interval;
        let mut keepalive = time::interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                event = next_event(self.channel.as_mut()) => Wake::Event(event),
                _ = keepalive.tick() => Wake::Tick,
                () = &mut shutdown => Wake::Shutdown,
            };
            match wake {
                Wake::Event(Ok(event)) => {
                    self.deliver_event(&event).await;
                    self.drain_events(false).await;
                }
                Wake::Event(Err(e)) => self.lose_link(&e).await,
                Wake::Tick => self.keepalive_tick().await,
                Wake::Shutdown => break,
            }
        }

        self.close().await;
        Ok(())
    }
}
