//! Session: the single owner of the control channel.
//!
//! A [`Session`] ties the command registry to one [`ControlChannel`] and runs
//! the keepalive state machine. The link is either connected (a channel is
//! held) or disconnected (none is held); [`Session::keepalive_tick`] moves
//! between the two, at most one step per tick.
//!
//! Operator-facing text goes to the session's output (stdout by default),
//! diagnostics go through `tracing`.

mod action;
mod interactive;

pub use action::{action_command, strip_priority};

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use crate::client::{Connector, ControlChannel, StationIter};
use crate::commands::{Action, CommandRegistry};
use crate::discovery;
use crate::error::{ConnectError, RequestError, SessionError};
use crate::{ClientConfig, Endpoint};

/// Liveness of the link to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// A channel is open.
    Connected,
    /// No channel; the next keepalive tick tries to reopen it.
    Disconnected,
}

/// Where unsolicited daemon events go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EventSink {
    /// Print each event on its own line.
    Print,
    /// Run `program <interface> <event>` for each event.
    Action(PathBuf),
}

/// Client session against one daemon interface at a time.
pub struct Session<K: Connector> {
    connector: K,
    config: ClientConfig,
    registry: CommandRegistry,
    channel: Option<ControlChannel<K::Transport>>,
    sink: EventSink,
    out: Box<dyn Write>,
    quit: bool,
}

impl<K: Connector> Session<K> {
    /// Creates a disconnected session printing to stdout.
    pub fn new(connector: K, config: ClientConfig) -> Self {
        Self {
            connector,
            config,
            registry: CommandRegistry::builtin(),
            channel: None,
            sink: EventSink::Print,
            out: Box::new(std::io::stdout()),
            quit: false,
        }
    }

    /// Redirects operator output.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    /// Returns the session settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the connector used to open channels.
    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Returns the command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Returns the selected interface, if any.
    pub fn interface(&self) -> Option<&str> {
        self.config.interface.as_deref()
    }

    /// Returns the current link state.
    pub fn state(&self) -> LinkState {
        if self.channel.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    /// Returns true while the open channel is subscribed to events.
    pub fn is_attached(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_attached())
    }

    /// Returns true once `quit` has been dispatched.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        write_out(&mut *self.out, args);
    }

    /// Builds the endpoint for the selected interface, selecting the first
    /// discoverable one when none is set.
    fn endpoint(&mut self) -> Result<Endpoint, ConnectError> {
        let interface = match self.config.interface.clone() {
            Some(interface) => interface,
            None => {
                let Some(found) = discovery::first_interface(&self.config.ctrl_dir) else {
                    return Err(ConnectError::NoInterface {
                        dir: self.config.ctrl_dir.clone(),
                    });
                };
                self.emit(format_args!("Selected interface '{}'\n", found));
                self.config.interface = Some(found.clone());
                found
            }
        };
        Ok(Endpoint::new(self.config.ctrl_dir.clone(), interface))
    }

    /// Opens a channel to the selected interface, replacing any open one.
    ///
    /// The new channel is not attached.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        self.close().await;
        let endpoint = self.endpoint()?;
        tracing::debug!(%endpoint, "opening control channel");
        let channel = ControlChannel::open(&self.connector, endpoint).await?;
        self.channel = Some(channel);
        Ok(())
    }

    /// Connects, retrying every `reconnect_delay` until it succeeds.
    ///
    /// The first failure is reported once; later ones only in the log.
    pub async fn connect_with_retry(&mut self) {
        let mut warned = false;
        loop {
            match self.connect().await {
                Ok(()) => {
                    if warned {
                        self.emit(format_args!("Connection established.\n"));
                    }
                    return;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "connection attempt failed");
                    if !warned {
                        self.emit(format_args!("Could not connect - re-trying\n"));
                        warned = true;
                    }
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    /// Subscribes the open channel to events.
    pub async fn attach(&mut self) -> Result<(), RequestError> {
        let limit = self.config.request_timeout;
        let channel = self.channel.as_mut().ok_or(RequestError::NotConnected)?;
        channel.attach(limit).await
    }

    async fn attach_or_warn(&mut self) -> bool {
        match self.attach().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "attach failed");
                self.emit(format_args!("Warning: Failed to attach to daemon.\n"));
                false
            }
        }
    }

    /// Detaches and closes the channel, if any. The session is disconnected
    /// afterwards.
    pub async fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }
    }

    async fn lose_link(&mut self, error: &RequestError) {
        tracing::info!(error = %error, "link to daemon lost");
        self.emit(format_args!(
            "Connection to daemon lost - trying to reconnect\n"
        ));
        self.close().await;
    }

    /// Runs one keepalive step, then drains pending events.
    ///
    /// Connected: probe with `PING`. Any daemon answer, `FAIL` included,
    /// keeps the link; a timeout or transport failure drops it.
    /// Disconnected: try to reopen and re-attach.
    pub async fn keepalive_tick(&mut self) {
        let limit = self.config.probe_timeout;
        let probe = match self.channel.as_mut() {
            Some(channel) => Some(channel.request("PING", limit).await),
            None => None,
        };
        match probe {
            Some(Ok(_)) => {}
            Some(Err(e)) if e.is_daemon_reply() => {
                tracing::debug!(error = %e, "keepalive answered with an error reply");
            }
            Some(Err(e)) => self.lose_link(&e).await,
            None => self.reconnect().await,
        }
        self.drain_events(true).await;
    }

    async fn reconnect(&mut self) {
        match self.connect().await {
            Ok(()) => {
                tracing::info!(interface = ?self.interface(), "link to daemon restored");
                self.emit(format_args!("Connection to daemon re-established\n"));
                self.attach_or_warn().await;
            }
            Err(e) => tracing::debug!(error = %e, "reconnect attempt failed"),
        }
    }

    /// Delivers every event already waiting on the channel.
    ///
    /// `in_read` means a prompt is on screen; printed events are then
    /// separated from it by a blank line.
    pub async fn drain_events(&mut self, in_read: bool) {
        let limit = self.config.request_timeout;
        let mut first = true;
        loop {
            let Some(channel) = self.channel.as_mut() else {
                break;
            };
            if !channel.pending() {
                break;
            }
            match channel.receive_event(limit).await {
                Ok(event) => {
                    if in_read && first && self.sink == EventSink::Print {
                        self.emit(format_args!("\n"));
                    }
                    first = false;
                    self.deliver_event(&event).await;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "receiving pending event failed");
                    self.emit(format_args!("Could not read pending message.\n"));
                    break;
                }
            }
        }
    }

    async fn deliver_event(&mut self, event: &str) {
        let program = match &self.sink {
            EventSink::Print => None,
            EventSink::Action(program) => Some(program.clone()),
        };
        match program {
            None => self.emit(format_args!("{}\n", event)),
            Some(program) => {
                let interface = self.interface().unwrap_or_default().to_string();
                action::run_action(&program, &interface, event).await;
            }
        }
    }

    /// Resolves and runs one tokenized command line.
    pub async fn dispatch(&mut self, tokens: &[String]) -> Result<(), SessionError> {
        let action = self.registry.parse(tokens)?;
        tracing::debug!(?action, "dispatching command");
        self.perform(action).await
    }

    /// Like [`dispatch`](Self::dispatch), printing any failure instead of
    /// returning it. Empty lines are ignored.
    pub async fn execute(&mut self, tokens: &[String]) {
        if tokens.is_empty() {
            return;
        }
        if let Err(e) = self.dispatch(tokens).await {
            self.report(&e);
        }
    }

    fn report(&mut self, error: &SessionError) {
        match error {
            SessionError::Request(RequestError::Rejected { reply, .. }) => {
                self.emit(format_args!("{}", reply));
                if !reply.ends_with('\n') {
                    self.emit(format_args!("\n"));
                }
            }
            other => self.emit(format_args!("{}\n", other)),
        }
    }

    async fn perform(&mut self, action: Action) -> Result<(), SessionError> {
        match action {
            Action::Send(command) => {
                let limit = self.config.request_timeout;
                let channel = self.channel.as_mut().ok_or(RequestError::NotConnected)?;
                let reply = channel.request(&command, limit).await?;
                self.emit(format_args!("{}", reply.text()));
            }
            Action::AllStations => self.print_all_stations().await?,
            Action::Interface(None) => self.list_interfaces(),
            Action::Interface(Some(name)) => {
                if let Err(e) = self.switch_interface(&name).await {
                    tracing::debug!(error = %e, interface = %name, "interface switch failed");
                }
            }
            Action::Help => {
                let help = self.registry.help_text();
                self.emit(format_args!("{}", help));
            }
            Action::Quit => self.quit = true,
        }
        Ok(())
    }

    async fn print_all_stations(&mut self) -> Result<(), RequestError> {
        let limit = self.config.request_timeout;
        let channel = self.channel.as_mut().ok_or(RequestError::NotConnected)?;
        let mut stations = StationIter::new(channel, limit);
        while let Some(station) = stations.next().await? {
            write_out(&mut *self.out, format_args!("{}", station.details));
        }
        Ok(())
    }

    fn list_interfaces(&mut self) {
        match discovery::list_interfaces(&self.config.ctrl_dir) {
            Ok(names) => {
                self.emit(format_args!("Available interfaces:\n"));
                for name in names {
                    self.emit(format_args!("{}\n", name));
                }
            }
            Err(e) => {
                let dir = self.config.ctrl_dir.display().to_string();
                self.emit(format_args!("Could not list interfaces in {}: {}\n", dir, e));
            }
        }
    }

    /// Closes the current channel and connects to `name` instead.
    ///
    /// On failure the session stays disconnected with `name` selected, so
    /// the keepalive keeps trying it.
    pub async fn switch_interface(&mut self, name: &str) -> Result<(), ConnectError> {
        self.close().await;
        self.config.interface = Some(name.to_string());
        if let Err(e) = self.connect().await {
            self.emit(format_args!(
                "Could not connect to interface '{}' - re-trying\n",
                name
            ));
            return Err(e);
        }
        self.emit(format_args!("Connected to interface '{}'.\n", name));
        self.attach_or_warn().await;
        Ok(())
    }

    /// Connects once, runs one command and disconnects.
    ///
    /// Only a failed connection is an error; command failures are printed.
    /// When `shutdown` completes first the command is abandoned and the
    /// channel is closed as usual.
    pub async fn run_batch<F>(
        &mut self,
        tokens: &[String],
        shutdown: F,
    ) -> Result<(), ConnectError>
    where
        F: Future<Output = ()>,
    {
        let interrupted = tokio::select! {
            result = self.connect_and_execute(tokens) => {
                result?;
                false
            }
            () = shutdown => true,
        };
        if interrupted {
            tracing::info!("shutdown requested during batch command");
        }
        self.close().await;
        Ok(())
    }

    async fn connect_and_execute(&mut self, tokens: &[String]) -> Result<(), ConnectError> {
        self.connect().await?;
        self.execute(tokens).await;
        Ok(())
    }
}

fn write_out(out: &mut dyn Write, args: fmt::Arguments<'_>) {
    if let Err(e) = out.write_fmt(args).and_then(|()| out.flush()) {
        tracing::debug!(error = %e, "writing output failed");
    }
}
