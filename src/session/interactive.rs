//! Interactive read-eval loop.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::client::Connector;
use crate::commands::tokenize;
use crate::session::Session;

impl<K: Connector> Session<K> {
    /// Runs the interactive loop until `quit`, end of input or `shutdown`.
    ///
    /// Connects first, retrying until the daemon is reachable. While a line
    /// is being read the keepalive timer keeps firing; partially typed input
    /// stays buffered across ticks. The channel is closed on every exit path.
    pub async fn run_interactive<R, F>(&mut self, input: R, shutdown: F)
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let interrupted = tokio::select! {
            () = self.connect_with_retry() => false,
            () = &mut shutdown => true,
        };
        if interrupted {
            self.close().await;
            return;
        }
        self.attach_or_warn().await;
        self.emit(format_args!("\nInteractive mode\n\n"));

        let period = self.config.ping_interval;
        let mut keepalive = time::interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut lines = input.lines();

        while !self.quit {
            self.drain_events(false).await;
            self.emit(format_args!("> "));
            keepalive.reset();

            let line = loop {
                tokio::select! {
                    line = lines.next_line() => break line,
                    _ = keepalive.tick() => self.keepalive_tick().await,
                    () = &mut shutdown => {
                        tracing::info!("shutdown requested");
                        break Ok(None);
                    }
                }
            };

            match line {
                Ok(Some(line)) => self.execute(&tokenize(&line)).await,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "reading input failed");
                    break;
                }
            }
        }

        self.close().await;
    }
}
