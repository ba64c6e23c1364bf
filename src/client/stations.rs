//! Cursor-based enumeration of connected stations.
//!
//! The daemon has no bulk query. `STA-FIRST` returns the first station's
//! details, with its address on the first line; `STA-NEXT <addr>` returns the
//! station after `addr`. A `FAIL` reply marks the end of the list, so it
//! ends the enumeration normally instead of surfacing as an error.

use std::time::Duration;

use crate::client::channel::ControlChannel;
use crate::client::connection::Transport;
use crate::error::RequestError;

/// One station as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Station address (first reply line).
    pub address: String,
    /// Full reply text, address line included.
    pub details: String,
}

/// Stateful walk over the daemon's station table.
pub struct StationIter<'a, T> {
    channel: &'a mut ControlChannel<T>,
    limit: Duration,
    cursor: Option<String>,
    finished: bool,
}

impl<'a, T: Transport> StationIter<'a, T> {
    /// Starts an enumeration; nothing is sent until the first [`next`](Self::next).
    pub fn new(channel: &'a mut ControlChannel<T>, limit: Duration) -> Self {
        Self {
            channel,
            limit,
            cursor: None,
            finished: false,
        }
    }

    /// Fetches the next station, or `None` once the daemon reports the end.
    ///
    /// Timeouts and transport failures are returned and also end the walk.
    pub async fn next(&mut self) -> Result<Option<Station>, RequestError> {
        if self.finished {
            return Ok(None);
        }

        let command = match &self.cursor {
            None => "STA-FIRST".to_string(),
            Some(address) => format!("STA-NEXT {}", address),
        };

        let reply = match self.channel.request(&command, self.limit).await {
            Ok(reply) => reply,
            Err(RequestError::Rejected { .. }) => {
                self.finished = true;
                return Ok(None);
            }
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        let address = reply.first_line().trim_end_matches('\r').to_string();
        if address.is_empty() {
            tracing::debug!(command, "empty station address, ending enumeration");
            self.finished = true;
            return Ok(None);
        }

        self.cursor = Some(address.clone());
        Ok(Some(Station {
            address,
            details: reply.into_text(),
        }))
    }

    /// Runs the walk to completion.
    pub async fn collect_all(mut self) -> Result<Vec<Station>, RequestError> {
        let mut stations = Vec::new();
        while let Some(station) = self.next().await? {
            stations.push(station);
        }
        Ok(stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_utils::{ScriptedTransport, Wire};
    use crate::Endpoint;

    const LIMIT: Duration = Duration::from_secs(10);

    fn channel(wire: &Wire) -> ControlChannel<ScriptedTransport> {
        ControlChannel::from_transport(Endpoint::new("/run/test", "wlan0"), wire.transport())
    }

    #[tokio::test]
    async fn walks_until_fail() {
        let wire = Wire::new();
        wire.reply("A1\nflags=[AUTH][ASSOC]\n");
        wire.reply("A2\nflags=[AUTH]\n");
        wire.reply("FAIL\n");
        let mut channel = channel(&wire);

        let stations = StationIter::new(&mut channel, LIMIT)
            .collect_all()
            .await
            .expect("FAIL ends the walk without error");

        let addresses: Vec<_> = stations.iter().map(|s| s.address.as_str()).collect();
        assert_eq!(addresses, vec!["A1", "A2"]);
        assert_eq!(stations[0].details, "A1\nflags=[AUTH][ASSOC]\n");
        assert_eq!(
            wire.sent(),
            vec!["STA-FIRST", "STA-NEXT A1", "STA-NEXT A2"]
        );
    }

    #[tokio::test]
    async fn fail_on_first_means_no_stations() {
        let wire = Wire::new();
        wire.reply("FAIL\n");
        let mut channel = channel(&wire);

        let stations = StationIter::new(&mut channel, LIMIT)
            .collect_all()
            .await
            .unwrap();
        assert!(stations.is_empty());
        assert_eq!(wire.sent(), vec!["STA-FIRST"]);
    }

    #[tokio::test]
    async fn next_after_end_sends_nothing() {
        let wire = Wire::new();
        wire.reply("FAIL\n");
        let mut channel = channel(&wire);

        let mut iter = StationIter::new(&mut channel, LIMIT);
        assert!(iter.next().await.unwrap().is_none());
        assert!(iter.next().await.unwrap().is_none());
        assert_eq!(wire.sent(), vec!["STA-FIRST"]);
    }

    #[tokio::test]
    async fn empty_address_ends_walk() {
        let wire = Wire::new();
        wire.reply("\n");
        let mut channel = channel(&wire);

        let stations = StationIter::new(&mut channel, LIMIT)
            .collect_all()
            .await
            .unwrap();
        assert!(stations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_propagated() {
        let wire = Wire::new();
        wire.reply("A1\n");
        wire.silence();
        let mut channel = channel(&wire);

        let mut iter = StationIter::new(&mut channel, Duration::from_secs(1));
        assert_eq!(iter.next().await.unwrap().unwrap().address, "A1");
        let err = iter.next().await.unwrap_err();
        assert!(matches!(err, RequestError::Timeout { ref command } if command == "STA-NEXT A1"));
        assert!(iter.next().await.unwrap().is_none());
    }
}
