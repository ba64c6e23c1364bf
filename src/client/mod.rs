//! Client side of the daemon control protocol.
//!
//! - [`connection`]: raw datagram transport and the connector that opens it
//! - [`channel`]: request/reply, the `FAIL` sentinel, attach/detach and
//!   event queueing on top of a transport
//! - [`stations`]: cursor-based enumeration of connected stations
//!
//! # Usage
//!
//! ```no_run
//! use apctl::client::{ControlChannel, UnixConnector};
//! use apctl::Endpoint;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Endpoint::new("/var/run/hostapd", "wlan0");
//! let mut channel = ControlChannel::open(&UnixConnector::default(), endpoint).await?;
//! let reply = channel.request("MIB", Duration::from_secs(10)).await?;
//! print!("{}", reply.text());
//! channel.close().await;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod connection;
pub mod stations;

#[cfg(test)]
pub(crate) mod test_utils;

pub use channel::{classify_reply, ControlChannel, Reply, MAX_REPLY_LEN};
pub use connection::{Connector, Transport, UnixConnector, UnixTransport, DEFAULT_LOCAL_DIR};
pub use stations::{Station, StationIter};
