//! Per-tick snapshot sinks.
//!
//! ## Sinks
//!
//! - [`UdpSink`]: one CSV line per tick to a UDP listener (live graphing)
//! - [`LogSink`]: one `tracing` event per tick
//! - `Vec<Snapshot>`: keeps every snapshot in memory
//!
//! ## Wire Format
//!
//! ```text
//! {tick},{best_bid:.6},{best_ask:.6},{portfolio_value:.2}\n
//! ```
//!
//! An empty side is sent as `0.000000`.

use std::net::{SocketAddr, UdpSocket};

use tracing::{debug, info};

use crate::types::TelemetryError;
use crate::venue::Snapshot;

/// Destination for venue snapshots
pub trait TelemetrySink {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TelemetryError>;
}

impl TelemetrySink for Vec<Snapshot> {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TelemetryError> {
        self.push(snapshot.clone());
        Ok(())
    }
}

/// Render a snapshot as one datagram line
pub fn format_line(snapshot: &Snapshot) -> String {
    format!(
        "{},{:.6},{:.6},{:.2}\n",
        snapshot.tick,
        snapshot.best_bid.unwrap_or(0.0),
        snapshot.best_ask.unwrap_or(0.0),
        snapshot.portfolio_value
    )
}

/// Sends each snapshot as a UDP datagram
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
    sent: u64,
}

impl UdpSink {
    /// Bind an ephemeral local port and aim it at `target`
    pub fn connect(target: &str) -> Result<Self, TelemetryError> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(target)?;
        let target = socket.peer_addr()?;
        info!(%target, "udp telemetry connected");

        Ok(Self {
            socket,
            target,
            sent: 0,
        })
    }

    #[inline]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Datagrams sent so far
    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl TelemetrySink for UdpSink {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TelemetryError> {
        self.socket.send(format_line(snapshot).as_bytes())?;
        self.sent += 1;
        Ok(())
    }
}

/// Emits snapshots as debug-level events
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&mut self, snapshot: &Snapshot) -> Result<(), TelemetryError> {
        debug!(
            tick = snapshot.tick,
            best_bid = ?snapshot.best_bid,
            best_ask = ?snapshot.best_ask,
            value = snapshot.portfolio_value,
            base = snapshot.base_balance,
            quote = snapshot.quote_balance,
            "snapshot"
        );
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(tick: u64) -> Snapshot {
        Snapshot {
            tick,
            best_bid: Some(1.2745),
            best_ask: None,
            portfolio_value: 10.5,
            base_balance: 0.0,
            quote_balance: 10.5,
        }
    }

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(&snapshot(7)), "7,1.274500,0.000000,10.50\n");
    }

    #[test]
    fn test_vec_sink_keeps_snapshots() {
        let mut sink: Vec<Snapshot> = Vec::new();
        sink.publish(&snapshot(1)).unwrap();
        sink.publish(&snapshot(2)).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].tick, 2);
    }

    #[test]
    fn test_log_sink_never_fails() {
        assert!(LogSink.publish(&snapshot(1)).is_ok());
    }

    #[test]
    fn test_udp_sink_delivers_line() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut sink = UdpSink::connect(&addr).unwrap();
        sink.publish(&snapshot(3)).unwrap();

        let mut buf = [0u8; 128];
        let n = listener.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"3,1.274500,0.000000,10.50\n");
        assert_eq!(sink.sent(), 1);
    }
}
