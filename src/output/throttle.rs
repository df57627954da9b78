use std::net::{SocketAddr, UdpSocket};

use anyhow::Context as _;

use crate::{
    foundation::core::{ColorBuffer, Grid},
    foundation::error::{LxError, LxResult},
    output::kinet::Port,
    output::node_map::{NodeAddr, NodeMap},
};

/// Upper bound on hardware refresh for older supplies.
pub const DEFAULT_FRAMERATE: f64 = 30.0;

/// Fire-and-forget datagram transport.
pub trait DatagramSink {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> std::io::Result<usize>;
}

impl DatagramSink for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> std::io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }
}

impl<S: DatagramSink + ?Sized> DatagramSink for &S {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> std::io::Result<usize> {
        (**self).send_to(buf, addr)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Frames transmitted.
    pub sent: u64,
    /// Frames skipped because the previous send was too recent.
    pub dropped: u64,
    /// Datagrams handed to the sink successfully.
    pub datagrams: u64,
    /// Datagrams the sink rejected.
    pub send_errors: u64,
}

/// Rate-limited KiNET output.
///
/// Holds at most one frame: a submit that arrives before the next send is due is dropped,
/// never queued.
pub struct ThrottledOutput<S = UdpSocket> {
    grid: Grid,
    sink: S,
    map: Option<NodeMap>,
    ports: Vec<Port>,
    framerate: f64,
    last_sent_ms: Option<u64>,
    stats: OutputStats,
    scratch: Vec<u8>,
}

impl ThrottledOutput<UdpSocket> {
    /// Output over a fresh socket bound to an ephemeral local port.
    pub fn bind(grid: Grid) -> LxResult<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).context("bind KiNET output socket")?;
        Ok(Self::new(grid, socket))
    }
}

impl<S: DatagramSink> ThrottledOutput<S> {
    pub fn new(grid: Grid, sink: S) -> Self {
        Self {
            grid,
            sink,
            map: None,
            ports: Vec::new(),
            framerate: DEFAULT_FRAMERATE,
            last_sent_ms: None,
            stats: OutputStats::default(),
            scratch: Vec::new(),
        }
    }

    pub fn with_node_map(mut self, map: NodeMap) -> LxResult<Self> {
        self.set_node_map(map)?;
        Ok(self)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Build a node map from one entry per cell and install it.
    /// On error the current map stays in place.
    pub fn assign(&mut self, nodes: Vec<Option<NodeAddr>>) -> LxResult<()> {
        let map = NodeMap::assign(self.grid, nodes)?;
        self.install(map);
        Ok(())
    }

    /// Replace the node map. On error the current map stays in place.
    pub fn set_node_map(&mut self, map: NodeMap) -> LxResult<()> {
        if map.len() != self.grid.total() {
            return Err(LxError::configuration(format!(
                "node map covers {} cells, grid has {}",
                map.len(),
                self.grid.total()
            )));
        }
        self.install(map);
        Ok(())
    }

    pub fn clear_node_map(&mut self) {
        self.map = None;
        self.ports.clear();
    }

    pub fn node_map(&self) -> Option<&NodeMap> {
        self.map.as_ref()
    }

    fn install(&mut self, map: NodeMap) {
        let ports = map
            .ports()
            .iter()
            .enumerate()
            .map(|(slot, addr)| Port::new(*addr, map.node_count(slot)))
            .collect();
        tracing::debug!(
            ports = map.ports().len(),
            mapped = map.mapped(),
            "node map replaced"
        );
        self.ports = ports;
        self.map = Some(map);
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    pub fn set_framerate(&mut self, framerate: f64) -> LxResult<()> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(LxError::configuration(format!(
                "framerate must be finite and positive, got {framerate}"
            )));
        }
        self.framerate = framerate;
        Ok(())
    }

    /// Minimum spacing between sends in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.framerate
    }

    pub fn last_sent_ms(&self) -> Option<u64> {
        self.last_sent_ms
    }

    pub fn stats(&self) -> OutputStats {
        self.stats
    }

    /// Offer a frame at `now_ms`. Returns whether it was transmitted.
    ///
    /// With no node map installed the call does nothing. A `now_ms` earlier than the last
    /// send counts as no time elapsed. Send failures are logged and counted, never returned.
    pub fn submit(&mut self, colors: &ColorBuffer, now_ms: u64) -> LxResult<bool> {
        if colors.len() != self.grid.total() {
            return Err(LxError::invalid_input(format!(
                "frame has {} colors, grid has {} cells",
                colors.len(),
                self.grid.total()
            )));
        }
        let Some(map) = &self.map else {
            return Ok(false);
        };
        if let Some(last) = self.last_sent_ms {
            let elapsed = now_ms.saturating_sub(last);
            if (elapsed as f64) < self.interval_ms() {
                self.stats.dropped += 1;
                return Ok(false);
            }
        }

        for (color, target) in colors.iter().zip(map.cells()) {
            if let Some(target) = target {
                self.ports[target.port].set_node(target.index, color.rgb_bytes());
            }
        }

        for port in &self.ports {
            port.write_packet(&mut self.scratch);
            let addr = port.addr();
            match self.sink.send_to(&self.scratch, addr.destination) {
                Ok(_) => self.stats.datagrams += 1,
                Err(err) => {
                    self.stats.send_errors += 1;
                    tracing::warn!(
                        destination = %addr.destination,
                        port = addr.port,
                        error = %err,
                        "KiNET send failed"
                    );
                }
            }
        }

        self.last_sent_ms = Some(now_ms);
        self.stats.sent += 1;
        Ok(true)
    }
}

impl<S> std::fmt::Debug for ThrottledOutput<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledOutput")
            .field("grid", &self.grid)
            .field("ports", &self.ports.len())
            .field("framerate", &self.framerate)
            .field("last_sent_ms", &self.last_sent_ms)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/throttle.rs"]
mod tests;
