//! JSON configuration for a grid installation.

use std::{collections::BTreeMap, net::IpAddr, path::Path};

use anyhow::Context as _;

use crate::{
    effects::transitions::Transition,
    foundation::core::Grid,
    foundation::error::{LxError, LxResult},
    foundation::math::constrain,
    output::kinet::KINET_UDP_PORT,
    output::node_map::{NodeAddr, NodeMap, PortAddr},
    output::throttle::DEFAULT_FRAMERATE,
};

fn default_framerate() -> f64 {
    DEFAULT_FRAMERATE
}

fn default_brightness() -> f64 {
    1.0
}

fn default_transition_ms() -> u64 {
    1000
}

fn default_udp_port() -> u16 {
    KINET_UDP_PORT
}

/// A named network destination.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortConfig {
    pub host: IpAddr,
    /// Output port number on the device.
    pub port: u8,
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
}

impl PortConfig {
    pub fn addr(&self) -> PortAddr {
        PortAddr::new((self.host, self.udp_port).into(), self.port)
    }
}

/// One cell's assignment: a port name from [`LxConfig::ports`] and a node index.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub port: String,
    pub index: u16,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LxConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_framerate")]
    pub framerate: f64,
    #[serde(default = "default_brightness")]
    pub brightness: f64,
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
    #[serde(default)]
    pub auto_transition_ms: Option<u64>,
    #[serde(default)]
    pub ports: BTreeMap<String, PortConfig>,
    #[serde(default)]
    pub nodes: Vec<Option<NodeConfig>>,
}

impl LxConfig {
    pub fn from_json_str(s: &str) -> LxResult<Self> {
        let mut cfg: Self = serde_json::from_str(s).map_err(|e| LxError::serde(e.to_string()))?;
        cfg.brightness = constrain(cfg.brightness, 0.0, 1.0);
        cfg.validate()?;
        Ok(cfg)
    }

    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> LxResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Check geometry, framerate and node references without building anything.
    pub fn validate(&self) -> LxResult<()> {
        self.grid()?;
        if !self.framerate.is_finite() || self.framerate <= 0.0 {
            return Err(LxError::configuration(format!(
                "framerate must be finite and positive, got {}",
                self.framerate
            )));
        }
        if !self.nodes.is_empty() {
            self.node_map()?;
        }
        Ok(())
    }

    pub fn grid(&self) -> LxResult<Grid> {
        Grid::new(self.width, self.height)
    }

    pub fn transition(&self) -> Transition {
        Transition::crossfade(self.transition_ms)
    }

    /// Resolve port names and build the node map.
    pub fn node_map(&self) -> LxResult<NodeMap> {
        let grid = self.grid()?;
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(cell, node)| {
                let Some(node) = node else {
                    return Ok(None);
                };
                let port = self.ports.get(&node.port).ok_or_else(|| {
                    LxError::configuration(format!("cell {cell}: unknown port '{}'", node.port))
                })?;
                Ok(Some(NodeAddr::new(port.addr(), node.index)))
            })
            .collect::<LxResult<Vec<_>>>()?;
        NodeMap::assign(grid, nodes)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
