use std::net::{IpAddr, SocketAddr};

use crate::{
    foundation::core::Grid,
    foundation::error::{LxError, LxResult},
    output::kinet::{KINET_UDP_PORT, MAX_NODES_PER_PORT},
};

/// One physical network destination: a power/data supply address plus its output port number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortAddr {
    pub destination: SocketAddr,
    pub port: u8,
}

impl PortAddr {
    pub fn new(destination: SocketAddr, port: u8) -> Self {
        Self { destination, port }
    }

    /// Destination on the standard KiNET UDP port.
    pub fn kinet(host: IpAddr, port: u8) -> Self {
        Self::new(SocketAddr::new(host, KINET_UDP_PORT), port)
    }
}

/// Physical address of one fixture: its port and the node index on that port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeAddr {
    pub port: PortAddr,
    pub index: u16,
}

impl NodeAddr {
    pub fn new(port: PortAddr, index: u16) -> Self {
        Self { port, index }
    }
}

/// A mapped cell resolved to its slot in [`NodeMap::ports`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellTarget {
    pub port: usize,
    pub index: u16,
}

/// Immutable grid-cell to fixture assignment.
///
/// Ports are deduplicated in first-seen order; each carries `max index + 1` nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeMap {
    ports: Vec<PortAddr>,
    node_counts: Vec<usize>,
    cells: Vec<Option<CellTarget>>,
}

impl NodeMap {
    /// Build a map from one entry per grid cell; `None` leaves the cell unmapped.
    pub fn assign(grid: Grid, nodes: Vec<Option<NodeAddr>>) -> LxResult<Self> {
        if nodes.len() != grid.total() {
            return Err(LxError::configuration(format!(
                "node map has {} entries, grid has {} cells",
                nodes.len(),
                grid.total()
            )));
        }

        let mut ports: Vec<PortAddr> = Vec::new();
        let mut node_counts: Vec<usize> = Vec::new();
        let mut cells = Vec::with_capacity(nodes.len());
        for (cell, node) in nodes.into_iter().enumerate() {
            let Some(node) = node else {
                cells.push(None);
                continue;
            };
            if usize::from(node.index) >= MAX_NODES_PER_PORT {
                return Err(LxError::configuration(format!(
                    "cell {cell}: node index {} exceeds the {MAX_NODES_PER_PORT} nodes a port can carry",
                    node.index
                )));
            }
            let slot = match ports.iter().position(|p| *p == node.port) {
                Some(slot) => slot,
                None => {
                    ports.push(node.port);
                    node_counts.push(0);
                    ports.len() - 1
                }
            };
            node_counts[slot] = node_counts[slot].max(usize::from(node.index) + 1);
            cells.push(Some(CellTarget {
                port: slot,
                index: node.index,
            }));
        }

        Ok(Self {
            ports,
            node_counts,
            cells,
        })
    }

    /// Cell `i` drives node `i` of a single port.
    pub fn identity(grid: Grid, port: PortAddr) -> LxResult<Self> {
        let nodes = (0..grid.total())
            .map(|i| {
                u16::try_from(i)
                    .map(|index| Some(NodeAddr::new(port, index)))
                    .map_err(|_| LxError::configuration("grid too large for a single port"))
            })
            .collect::<LxResult<Vec<_>>>()?;
        Self::assign(grid, nodes)
    }

    /// Number of cells covered (equals the grid total).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn ports(&self) -> &[PortAddr] {
        &self.ports
    }

    /// Nodes carried by the port in `slot`, i.e. the highest assigned index plus one.
    pub fn node_count(&self, slot: usize) -> usize {
        self.node_counts.get(slot).copied().unwrap_or(0)
    }

    pub fn cells(&self) -> &[Option<CellTarget>] {
        &self.cells
    }

    pub fn get(&self, cell: usize) -> Option<CellTarget> {
        self.cells.get(cell).copied().flatten()
    }

    pub fn mapped(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/node_map.rs"]
mod tests;
