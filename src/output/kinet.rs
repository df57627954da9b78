//! KiNET v1 PORTOUT encoding.
//!
//! Layout (all multi-byte fields little-endian):
//!
//! ```text
//! 04 01 dc 4a   magic
//! 01 00         version
//! 08 01         packet type (PORTOUT)
//! 00 00 00 00   sequence
//! ff ff ff ff   universe
//! PP            output port number
//! 00            pad
//! 00 00         flags
//! LL LL         payload length
//! 00 00         start code
//! [R G B]*      one group per node
//! ```

use crate::{
    foundation::error::{LxError, LxResult},
    output::node_map::PortAddr,
};

pub const KINET_UDP_PORT: u16 = 6038;
pub const KINET_MAGIC: [u8; 4] = [0x04, 0x01, 0xdc, 0x4a];
pub const KINET_VERSION: [u8; 2] = [0x01, 0x00];
pub const KINET_PORTOUT: [u8; 2] = [0x08, 0x01];
pub const HEADER_LEN: usize = 24;

/// Largest UDP payload an IPv4 datagram can carry.
pub const MAX_DATAGRAM_LEN: usize = 65_507;

/// Largest node count whose packet still fits in one IPv4 UDP datagram.
pub const MAX_NODES_PER_PORT: usize = (MAX_DATAGRAM_LEN - HEADER_LEN) / 3;

const PORT_OFFSET: usize = 16;
const LENGTH_OFFSET: usize = 20;

/// A decoded PORTOUT datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortOut {
    pub port: u8,
    pub nodes: Vec<[u8; 3]>,
}

/// Per-port node buffer. Nodes never written stay black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Port {
    addr: PortAddr,
    rgb: Vec<u8>,
}

impl Port {
    pub fn new(addr: PortAddr, node_count: usize) -> Self {
        Self {
            addr,
            rgb: vec![0; node_count.min(MAX_NODES_PER_PORT) * 3],
        }
    }

    pub fn addr(&self) -> PortAddr {
        self.addr
    }

    pub fn node_count(&self) -> usize {
        self.rgb.len() / 3
    }

    /// Out-of-range indices are ignored.
    pub fn set_node(&mut self, index: u16, rgb: [u8; 3]) {
        let at = usize::from(index) * 3;
        if let Some(dst) = self.rgb.get_mut(at..at + 3) {
            dst.copy_from_slice(&rgb);
        }
    }

    pub fn node(&self, index: u16) -> Option<[u8; 3]> {
        let at = usize::from(index) * 3;
        let src = self.rgb.get(at..at + 3)?;
        Some([src[0], src[1], src[2]])
    }

    /// Serialize into `out`, replacing its contents.
    pub fn write_packet(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(HEADER_LEN + self.rgb.len());
        out.extend_from_slice(&KINET_MAGIC);
        out.extend_from_slice(&KINET_VERSION);
        out.extend_from_slice(&KINET_PORTOUT);
        out.extend_from_slice(&[0x00; 4]);
        out.extend_from_slice(&[0xff; 4]);
        out.push(self.addr.port);
        out.push(0x00);
        out.extend_from_slice(&[0x00; 2]);
        // `new` caps the node count, so the length always fits in 16 bits.
        let len = u16::try_from(self.rgb.len()).unwrap_or(u16::MAX);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&[0x00; 2]);
        out.extend_from_slice(&self.rgb);
    }

    pub fn packet(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_packet(&mut out);
        out
    }

    /// Parse a PORTOUT datagram back into its port number and RGB groups.
    pub fn decode_payload(datagram: &[u8]) -> LxResult<PortOut> {
        if datagram.len() < HEADER_LEN {
            return Err(LxError::invalid_input(format!(
                "datagram is {} bytes, header needs {HEADER_LEN}",
                datagram.len()
            )));
        }
        if datagram[0..4] != KINET_MAGIC {
            return Err(LxError::invalid_input("bad KiNET magic"));
        }
        if datagram[6..8] != KINET_PORTOUT {
            return Err(LxError::invalid_input("not a PORTOUT packet"));
        }
        let declared =
            usize::from(u16::from_le_bytes([datagram[LENGTH_OFFSET], datagram[LENGTH_OFFSET + 1]]));
        let payload = &datagram[HEADER_LEN..];
        if payload.len() != declared || declared % 3 != 0 {
            return Err(LxError::invalid_input(format!(
                "payload is {} bytes, header declares {declared}",
                payload.len()
            )));
        }
        Ok(PortOut {
            port: datagram[PORT_OFFSET],
            nodes: payload
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/kinet.rs"]
mod tests;
