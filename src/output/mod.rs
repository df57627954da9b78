//! Grid-to-fixture mapping and the rate-limited KiNET network output.

pub mod kinet;
pub mod node_map;
pub mod throttle;

pub use kinet::{KINET_UDP_PORT, Port, PortOut};
pub use node_map::{CellTarget, NodeAddr, NodeMap, PortAddr};
pub use throttle::{DEFAULT_FRAMERATE, DatagramSink, OutputStats, ThrottledOutput};
