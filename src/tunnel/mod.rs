pub mod entities;
pub mod monitor;

pub use entities::{ClassCounts, TravelerClass};
pub use monitor::{BridgeEvent, BridgeEventKind, BridgeMonitor, BridgeObserver, BridgeSnapshot};
