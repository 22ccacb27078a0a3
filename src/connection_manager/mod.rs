//! The live set of subscriber connections and fan-out to it.

mod registry;
mod stats;
mod types;

pub use registry::ConnectionManager;
pub use stats::ConnectionStats;
pub use types::{BroadcastResult, ConnectionHandle};
