//! Layered subscription configuration: load three optional YAML documents,
//! deep-merge them, canonicalize the result, and resolve per-event dispatch
//! targets from it.

pub mod canonicalize;
pub mod error;
pub mod load;
pub mod merge;
pub mod model;
pub mod resolve;

pub use canonicalize::canonicalize;
pub use error::ConfigError;
pub use load::{load, ConfigLayers};
pub use model::{Endpoint, SinkKind, SubscriptionTable, User};
pub use resolve::{resolve, DispatchItem};
