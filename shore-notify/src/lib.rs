//! Sink adapters (one per transport) and the dispatcher that builds
//! subject/body per event kind and fans out to resolved subscribers with
//! per-sink fault isolation.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod sink;
pub mod sinks;

pub use context::{DispatchContext, NotifyConfig, SmtpRelay};
pub use dispatcher::{AuxInputs, Dispatcher};
pub use error::SinkError;
pub use registry::SinkRegistry;
pub use sink::Sink;
