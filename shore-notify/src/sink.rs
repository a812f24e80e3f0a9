//! The sink capability interface (§9 design notes): one implementation per
//! transport, dispatched through a trait object instead of a name→function
//! table. Adding a new sink is one [`shore_subscriptions::SinkKind`] variant
//! plus one implementation of this trait.

use async_trait::async_trait;
use shore_subscriptions::Endpoint;

use crate::context::{DispatchContext, NotifyConfig};
use crate::error::SinkError;

#[async_trait]
pub trait Sink: Send + Sync {
    /// Validates shape, performs exactly one bounded-timeout transport
    /// attempt, and never panics. Per-sink faults are represented as `Err`
    /// so the dispatcher can log and isolate them (§4.6).
    async fn send(
        &self,
        config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError>;
}

pub(crate) fn require_field<'a>(endpoint: &'a Endpoint, key: &'static str) -> Result<&'a str, SinkError> {
    endpoint.field_str(key).ok_or(SinkError::MissingField(key))
}
