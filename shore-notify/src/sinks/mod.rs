pub mod chat_webhook;
pub mod email;
pub mod http_post;
pub mod push;
pub mod satellite;

pub use chat_webhook::{ChatWebhookASink, ChatWebhookBSink};
pub use email::EmailSink;
pub use http_post::HttpPostSink;
pub use push::PushSink;
pub use satellite::SatelliteSink;
