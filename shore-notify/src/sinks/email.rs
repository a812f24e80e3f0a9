//! SMTP email sink: plain text, or multipart alternative plain+html when the
//! endpoint requests `format: html` (§4.6).

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use shore_subscriptions::Endpoint;

use crate::context::{DispatchContext, NotifyConfig};
use crate::error::SinkError;
use crate::sink::{require_field, Sink};

const LOCAL_FROM: &str = "shore-monitor@localhost";

pub struct EmailSink;

#[async_trait]
impl Sink for EmailSink {
    async fn send(
        &self,
        config: &NotifyConfig,
        endpoint: &Endpoint,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), SinkError> {
        let address = require_field(endpoint, "address")?;
        let to: Mailbox = address
            .parse()
            .map_err(|e| SinkError::Transport(format!("invalid address {address}: {e}")))?;
        let from: Mailbox = LOCAL_FROM.parse().expect("constant address is valid");

        let format = endpoint.field_str("format").unwrap_or("plain");
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(ctx.subject)
            .header(lettre::message::header::ContentTransferEncoding::SevenBit);

        let message = if format == "html" {
            let html_body = ctx
                .body
                .lines()
                .map(|line| format!("<p>{line}</p>"))
                .collect::<String>();
            message
                .multipart(
                    MultiPart::alternative()
                        .singlepart(SinglePart::plain(ctx.body.to_string()))
                        .singlepart(SinglePart::html(html_body)),
                )
                .map_err(SinkError::from)?
        } else {
            message
                .singlepart(SinglePart::plain(ctx.body.to_string()))
                .map_err(SinkError::from)?
        };

        let transport = match &config.smtp_relay {
            Some(relay) => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&relay.host)
                .map_err(SinkError::from)?
                .port(587)
                .credentials(lettre::transport::smtp::authentication::Credentials::new(
                    relay.username.clone(),
                    relay.password.clone(),
                ))
                .timeout(Some(config.http_timeout))
                .build(),
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("localhost")
                .port(25)
                .timeout(Some(config.http_timeout))
                .build(),
        };

        transport.send(message).await.map_err(SinkError::from)?;
        Ok(())
    }
}
