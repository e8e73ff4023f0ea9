use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use graph_client::{encode, Client, TokenCache, TokenSource};
use mail_message::Message;

use crate::Envelope;

/// Something able to deliver a reconciled message to all the envelope
/// recipients at once
#[async_trait]
pub trait Relay: 'static + Send + Sync {
    async fn relay(&self, envelope: &Envelope, message: &Message) -> anyhow::Result<()>;
}

/// Relays through the Graph `sendMail` endpoint, on behalf of one mailbox
pub struct GraphRelay<S> {
    tokens: TokenCache<S>,
    client: Client,
    identity: String,
}

impl<S: TokenSource> GraphRelay<S> {
    pub fn new(tokens: TokenCache<S>, client: Client, identity: String) -> GraphRelay<S> {
        GraphRelay {
            tokens,
            client,
            identity,
        }
    }
}

#[async_trait]
impl<S: TokenSource> Relay for GraphRelay<S> {
    async fn relay(&self, envelope: &Envelope, message: &Message) -> anyhow::Result<()> {
        let payload = encode(message);
        let token = self
            .tokens
            .get_token()
            .await
            .context("Getting an access token")?;
        debug!(
            identity = %self.identity,
            recipients = envelope.recipients.len(),
            bytes = payload.len(),
            "Relaying message"
        );
        self.client
            .send(&token, &self.identity, payload)
            .await
            .context("Sending through Graph")
    }
}
