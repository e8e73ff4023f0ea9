use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::info;

use smtp_server::ConnectionMetadata;

use crate::{Credentials, Opt, Relay, Session};

pub struct ServerConfig<R> {
    pub domain: String,
    pub max_message_bytes: usize,
    pub max_recipients: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub credentials: Arc<Credentials>,
    pub relay: Arc<R>,
}

impl<R: Relay> ServerConfig<R> {
    pub fn new(opt: &Opt, relay: R) -> ServerConfig<R> {
        ServerConfig {
            domain: opt.domain.clone(),
            max_message_bytes: opt.max_message_bytes,
            max_recipients: opt.max_recipients,
            read_timeout: opt.read_timeout,
            write_timeout: opt.write_timeout,
            credentials: Arc::new(Credentials {
                username: opt.sender_email.clone(),
                password: opt.sender_password.clone(),
            }),
            relay: Arc::new(relay),
        }
    }
}

#[async_trait]
impl<R: Relay> smtp_server::Config for ServerConfig<R> {
    type Session = Session<R>;

    fn hostname(&self) -> &str {
        &self.domain
    }

    fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    fn max_recipients(&self) -> usize {
        self.max_recipients
    }

    fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    async fn new_session(&self, conn_meta: &ConnectionMetadata) -> Session<R> {
        info!(peer = ?conn_meta.peer_addr, "New connection");
        Session::new(self.credentials.clone(), self.relay.clone())
    }
}
