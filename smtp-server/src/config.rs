use std::time::Duration;

use async_trait::async_trait;

use crate::{reply, ConnectionMetadata, Decision};

/// Server-wide settings, shared by every connection
#[async_trait]
pub trait Config: 'static + Send + Sync {
    type Session: Session;

    fn hostname(&self) -> &str;

    fn banner(&self) -> &str {
        "ESMTP Service ready"
    }

    fn max_message_bytes(&self) -> usize {
        10 * 1024 * 1024
    }

    /// Accepted recipients per transaction
    fn max_recipients(&self) -> usize {
        50
    }

    /// Longest accepted command line, line break included
    fn max_line_length(&self) -> usize {
        4096
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn write_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn new_session(&self, conn_meta: &ConnectionMetadata) -> Self::Session;
}

/// Per-connection hooks, called strictly in command arrival order.
///
/// The server only enforces framing and limits. Ordering between `MAIL`,
/// `RCPT` and `DATA`, as well as authentication, is up to the session.
#[async_trait]
pub trait Session: Send {
    /// Mechanisms advertised in the `EHLO` reply and accepted by `AUTH`
    fn auth_mechanisms(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// `payload` is the base64-decoded client response
    async fn auth(
        &mut self,
        mechanism: &str,
        payload: &[u8],
        conn_meta: &ConnectionMetadata,
    ) -> Decision;

    async fn filter_from(&mut self, path: &str, conn_meta: &ConnectionMetadata) -> Decision;

    async fn filter_to(&mut self, path: &str, conn_meta: &ConnectionMetadata) -> Decision;

    /// Called on `DATA`, before the `354` go-ahead
    async fn filter_data(&mut self, _conn_meta: &ConnectionMetadata) -> Decision {
        Decision::Accept {
            reply: reply::okay_data(),
        }
    }

    /// Receives the unescaped message, without the terminating dot
    async fn handle_mail(&mut self, data: Vec<u8>, conn_meta: &ConnectionMetadata) -> Decision;

    async fn handle_rset(&mut self, _conn_meta: &ConnectionMetadata) -> Decision {
        Decision::Accept {
            reply: reply::okay_rset(),
        }
    }

    /// Called on `QUIT`, and when the client goes away. The reply is only
    /// sent in the former case.
    async fn handle_quit(&mut self, _conn_meta: &ConnectionMetadata) -> Decision {
        Decision::Accept {
            reply: reply::okay_quit(),
        }
    }
}
