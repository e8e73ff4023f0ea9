use std::{mem, sync::Arc};

use async_trait::async_trait;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use mail_message::{Address, Message};
use smtp_server::{reply, ConnectionMetadata, Decision};

use crate::{reconcile, report, Envelope, Error, Relay};

/// The only SASL mechanism offered
pub const PLAIN: &str = "PLAIN";

/// Subject given to messages that had to be wrapped
pub const FALLBACK_SUBJECT: &str = "(no subject)";

/// The single identity clients may authenticate as
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Transaction state of one connection.
///
/// Authentication survives resets. Sender and recipients belong to the
/// current transaction and are cleared by `reset` and by every `submit_data`
/// that got past its preconditions.
pub struct Session<R> {
    credentials: Arc<Credentials>,
    relay: Arc<R>,
    authenticated: bool,
    sender: Option<Address>,
    recipients: Vec<Address>,
}

/// Splits a PLAIN response into authorization identity, username and
/// password
fn decode_plain(payload: &[u8]) -> Result<(&str, &str, &str), Error> {
    let fields = payload
        .split(|b| *b == 0)
        .map(std::str::from_utf8)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::MalformedPlain)?;
    match fields[..] {
        [identity, username, password] => Ok((identity, username, password)),
        _ => Err(Error::MalformedPlain),
    }
}

/// Wraps a body that does not parse as a message in a minimal plain-text
/// header block
fn fallback(envelope: &Envelope, raw: &[u8]) -> Result<Message, Error> {
    let to = envelope
        .recipients
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut buf = format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n",
        envelope.sender, to, FALLBACK_SUBJECT
    )
    .into_bytes();
    buf.extend_from_slice(raw);
    Message::parse(&buf).map_err(Error::MessageFormat)
}

impl<R: Relay> Session<R> {
    pub fn new(credentials: Arc<Credentials>, relay: Arc<R>) -> Session<R> {
        Session {
            credentials,
            relay,
            authenticated: false,
            sender: None,
            recipients: Vec::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }

    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    pub fn authenticate(&mut self, mechanism: &str, payload: &[u8]) -> Result<(), Error> {
        if !mechanism.eq_ignore_ascii_case(PLAIN) {
            return Err(Error::UnsupportedMechanism(mechanism.to_owned()));
        }
        if self.authenticated {
            return Err(Error::Sequence("already authenticated"));
        }
        let (_identity, username, password) = decode_plain(payload)?;
        let user_ok = username
            .as_bytes()
            .ct_eq(self.credentials.username.as_bytes());
        let pass_ok = password
            .as_bytes()
            .ct_eq(self.credentials.password.as_bytes());
        if !bool::from(user_ok & pass_ok) {
            return Err(Error::InvalidCredentials);
        }
        self.authenticated = true;
        Ok(())
    }

    pub fn set_sender(&mut self, raw: &str) -> Result<(), Error> {
        if !self.authenticated {
            return Err(Error::AuthRequired);
        }
        if self.sender.is_some() {
            return Err(Error::Sequence("sender already specified"));
        }
        if !self.recipients.is_empty() {
            return Err(Error::Sequence(
                "bad sequence of commands: MAIL FROM after RCPT TO",
            ));
        }
        self.sender = Some(Address::parse(raw).map_err(Error::InvalidSender)?);
        Ok(())
    }

    pub fn add_recipient(&mut self, raw: &str) -> Result<(), Error> {
        if !self.authenticated {
            return Err(Error::AuthRequired);
        }
        if self.sender.is_none() {
            return Err(Error::Sequence(
                "bad sequence of commands: RCPT TO before MAIL FROM",
            ));
        }
        self.recipients
            .push(Address::parse(raw).map_err(Error::InvalidRecipient)?);
        Ok(())
    }

    /// Checks that a message may be submitted, without touching the state
    pub fn check_data(&self) -> Result<(), Error> {
        if !self.authenticated {
            return Err(Error::AuthRequired);
        }
        if self.sender.is_none() {
            return Err(Error::Sequence("sender not specified"));
        }
        if self.recipients.is_empty() {
            return Err(Error::Sequence("no recipients specified"));
        }
        Ok(())
    }

    /// Parses, reconciles and relays one message, in a single attempt for
    /// all the recipients
    pub async fn submit_data(&mut self, raw: &[u8]) -> Result<(), Error> {
        self.check_data()?;
        let envelope = match self.sender.take() {
            Some(sender) => Envelope {
                sender,
                recipients: mem::take(&mut self.recipients),
            },
            None => return Err(Error::Sequence("sender not specified")),
        };

        let mut message = match Message::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Message does not parse, wrapping it as plain text");
                fallback(&envelope, raw)?
            }
        };
        reconcile(&mut message, &envelope);

        self.relay
            .relay(&envelope, &message)
            .await
            .map_err(Error::Relay)?;
        info!(
            sender = %envelope.sender.addr,
            recipients = envelope.recipients.len(),
            "Message relayed"
        );
        Ok(())
    }

    pub fn reset(&mut self) {
        self.sender = None;
        self.recipients.clear();
    }

    pub fn logout(&mut self) {}
}

fn decide(
    res: Result<(), Error>,
    okay: smtp_message::Reply,
    conn_meta: &ConnectionMetadata,
) -> Decision {
    match res {
        Ok(()) => Decision::Accept { reply: okay },
        Err(e) => {
            report::error(&e, conn_meta);
            Decision::Reject { reply: e.reply() }
        }
    }
}

#[async_trait]
impl<R: Relay> smtp_server::Session for Session<R> {
    fn auth_mechanisms(&self) -> Vec<&'static str> {
        vec![PLAIN]
    }

    async fn auth(
        &mut self,
        mechanism: &str,
        payload: &[u8],
        conn_meta: &ConnectionMetadata,
    ) -> Decision {
        let res = self.authenticate(mechanism, payload);
        decide(res, reply::okay_auth(), conn_meta)
    }

    async fn filter_from(&mut self, path: &str, conn_meta: &ConnectionMetadata) -> Decision {
        let res = self.set_sender(path);
        decide(res, reply::okay_from(), conn_meta)
    }

    async fn filter_to(&mut self, path: &str, conn_meta: &ConnectionMetadata) -> Decision {
        let res = self.add_recipient(path);
        decide(res, reply::okay_to(), conn_meta)
    }

    async fn filter_data(&mut self, conn_meta: &ConnectionMetadata) -> Decision {
        let res = self.check_data();
        decide(res, reply::okay_data(), conn_meta)
    }

    async fn handle_mail(&mut self, data: Vec<u8>, conn_meta: &ConnectionMetadata) -> Decision {
        let res = self.submit_data(&data).await;
        decide(res, reply::okay_mail(), conn_meta)
    }

    async fn handle_rset(&mut self, _conn_meta: &ConnectionMetadata) -> Decision {
        self.reset();
        Decision::Accept {
            reply: reply::okay_rset(),
        }
    }

    async fn handle_quit(&mut self, _conn_meta: &ConnectionMetadata) -> Decision {
        self.logout();
        Decision::Accept {
            reply: reply::okay_quit(),
        }
    }
}
