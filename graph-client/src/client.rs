use std::{io::Read, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    StatusCode,
};
use smol::{channel::Receiver, unblock};
use tracing::debug;

use mail_message::Message;

use crate::{cancellable, Error};

/// Longest error body kept from a failed answer
pub const MAX_ERROR_BODY: usize = 4 * 1024;

/// Wire form of `message` as the sendMail endpoint wants it: base64 of the
/// MIME text
pub fn encode(message: &Message) -> String {
    STANDARD.encode(message.to_bytes())
}

/// Blocking HTTP client with reqwest's default request timeout disabled.
/// Outbound calls are bounded by the shutdown signal only.
pub(crate) fn http_client() -> Result<reqwest::blocking::Client, Error> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(None::<Duration>)
        .build()?)
}

pub(crate) fn read_bounded<R: Read>(reader: R) -> Result<String, Error> {
    let mut buf = Vec::new();
    reader.take(MAX_ERROR_BODY as u64).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub struct Client {
    endpoint: String,
    http: reqwest::blocking::Client,
    shutdown: Receiver<()>,
}

impl Client {
    /// `endpoint` is the Graph root, eg. `https://graph.microsoft.com`
    pub fn new(endpoint: &str, shutdown: Receiver<()>) -> Result<Client, Error> {
        Ok(Client {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            http: http_client()?,
            shutdown,
        })
    }

    fn send_mail_url(&self, identity: &str) -> String {
        format!("{}/v1.0/users/{}/sendMail", self.endpoint, identity)
    }

    /// Makes one delivery attempt of an `encode`d message on behalf of
    /// `identity`. Only `202 Accepted` counts as success.
    pub async fn send(&self, token: &str, identity: &str, payload: String) -> Result<(), Error> {
        let url = self.send_mail_url(identity);
        let authorization = format!("Bearer {}", token);
        let http = self.http.clone();
        debug!(url = %url, bytes = payload.len(), "Posting to sendMail");
        cancellable(
            &self.shutdown,
            unblock(move || {
                let resp = http
                    .post(&url)
                    .header(AUTHORIZATION, authorization)
                    .header(CONTENT_TYPE, "text/plain")
                    .body(payload)
                    .send()?;
                let status = resp.status();
                if status == StatusCode::ACCEPTED {
                    return Ok(());
                }
                let body = read_bounded(resp)?;
                Err(Error::Status { status, body })
            }),
        )
        .await
    }
}
