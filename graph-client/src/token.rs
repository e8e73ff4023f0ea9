use std::{fmt, io::Read};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use smol::{channel::Receiver, unblock};
use tracing::debug;

use crate::{
    cancellable,
    client::{http_client, read_bounded},
    Error,
};

/// Lifetime assumed when the identity provider does not say
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Anything able to mint bearer tokens for a set of scopes
#[async_trait]
pub trait TokenSource: 'static + Send + Sync {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, Error>;
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth2 client-credentials grant against the Microsoft identity platform
pub struct ClientSecretCredential {
    authority: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    http: reqwest::blocking::Client,
    shutdown: Receiver<()>,
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl ClientSecretCredential {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        shutdown: Receiver<()>,
    ) -> Result<ClientSecretCredential, Error> {
        Ok(ClientSecretCredential {
            authority: authority.trim_end_matches('/').to_owned(),
            tenant_id: tenant_id.to_owned(),
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            http: http_client()?,
            shutdown,
        })
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id)
    }
}

#[async_trait]
impl TokenSource for ClientSecretCredential {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken, Error> {
        let url = self.token_url();
        debug!(url = %url, "Requesting an access token");
        let form = vec![
            ("grant_type", "client_credentials".to_owned()),
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("scope", scopes.join(" ")),
        ];
        let http = self.http.clone();
        let requested_at = Utc::now();
        let resp: TokenResponse = cancellable(
            &self.shutdown,
            unblock(move || {
                let resp = http.post(&url).form(&form).send()?;
                let status = resp.status();
                if !status.is_success() {
                    let body = read_bounded(resp)?;
                    return Err(Error::Token(format!(
                        "token endpoint answered {}\n{}",
                        status, body
                    )));
                }
                let mut body = Vec::new();
                resp.take(1024 * 1024).read_to_end(&mut body)?;
                serde_json::from_slice(&body)
                    .map_err(|e| Error::Token(format!("parsing token response: {}", e)))
            }),
        )
        .await?;

        let expires_in = resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        debug!(expires_in, "Got an access token");
        Ok(AccessToken {
            token: resp.access_token,
            expires_on: requested_at + Duration::seconds(expires_in),
        })
    }
}
