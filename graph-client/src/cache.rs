use chrono::{Duration, Utc};
use smol::lock::Mutex;
use tracing::debug;

use crate::{AccessToken, Error, TokenSource};

/// Scope granting the application permissions configured for Microsoft Graph
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// A cached token is refreshed this long before it actually expires
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Process-wide bearer token, refreshed on demand.
///
/// The lock is held across the refresh, so concurrent callers wait for a
/// single request to the token source instead of racing their own. A failed
/// refresh leaves the cache untouched and the next call tries again.
pub struct TokenCache<S> {
    source: S,
    scope: String,
    cached: Mutex<Option<AccessToken>>,
}

impl<S: TokenSource> TokenCache<S> {
    pub fn new(source: S) -> TokenCache<S> {
        TokenCache::with_scope(source, GRAPH_SCOPE)
    }

    pub fn with_scope(source: S, scope: &str) -> TokenCache<S> {
        TokenCache {
            source,
            scope: scope.to_owned(),
            cached: Mutex::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<String, Error> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(ref tok) = *cached {
            if !tok.token.is_empty() && now <= tok.expires_on - Duration::seconds(EXPIRY_SKEW_SECS) {
                return Ok(tok.token.clone());
            }
        }

        debug!(scope = %self.scope, "Refreshing the cached access token");
        let fresh = self.source.get_token(&[self.scope.as_str()]).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
