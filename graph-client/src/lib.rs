mod cache;
mod cancel;
mod client;
mod error;
mod token;

#[cfg(any(test, feature = "test-util"))]
pub mod test_server;

pub use cache::{TokenCache, EXPIRY_SKEW_SECS, GRAPH_SCOPE};
pub use cancel::cancellable;
pub use client::{encode, Client, MAX_ERROR_BODY};
pub use error::Error;
pub use token::{AccessToken, ClientSecretCredential, TokenSource};

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.microsoft.com";
