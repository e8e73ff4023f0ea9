use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("acquiring access token: {0}")]
    Token(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sendMail failed: {status}\n{body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("operation cancelled by shutdown")]
    Cancelled,

    #[error("reading response body: {0}")]
    Io(#[from] io::Error),
}
