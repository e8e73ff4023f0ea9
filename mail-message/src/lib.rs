mod address;
mod headers;
mod message;

pub use address::{parse_address_list, Address};
pub use headers::{canonical_key, Headers};
pub use message::Message;

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("address list contains no address")]
    EmptyAddressList,

    #[error("message is empty")]
    EmptyMessage,

    #[error("header block is not valid utf-8")]
    InvalidUtf8,

    #[error("malformed header line {0:?}")]
    MalformedHeader(String),

    #[error("continuation line before the first header")]
    UnexpectedContinuation,
}
