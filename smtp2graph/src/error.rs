use smtp_message::{EnhancedReplyCode, Reply, ReplyCode};

/// Everything a session handler can refuse a command with
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication required")]
    AuthRequired,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("malformed PLAIN response")]
    MalformedPlain,

    #[error("unsupported authentication mechanism {0:?}")]
    UnsupportedMechanism(String),

    #[error("{0}")]
    Sequence(&'static str),

    #[error("invalid sender address")]
    InvalidSender(#[source] mail_message::ParseError),

    #[error("invalid recipient address")]
    InvalidRecipient(#[source] mail_message::ParseError),

    #[error("invalid message format")]
    MessageFormat(#[source] mail_message::ParseError),

    /// Carries the relay's cause chain, rendered as is
    #[error("{0:#}")]
    Relay(anyhow::Error),
}

impl Error {
    /// Short machine-friendly name, used when reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthRequired => "auth_required",
            Error::InvalidCredentials => "invalid_credentials",
            Error::MalformedPlain => "malformed_plain",
            Error::UnsupportedMechanism(_) => "unsupported_mechanism",
            Error::Sequence(_) => "sequence",
            Error::InvalidSender(_) => "invalid_sender",
            Error::InvalidRecipient(_) => "invalid_recipient",
            Error::MessageFormat(_) => "message_format",
            Error::Relay(_) => "relay",
        }
    }

    pub fn reply(&self) -> Reply {
        let (code, ecode) = match self {
            Error::AuthRequired => (
                ReplyCode::AUTH_REQUIRED,
                EnhancedReplyCode::PERMANENT_AUTH_REQUIRED,
            ),
            Error::InvalidCredentials | Error::MalformedPlain => (
                ReplyCode::AUTH_FAILED,
                EnhancedReplyCode::PERMANENT_AUTH_CREDENTIALS_INVALID,
            ),
            Error::UnsupportedMechanism(_) => (
                ReplyCode::PARAMETER_UNIMPLEMENTED,
                EnhancedReplyCode::PERMANENT_INVALID_COMMAND_ARGUMENTS,
            ),
            Error::Sequence(_) => (
                ReplyCode::BAD_SEQUENCE,
                EnhancedReplyCode::PERMANENT_INVALID_COMMAND,
            ),
            Error::InvalidSender(_) => (
                ReplyCode::MAILBOX_UNAVAILABLE,
                EnhancedReplyCode::PERMANENT_BAD_SENDER_MAILBOX_SYNTAX,
            ),
            Error::InvalidRecipient(_) => (
                ReplyCode::MAILBOX_UNAVAILABLE,
                EnhancedReplyCode::PERMANENT_BAD_DEST_MAILBOX_SYNTAX,
            ),
            Error::MessageFormat(_) => (
                ReplyCode::MAILBOX_UNAVAILABLE,
                EnhancedReplyCode::PERMANENT_CONVERSION_FAILED,
            ),
            Error::Relay(_) => (
                ReplyCode::TRANSACTION_FAILED,
                EnhancedReplyCode::PERMANENT_DELIVERY_FAILED,
            ),
        };
        Reply::new(code, Some(ecode), self.to_string())
    }
}
