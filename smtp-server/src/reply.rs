use smtp_message::{EnhancedReplyCode, Reply, ReplyCode};

#[inline]
pub fn welcome_banner(hostname: &str, banner: &str) -> Reply {
    let mut text = String::from(hostname);
    if !banner.is_empty() {
        text += " ";
        text += banner;
    }
    Reply::new(ReplyCode::SERVICE_READY, None, text)
}

/// Reply to `HELO`/`EHLO`, listing extensions for the latter
pub fn okay_hello(
    is_ehlo: bool,
    local_hostname: &str,
    max_message_bytes: usize,
    auth_mechanisms: &[&str],
) -> Reply {
    let mut text = vec![String::from(local_hostname)];
    if is_ehlo {
        text.push("8BITMIME".into());
        text.push("ENHANCEDSTATUSCODES".into());
        text.push("SMTPUTF8".into());
        text.push(format!("SIZE {}", max_message_bytes));
        if !auth_mechanisms.is_empty() {
            text.push(format!("AUTH {}", auth_mechanisms.join(" ")));
        }
    }
    Reply::lines(ReplyCode::OKAY, None, text)
}

#[inline]
pub fn okay(ecode: EnhancedReplyCode) -> Reply {
    Reply::new(ReplyCode::OKAY, Some(ecode), "Okay")
}

/// Usual value for returning “Okay” from `filter_from`
#[inline]
pub fn okay_from() -> Reply {
    okay(EnhancedReplyCode::SUCCESS_UNDEFINED)
}

/// Usual value for returning “Okay” from `filter_to`
#[inline]
pub fn okay_to() -> Reply {
    okay(EnhancedReplyCode::SUCCESS_UNDEFINED)
}

/// Usual value for returning “Okay” from `filter_data`
#[inline]
pub fn okay_data() -> Reply {
    Reply::new(
        ReplyCode::START_MAIL_INPUT,
        None,
        "Start mail input; end with <CRLF>.<CRLF>",
    )
}

/// Usual value for returning “Okay” from `handle_mail`
#[inline]
pub fn okay_mail() -> Reply {
    okay(EnhancedReplyCode::SUCCESS_UNDEFINED)
}

#[inline]
pub fn okay_rset() -> Reply {
    okay(EnhancedReplyCode::SUCCESS_UNDEFINED)
}

#[inline]
pub fn okay_noop() -> Reply {
    okay(EnhancedReplyCode::SUCCESS_UNDEFINED)
}

#[inline]
pub fn okay_quit() -> Reply {
    Reply::new(
        ReplyCode::CLOSING_CHANNEL,
        Some(EnhancedReplyCode::SUCCESS_UNDEFINED),
        "Bye",
    )
}

#[inline]
pub fn okay_auth() -> Reply {
    Reply::new(
        ReplyCode::AUTH_SUCCEEDED,
        Some(EnhancedReplyCode::SUCCESS_AUTH_SUCCEEDED),
        "Authentication succeeded",
    )
}

/// Empty `334` challenge asking for the client's response
#[inline]
pub fn auth_continue() -> Reply {
    Reply::new(ReplyCode::AUTH_CONTINUE, None, "")
}

#[inline]
pub fn auth_cancelled() -> Reply {
    Reply::new(
        ReplyCode::SYNTAX_ERROR,
        Some(EnhancedReplyCode::PERMANENT_UNDEFINED),
        "Authentication cancelled",
    )
}

#[inline]
pub fn auth_invalid_base64() -> Reply {
    Reply::new(
        ReplyCode::SYNTAX_ERROR,
        Some(EnhancedReplyCode::PERMANENT_SYNTAX_ERROR),
        "Invalid base64 data",
    )
}

#[inline]
pub fn auth_mechanism_unsupported() -> Reply {
    Reply::new(
        ReplyCode::PARAMETER_UNIMPLEMENTED,
        Some(EnhancedReplyCode::PERMANENT_INVALID_COMMAND_ARGUMENTS),
        "Unsupported authentication mechanism",
    )
}

#[inline]
pub fn hello_first() -> Reply {
    Reply::new(
        ReplyCode::BAD_SEQUENCE,
        Some(EnhancedReplyCode::PERMANENT_INVALID_COMMAND),
        "Please introduce yourself first",
    )
}

#[inline]
pub fn invalid_size() -> Reply {
    Reply::new(
        ReplyCode::SYNTAX_ERROR,
        Some(EnhancedReplyCode::PERMANENT_INVALID_COMMAND_ARGUMENTS),
        "Invalid SIZE parameter",
    )
}

#[inline]
pub fn message_too_big() -> Reply {
    Reply::new(
        ReplyCode::EXCEEDED_STORAGE,
        Some(EnhancedReplyCode::PERMANENT_MESSAGE_TOO_BIG),
        "Maximum message size exceeded",
    )
}

#[inline]
pub fn too_many_recipients() -> Reply {
    Reply::new(
        ReplyCode::INSUFFICIENT_STORAGE,
        Some(EnhancedReplyCode::TRANSIENT_TOO_MANY_RECIPIENTS),
        "Too many recipients",
    )
}

#[inline]
pub fn command_unimplemented() -> Reply {
    Reply::new(
        ReplyCode::COMMAND_UNIMPLEMENTED,
        Some(EnhancedReplyCode::PERMANENT_INVALID_COMMAND),
        "Command not implemented",
    )
}

#[inline]
pub fn command_unrecognized() -> Reply {
    Reply::new(
        ReplyCode::COMMAND_UNRECOGNIZED,
        Some(EnhancedReplyCode::PERMANENT_INVALID_COMMAND),
        "Command not recognized",
    )
}

#[inline]
pub fn line_too_long() -> Reply {
    Reply::new(
        ReplyCode::COMMAND_UNRECOGNIZED,
        Some(EnhancedReplyCode::PERMANENT_LINE_TOO_LONG),
        "Line too long",
    )
}

#[inline]
pub fn read_timeout() -> Reply {
    Reply::new(
        ReplyCode::SERVICE_NOT_AVAILABLE,
        Some(EnhancedReplyCode::TRANSIENT_BAD_CONNECTION),
        "Idle timeout, bye bye",
    )
}

#[inline]
pub fn internal_server_error() -> Reply {
    Reply::new(
        ReplyCode::LOCAL_ERROR,
        Some(EnhancedReplyCode::TRANSIENT_UNDEFINED),
        "Internal server error",
    )
}
