use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyCode(pub [u8; 3]);

#[rustfmt::skip]
impl ReplyCode {
    pub const HELP_MESSAGE: ReplyCode = ReplyCode(*b"214");
    pub const SERVICE_READY: ReplyCode = ReplyCode(*b"220");
    pub const CLOSING_CHANNEL: ReplyCode = ReplyCode(*b"221");
    pub const AUTH_SUCCEEDED: ReplyCode = ReplyCode(*b"235");
    pub const OKAY: ReplyCode = ReplyCode(*b"250");
    pub const CANNOT_VRFY_BUT_PLEASE_TRY: ReplyCode = ReplyCode(*b"252");
    pub const AUTH_CONTINUE: ReplyCode = ReplyCode(*b"334");
    pub const START_MAIL_INPUT: ReplyCode = ReplyCode(*b"354");
    pub const SERVICE_NOT_AVAILABLE: ReplyCode = ReplyCode(*b"421");
    pub const LOCAL_ERROR: ReplyCode = ReplyCode(*b"451");
    pub const INSUFFICIENT_STORAGE: ReplyCode = ReplyCode(*b"452");
    pub const COMMAND_UNRECOGNIZED: ReplyCode = ReplyCode(*b"500");
    pub const SYNTAX_ERROR: ReplyCode = ReplyCode(*b"501");
    pub const COMMAND_UNIMPLEMENTED: ReplyCode = ReplyCode(*b"502");
    pub const BAD_SEQUENCE: ReplyCode = ReplyCode(*b"503");
    pub const PARAMETER_UNIMPLEMENTED: ReplyCode = ReplyCode(*b"504");
    pub const AUTH_REQUIRED: ReplyCode = ReplyCode(*b"530");
    pub const AUTH_FAILED: ReplyCode = ReplyCode(*b"535");
    pub const MAILBOX_UNAVAILABLE: ReplyCode = ReplyCode(*b"550");
    pub const POLICY_REASON: ReplyCode = ReplyCode(*b"550");
    pub const EXCEEDED_STORAGE: ReplyCode = ReplyCode(*b"552");
    pub const TRANSACTION_FAILED: ReplyCode = ReplyCode(*b"554");
}

impl ReplyCode {
    #[inline]
    pub fn code(&self) -> u16 {
        self.0[0] as u16 * 100 + self.0[1] as u16 * 10 + self.0[2] as u16 - b'0' as u16 * 111
    }

    /// 4xx and 5xx replies
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0[0] == b'4' || self.0[0] == b'5'
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EnhancedReplyCodeClass {
    Success = 2,
    PersistentTransient = 4,
    PermanentFailure = 5,
}

/// RFC 3463 enhanced status code, rendered as `class.subject.detail`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnhancedReplyCode {
    pub class: EnhancedReplyCodeClass,
    pub raw_subject: u16,
    pub raw_detail: u16,
}

macro_rules! extended_reply_codes {
    ($(($success:tt, $transient:tt, $permanent:tt, $subject:tt, $detail:tt),)*) => {
        $(
            extended_reply_codes!(@, Success, $success, $subject, $detail);
            extended_reply_codes!(@, PersistentTransient, $transient, $subject, $detail);
            extended_reply_codes!(@, PermanentFailure, $permanent, $subject, $detail);
        )*
    };

    (@, $class:ident, _, $subject:tt, $detail:tt) => {};

    (@, $class:ident, $name:ident, $subject:tt, $detail:tt) => {
        pub const $name: EnhancedReplyCode = EnhancedReplyCode {
            class: EnhancedReplyCodeClass::$class,
            raw_subject: $subject,
            raw_detail: $detail,
        };
    };
}

#[rustfmt::skip]
impl EnhancedReplyCode {
    extended_reply_codes!(
        (SUCCESS_UNDEFINED, TRANSIENT_UNDEFINED, PERMANENT_UNDEFINED, 0, 0),

        (_, _, PERMANENT_BAD_DEST_MAILBOX_SYNTAX, 1, 3),
        (_, _, PERMANENT_BAD_SENDER_MAILBOX_SYNTAX, 1, 7),

        (_, _, PERMANENT_DELIVERY_FAILED, 3, 0),
        (_, _, PERMANENT_MESSAGE_TOO_BIG, 3, 4),

        (_, TRANSIENT_BAD_CONNECTION, _, 4, 2),

        (_, _, PERMANENT_INVALID_COMMAND, 5, 1),
        (_, _, PERMANENT_SYNTAX_ERROR, 5, 2),
        (_, TRANSIENT_TOO_MANY_RECIPIENTS, PERMANENT_TOO_MANY_RECIPIENTS, 5, 3),
        (_, _, PERMANENT_INVALID_COMMAND_ARGUMENTS, 5, 4),
        (_, _, PERMANENT_LINE_TOO_LONG, 5, 6),

        (_, _, PERMANENT_CONVERSION_FAILED, 6, 0),

        (_, _, PERMANENT_AUTH_REQUIRED, 7, 0),
        (SUCCESS_AUTH_SUCCEEDED, _, _, 7, 0),
        (_, _, PERMANENT_AUTH_CREDENTIALS_INVALID, 7, 8),
    );
}

impl fmt::Display for EnhancedReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.class as u8, self.raw_subject, self.raw_detail
        )
    }
}

/// A possibly multi-line reply. Every line carries the same code and, if
/// set, the same enhanced code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub code: ReplyCode,
    pub ecode: Option<EnhancedReplyCode>,
    pub text: Vec<String>,
}

impl Reply {
    /// Builds a reply, splitting `text` on line breaks so that it can never
    /// inject raw protocol lines
    pub fn new<S: AsRef<str>>(code: ReplyCode, ecode: Option<EnhancedReplyCode>, text: S) -> Reply {
        let mut lines = text
            .as_ref()
            .split('\n')
            .map(|l| l.trim_end_matches('\r').replace('\r', " "))
            .collect::<Vec<_>>();
        while lines.len() > 1 && lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }
        Reply {
            code,
            ecode,
            text: lines,
        }
    }

    pub fn lines(code: ReplyCode, ecode: Option<EnhancedReplyCode>, text: Vec<String>) -> Reply {
        let text = if text.is_empty() {
            vec![String::new()]
        } else {
            text
        };
        Reply { code, ecode, text }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut res = Vec::new();
        let last = self.text.len().saturating_sub(1);
        for (i, line) in self.text.iter().enumerate() {
            res.extend_from_slice(&self.code.0);
            res.push(if i == last { b' ' } else { b'-' });
            if let Some(ecode) = self.ecode {
                res.extend_from_slice(ecode.to_string().as_bytes());
                if !line.is_empty() {
                    res.push(b' ');
                }
            }
            res.extend_from_slice(line.as_bytes());
            res.extend_from_slice(b"\r\n");
        }
        if self.text.is_empty() {
            res.extend_from_slice(&self.code.0);
            res.extend_from_slice(b" \r\n");
        }
        res
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_bytes()))
    }
}
