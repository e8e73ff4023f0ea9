use smtp_message::Reply;

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept { reply: Reply },
    Reject { reply: Reply },
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept { .. })
    }

    pub fn into_reply(self) -> Reply {
        match self {
            Decision::Accept { reply } | Decision::Reject { reply } => reply,
        }
    }
}
