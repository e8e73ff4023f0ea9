mod command;
mod data;
mod reply;

pub use command::{Command, Parameters, ParseError};
pub use data::{unescape_data_line, DataLine};
pub use reply::{EnhancedReplyCode, EnhancedReplyCodeClass, Reply, ReplyCode};
