use std::io;

use futures::{AsyncBufRead, AsyncBufReadExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    /// `buf` holds a full line, line break included
    Complete,

    /// The line went over the limit. It was consumed up to its line break
    /// and dropped.
    TooLong,

    /// End of stream. A trailing unterminated line is dropped.
    Eof,
}

/// Reads the next `\n`-terminated line into `buf`, never buffering more than
/// `max_len` bytes
pub async fn next_crlf_line<R>(reader: &mut R, buf: &mut Vec<u8>, max_len: usize) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut too_long = false;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            buf.clear();
            return Ok(Line::Eof);
        }
        let (used, done) = match available.iter().position(|b| *b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        if !too_long {
            if buf.len() + used > max_len {
                too_long = true;
                buf.clear();
            } else {
                buf.extend_from_slice(&available[..used]);
            }
        }
        reader.consume_unpin(used);
        if done {
            return Ok(if too_long { Line::TooLong } else { Line::Complete });
        }
    }
}
