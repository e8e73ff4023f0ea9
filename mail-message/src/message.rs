use std::str;

use crate::{headers::is_valid_key, Headers, ParseError};

/// A message as a header block plus an opaque body
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Splits the next line off `buf`, returning it without its line break
/// along with the offset of the following line, or `None` at end of input
fn next_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    if start >= buf.len() {
        return None;
    }
    let rest = &buf[start..];
    match rest.iter().position(|b| *b == b'\n') {
        Some(nl) => {
            let line = &rest[..nl];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            Some((line, start + nl + 1))
        }
        None => Some((rest, buf.len())),
    }
}

impl Message {
    pub fn new(headers: Headers, body: Vec<u8>) -> Message {
        Message { headers, body }
    }

    /// Parses a header block followed by a body.
    ///
    /// The header block ends at the first empty line, or at the end of the
    /// input provided at least one header was read. Folded lines are joined
    /// with a single space. The body is kept verbatim.
    pub fn parse(buf: &[u8]) -> Result<Message, ParseError> {
        if buf.is_empty() {
            return Err(ParseError::EmptyMessage);
        }

        let mut headers = Headers::new();
        let mut current: Option<(String, String)> = None;
        let mut pos = 0;
        let mut body_start = buf.len();

        while let Some((line, next)) = next_line(buf, pos) {
            pos = next;
            if line.is_empty() {
                body_start = next;
                break;
            }
            let line = str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;

            if line.starts_with(' ') || line.starts_with('\t') {
                match current {
                    Some((_, ref mut value)) => {
                        let cont = line.trim();
                        if !cont.is_empty() {
                            if !value.is_empty() {
                                value.push(' ');
                            }
                            value.push_str(cont);
                        }
                    }
                    None => return Err(ParseError::UnexpectedContinuation),
                }
                continue;
            }

            let colon = line
                .find(':')
                .ok_or_else(|| ParseError::MalformedHeader(line.to_owned()))?;
            let key = &line[..colon];
            if !is_valid_key(key) {
                return Err(ParseError::MalformedHeader(line.to_owned()));
            }
            if let Some((k, v)) = current.take() {
                headers.append(&k, v);
            }
            current = Some((key.to_owned(), line[colon + 1..].trim().to_owned()));
        }

        if let Some((k, v)) = current.take() {
            headers.append(&k, v);
        }

        Ok(Message {
            headers,
            body: buf[body_start..].to_vec(),
        })
    }

    /// Wire form: one `Key: Value` line per value, a blank line, the body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(self.body.len() + 64 * self.headers.len());
        for (key, values) in self.headers.iter() {
            for v in values {
                res.extend_from_slice(key.as_bytes());
                res.extend_from_slice(b": ");
                res.extend_from_slice(v.as_bytes());
                res.extend_from_slice(b"\r\n");
            }
        }
        res.extend_from_slice(b"\r\n");
        res.extend_from_slice(&self.body);
        res
    }
}
