/// One line of a `DATA` payload, as read off the wire
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataLine<'a> {
    /// The lone `.` terminating the payload
    End,

    /// A content line with its escaping dot removed. The line break is kept.
    Line(&'a [u8]),
}

/// Classifies a `DATA` line (line break included) and removes the leading
/// dot that RFC 5321 section 4.5.2 requires on lines starting with a dot.
///
/// A bare LF is accepted as a line break, matching what the command reader
/// tolerates.
pub fn unescape_data_line(line: &[u8]) -> DataLine {
    match line {
        b".\r\n" | b".\n" | b"." => DataLine::End,
        [b'.', rest @ ..] => DataLine::Line(rest),
        _ => DataLine::Line(line),
    }
}
