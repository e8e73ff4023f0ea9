use std::str;

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_till, take_till1, take_while1},
    character::complete::{char, space0, space1},
    combinator::{all_consuming, eof, map, opt, rest, value, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("command line is not terminated by a line break")]
    MissingLineBreak,

    #[error("command line is not valid utf-8")]
    InvalidUtf8,

    #[error("command not recognized")]
    Unrecognized,
}

/// ESMTP parameters of a `MAIL FROM` or `RCPT TO` command, in the order they
/// were given
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Parameters(pub Vec<(String, Option<String>)>);

impl Parameters {
    /// Case-insensitive lookup; `Some(None)` is a parameter given without a
    /// value
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_deref())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Auth {
        mechanism: String,
        initial_response: Option<String>,
    }, // AUTH <mechanism> [<initial-response>] <CRLF>
    Data,                                       // DATA <CRLF>
    Ehlo { hostname: String },                  // EHLO <domain> <CRLF>
    Expn { name: String },                      // EXPN <name> <CRLF>
    Helo { hostname: String },                  // HELO <domain> <CRLF>
    Help { subject: String },                   // HELP [<subject>] <CRLF>
    Mail { path: String, params: Parameters },  // MAIL FROM:<path> [SP <mail-parameters>] <CRLF>
    Noop { string: String },                    // NOOP [<string>] <CRLF>
    Quit,                                       // QUIT <CRLF>
    Rcpt { path: String, params: Parameters },  // RCPT TO:<path> [SP <rcpt-parameters>] <CRLF>
    Rset,                                       // RSET <CRLF>
    Starttls,                                   // STARTTLS <CRLF>
    Vrfy { name: String },                      // VRFY <name> <CRLF>
}

impl Command {
    /// Parses one command line, which must still carry its line break (CRLF,
    /// though a bare LF is tolerated)
    pub fn parse(line: &[u8]) -> Result<Command, ParseError> {
        let line = strip_line_break(line).ok_or(ParseError::MissingLineBreak)?;
        let line = str::from_utf8(line).map_err(|_| ParseError::InvalidUtf8)?;
        all_consuming(command)(line)
            .map(|(_, cmd)| cmd)
            .map_err(|_| ParseError::Unrecognized)
    }
}

fn strip_line_break(line: &[u8]) -> Option<&[u8]> {
    let line = line.strip_suffix(b"\n")?;
    Some(line.strip_suffix(b"\r").unwrap_or(line))
}

fn command(i: &str) -> IResult<&str, Command> {
    alt((
        map(preceded(tag_no_case("AUTH "), auth_args), |(m, r)| {
            Command::Auth {
                mechanism: m.to_ascii_uppercase(),
                initial_response: r.map(str::to_owned),
            }
        }),
        value(Command::Data, terminated(tag_no_case("DATA"), space0)),
        map(preceded(tag_no_case("EHLO "), word), |h| Command::Ehlo {
            hostname: h.to_owned(),
        }),
        map(preceded(tag_no_case("EXPN "), trimmed_rest), |n| {
            Command::Expn { name: n.to_owned() }
        }),
        map(preceded(tag_no_case("HELO "), word), |h| Command::Helo {
            hostname: h.to_owned(),
        }),
        map(preceded(tag_no_case("HELP"), opt_text), |s| Command::Help {
            subject: s.to_owned(),
        }),
        map(
            preceded(tag_no_case("MAIL FROM:"), path_and_params),
            |(path, params)| Command::Mail { path, params },
        ),
        map(preceded(tag_no_case("NOOP"), opt_text), |s| Command::Noop {
            string: s.to_owned(),
        }),
        value(Command::Quit, terminated(tag_no_case("QUIT"), space0)),
        map(
            preceded(tag_no_case("RCPT TO:"), path_and_params),
            |(path, params)| Command::Rcpt { path, params },
        ),
        value(Command::Rset, terminated(tag_no_case("RSET"), space0)),
        value(Command::Starttls, terminated(tag_no_case("STARTTLS"), space0)),
        map(preceded(tag_no_case("VRFY "), trimmed_rest), |n| {
            Command::Vrfy { name: n.to_owned() }
        }),
    ))(i)
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn word(i: &str) -> IResult<&str, &str> {
    delimited(space0, take_till1(is_space), space0)(i)
}

fn trimmed_rest(i: &str) -> IResult<&str, &str> {
    map(rest, str::trim)(i)
}

fn opt_text(i: &str) -> IResult<&str, &str> {
    alt((preceded(char(' '), trimmed_rest), map(eof, |_| "")))(i)
}

fn auth_args(i: &str) -> IResult<&str, (&str, Option<&str>)> {
    map(
        tuple((
            preceded(
                space0,
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            ),
            opt(preceded(space1, take_till1(is_space))),
            space0,
        )),
        |(mechanism, initial, _)| (mechanism, initial),
    )(i)
}

fn path(i: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('<'), take_till(|c| c == '>'), char('>')),
        verify(take_till1(is_space), |p: &str| !p.starts_with('<')),
    ))(i)
}

fn parameter(i: &str) -> IResult<&str, (String, Option<String>)> {
    map(
        pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-'),
            opt(preceded(char('='), take_till1(is_space))),
        ),
        |(k, v): (&str, Option<&str>)| (k.to_owned(), v.map(str::to_owned)),
    )(i)
}

fn path_and_params(i: &str) -> IResult<&str, (String, Parameters)> {
    map(
        tuple((
            preceded(space0, path),
            many0(preceded(space1, parameter)),
            space0,
        )),
        |(path, params, _)| (path.to_owned(), Parameters(params)),
    )(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_command() {
        let tests: &[(&[u8], Command)] = &[
            (b"DATA\r\n", Command::Data),
            (b"data \r\n", Command::Data),
            (b"EHLO foo.bar.baz\r\n", Command::Ehlo {
                hostname: "foo.bar.baz".into(),
            }),
            (b"HELO [127.0.0.1]\n", Command::Helo {
                hostname: "[127.0.0.1]".into(),
            }),
            (b"EXPN mailing.list \r\n", Command::Expn {
                name: "mailing.list".into(),
            }),
            (b"HELP\r\n", Command::Help {
                subject: "".into(),
            }),
            (b"HELP me\r\n", Command::Help {
                subject: "me".into(),
            }),
            (b"NOOP\r\n", Command::Noop { string: "".into() }),
            (b"QUIT\r\n", Command::Quit),
            (b"RSET\r\n", Command::Rset),
            (b"StartTLS\r\n", Command::Starttls),
            (b"VRFY root\r\n", Command::Vrfy {
                name: "root".into(),
            }),
            (b"AUTH plain\r\n", Command::Auth {
                mechanism: "PLAIN".into(),
                initial_response: None,
            }),
            (b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n", Command::Auth {
                mechanism: "PLAIN".into(),
                initial_response: Some("AHVzZXIAcGFzcw==".into()),
            }),
            (b"MAIL FROM:<foo@bar.example.org>\r\n", Command::Mail {
                path: "foo@bar.example.org".into(),
                params: Parameters::default(),
            }),
            (b"mail from: <foo@bar.example.org> SIZE=42 BODY=8BITMIME SMTPUTF8\r\n", Command::Mail {
                path: "foo@bar.example.org".into(),
                params: Parameters(vec![
                    ("SIZE".into(), Some("42".into())),
                    ("BODY".into(), Some("8BITMIME".into())),
                    ("SMTPUTF8".into(), None),
                ]),
            }),
            (b"MAIL FROM:<>\r\n", Command::Mail {
                path: "".into(),
                params: Parameters::default(),
            }),
            (b"RCPT TO:baz@quux.example.org\r\n", Command::Rcpt {
                path: "baz@quux.example.org".into(),
                params: Parameters::default(),
            }),
            ("RCPT TO:<tést@exámple.org>\r\n".as_bytes(), Command::Rcpt {
                path: "tést@exámple.org".into(),
                params: Parameters::default(),
            }),
        ];
        for (inp, out) in tests {
            println!("Test: {:?}", String::from_utf8_lossy(inp));
            let res = Command::parse(inp);
            println!("Result: {:?}", res);
            assert_eq!(res.as_ref(), Ok(out));
        }
    }

    #[test]
    fn invalid_command() {
        let tests: &[(&[u8], ParseError)] = &[
            (b"DATA", ParseError::MissingLineBreak),
            (b"HELPME\r\n", ParseError::Unrecognized),
            (b"EHLO\r\n", ParseError::Unrecognized),
            (b"MAIL TO:<foo@bar>\r\n", ParseError::Unrecognized),
            (b"RCPT TO:<foo@bar\r\n", ParseError::Unrecognized),
            (b"DATA please\r\n", ParseError::Unrecognized),
            (b"\xff\xfe\r\n", ParseError::InvalidUtf8),
            (b"\r\n", ParseError::Unrecognized),
        ];
        for (inp, err) in tests {
            println!("Test: {:?}", String::from_utf8_lossy(inp));
            assert_eq!(Command::parse(inp), Err(*err));
        }
    }

    #[test]
    fn parameter_lookup_is_case_insensitive() {
        let cmd = Command::parse(b"MAIL FROM:<a@b.c> size=1000 SMTPUTF8\r\n").unwrap();
        match cmd {
            Command::Mail { params, .. } => {
                assert_eq!(params.get("SIZE"), Some(Some("1000")));
                assert_eq!(params.get("smtputf8"), Some(None));
                assert_eq!(params.get("BODY"), None);
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[quickcheck_macros::quickcheck]
    fn parse_never_panics(line: Vec<u8>) -> bool {
        let _ = Command::parse(&line);
        true
    }
}
