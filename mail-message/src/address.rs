use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while, take_while1},
    character::complete::{anychar, char},
    combinator::{all_consuming, map, opt, recognize},
    multi::{many0, many1, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ParseError;

/// A mailbox: an `addr-spec` with an optional display name.
///
/// Equality compares both parts; use `addr` to compare mailboxes the way
/// an SMTP envelope does.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub name: Option<String>,
    pub addr: String,
}

impl Address {
    pub fn new<S: Into<String>>(addr: S) -> Address {
        Address {
            name: None,
            addr: addr.into(),
        }
    }

    /// Parses a single mailbox, either `local@domain` or
    /// `Display Name <local@domain>`, with surrounding whitespace allowed
    pub fn parse(s: &str) -> Result<Address, ParseError> {
        all_consuming(mailbox)(s)
            .map(|(_, a)| a)
            .map_err(|_| ParseError::InvalidAddress(s.to_owned()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name {
            None => write!(f, "{}", self.addr),
            Some(ref name) if is_plain_phrase(name) => write!(f, "{} <{}>", name, self.addr),
            Some(ref name) => {
                f.write_str("\"")?;
                for c in name.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\" <{}>", self.addr)
            }
        }
    }
}

/// Parses a comma-separated list of mailboxes and groups. Group members are
/// flattened into the result, in order.
pub fn parse_address_list(s: &str) -> Result<Vec<Address>, ParseError> {
    let (_, groups) = all_consuming(terminated(
        separated_list1(char(','), address),
        ws,
    ))(s)
    .map_err(|_| ParseError::InvalidAddress(s.to_owned()))?;
    let res = groups.into_iter().flatten().collect::<Vec<_>>();
    if res.is_empty() {
        return Err(ParseError::EmptyAddressList);
    }
    Ok(res)
}

fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
}

fn is_plain_phrase(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(' ')
        && !s.ends_with(' ')
        && !s.contains("  ")
        && s.chars().all(|c| is_atext(c) || c == ' ')
}

fn ws(i: &str) -> IResult<&str, &str> {
    take_while(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n')(i)
}

fn dot_atom(i: &str) -> IResult<&str, &str> {
    recognize(separated_list1(char('.'), take_while1(is_atext)))(i)
}

fn quoted_string(i: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            many0(alt((
                map(preceded(char('\\'), anychar), |c| c.to_string()),
                map(is_not("\"\\"), str::to_owned),
            ))),
            char('"'),
        ),
        |parts| parts.concat(),
    )(i)
}

fn domain_literal(i: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('['),
        take_while(|c| c != '[' && c != ']' && c != '\\'),
        char(']'),
    ))(i)
}

fn addr_spec(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        alt((dot_atom, recognize(quoted_string))),
        char('@'),
        alt((dot_atom, domain_literal)),
    )))(i)
}

fn phrase(i: &str) -> IResult<&str, String> {
    map(
        many1(preceded(
            ws,
            alt((
                map(take_while1(|c| is_atext(c) || c == '.'), str::to_owned),
                quoted_string,
            )),
        )),
        |words| words.join(" "),
    )(i)
}

fn name_addr(i: &str) -> IResult<&str, Address> {
    map(
        pair(
            opt(phrase),
            preceded(ws, delimited(char('<'), delimited(ws, addr_spec, ws), char('>'))),
        ),
        |(name, addr)| Address {
            name: name.filter(|n| !n.is_empty()),
            addr: addr.to_owned(),
        },
    )(i)
}

fn mailbox(i: &str) -> IResult<&str, Address> {
    delimited(
        ws,
        alt((name_addr, map(addr_spec, Address::new))),
        ws,
    )(i)
}

fn group(i: &str) -> IResult<&str, Vec<Address>> {
    map(
        tuple((
            phrase,
            preceded(ws, char(':')),
            separated_list0(char(','), mailbox),
            preceded(ws, char(';')),
        )),
        |(_, _, members, _)| members,
    )(i)
}

fn address(i: &str) -> IResult<&str, Vec<Address>> {
    alt((group, map(mailbox, |m| vec![m])))(i)
}
