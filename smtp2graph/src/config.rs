use std::{
    fmt,
    net::{SocketAddr, ToSocketAddrs},
    time::Duration,
};

use tracing::warn;

pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_RECIPIENTS: usize = 50;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parses a listening address. A bare `:port` listens on all interfaces.
pub fn parse_listen(s: &str) -> anyhow::Result<SocketAddr> {
    let full;
    let s = if s.starts_with(':') {
        full = format!("0.0.0.0{}", s);
        full.as_str()
    } else {
        s
    };
    s.to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("{:?} resolves to no address", s))
}

/// Parses `<n>ms`, `<n>s`, `<n>m` or `<n>h`. Zero is rejected.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let (num, millis) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60 * 1000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3600 * 1000)
    } else {
        anyhow::bail!("missing unit, expected one of ms, s, m or h");
    };
    let num = num.parse::<u64>()?;
    anyhow::ensure!(num > 0, "duration must be positive");
    let millis = num
        .checked_mul(millis)
        .ok_or_else(|| anyhow::anyhow!("duration too long"))?;
    Ok(Duration::from_millis(millis))
}

pub fn parse_positive(s: &str) -> anyhow::Result<usize> {
    let n = s.parse::<usize>()?;
    anyhow::ensure!(n > 0, "must be positive");
    Ok(n)
}

/// Parses `s` with `parse`, falling back to `default` with a warning when
/// the value is invalid
fn or_default<T: fmt::Debug>(
    what: &str,
    s: &str,
    parse: fn(&str) -> anyhow::Result<T>,
    default: T,
) -> T {
    match parse(s) {
        Ok(v) => v,
        Err(e) => {
            warn!(option = what, value = %s, error = %e, default = ?default, "Invalid value, using the default");
            default
        }
    }
}

fn max_message_bytes(s: &str) -> usize {
    or_default("max-message-bytes", s, parse_positive, DEFAULT_MAX_MESSAGE_BYTES)
}

fn max_recipients(s: &str) -> usize {
    or_default("max-recipients", s, parse_positive, DEFAULT_MAX_RECIPIENTS)
}

fn write_timeout(s: &str) -> Duration {
    or_default("write-timeout", s, parse_duration, DEFAULT_TIMEOUT)
}

fn read_timeout(s: &str) -> Duration {
    or_default("read-timeout", s, parse_duration, DEFAULT_TIMEOUT)
}

#[derive(structopt::StructOpt)]
#[structopt(
    name = "smtp2graph",
    about = "SMTP submission gateway relaying mail through Microsoft Graph."
)]
pub struct Opt {
    /// Address to listen on
    #[structopt(
        long,
        env = "SMTP_SERVER_ADDR",
        default_value = "0.0.0.0:1025",
        parse(try_from_str = parse_listen)
    )]
    pub listen: SocketAddr,

    /// Host name announced in the greeting
    #[structopt(long, env = "SMTP_SERVER_DOMAIN", default_value = "localhost")]
    pub domain: String,

    #[structopt(
        long,
        env = "SMTP_MAX_MESSAGE_BYTES",
        default_value = "10485760",
        parse(from_str = max_message_bytes)
    )]
    pub max_message_bytes: usize,

    #[structopt(
        long,
        env = "SMTP_MAX_RECIPIENTS",
        default_value = "50",
        parse(from_str = max_recipients)
    )]
    pub max_recipients: usize,

    #[structopt(
        long,
        env = "SMTP_WRITE_TIMEOUT",
        default_value = "10s",
        parse(from_str = write_timeout)
    )]
    pub write_timeout: Duration,

    #[structopt(
        long,
        env = "SMTP_READ_TIMEOUT",
        default_value = "10s",
        parse(from_str = read_timeout)
    )]
    pub read_timeout: Duration,

    /// Mailbox clients authenticate as, and that mail is sent from
    #[structopt(long, env = "SENDER_EMAIL")]
    pub sender_email: String,

    #[structopt(long, env = "SENDER_PASSWORD", hide_env_values = true)]
    pub sender_password: String,

    /// Entra ID application (client) id
    #[structopt(long, env = "ENTRA_CLIENT_ID")]
    pub client_id: String,

    #[structopt(long, env = "ENTRA_TENANT_ID")]
    pub tenant_id: String,

    #[structopt(long, env = "ENTRA_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    #[structopt(long, env = "ENTRA_AUTHORITY", default_value = "https://login.microsoftonline.com")]
    pub authority: String,

    #[structopt(long, env = "GRAPH_ENDPOINT", default_value = "https://graph.microsoft.com")]
    pub graph_endpoint: String,

    /// Sentry DSN receiving error events; reporting stays local when unset
    #[structopt(long, env = "SENTRY_DSN", hide_env_values = true)]
    pub sentry_dsn: Option<String>,
}
