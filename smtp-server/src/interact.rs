use std::{io, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine};
use futures::{
    io::{BufReader, ReadHalf, WriteHalf},
    AsyncRead, AsyncReadExt, AsyncWrite,
};
use tracing::{debug, trace};

use smtp_message::{unescape_data_line, Command, DataLine, Reply};

use crate::{
    crlflines::{next_crlf_line, Line},
    reply,
    sendreply::{send_reply, with_timeout},
    Config, ConnectionMetadata, Decision, HelloInfo, Session,
};

/// Room for the `.` escape and the line break on top of a data line
const DATA_LINE_OVERHEAD: usize = 3;

enum Flow {
    Continue,
    Close,
}

enum Read {
    Line,
    TooLong,
    Eof,
    TimedOut,
}

struct Conn<'a, IO, Cfg: Config> {
    reader: BufReader<ReadHalf<IO>>,
    writer: WriteHalf<IO>,
    cfg: &'a Cfg,
    session: Cfg::Session,
    conn_meta: ConnectionMetadata,
    rcpt_count: usize,
    line: Vec<u8>,
}

/// Runs one SMTP dialogue on `io` until the client quits, goes away or times
/// out. Commands are handled one at a time, in arrival order.
pub async fn interact<IO, Cfg>(
    io: IO,
    conn_meta: ConnectionMetadata,
    cfg: Arc<Cfg>,
) -> io::Result<()>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send,
    Cfg: Config,
{
    let session = cfg.new_session(&conn_meta).await;
    let (reader, writer) = io.split();
    let mut conn = Conn {
        reader: BufReader::new(reader),
        writer,
        cfg: &*cfg,
        session,
        conn_meta,
        rcpt_count: 0,
        line: Vec::new(),
    };

    conn.send(reply::welcome_banner(cfg.hostname(), cfg.banner()))
        .await?;
    loop {
        match conn.read_line(cfg.max_line_length()).await? {
            Read::Line => (),
            Read::TooLong => {
                conn.send(reply::line_too_long()).await?;
                continue;
            }
            Read::Eof => return conn.client_gone().await,
            Read::TimedOut => return conn.timed_out().await,
        }
        let cmd = Command::parse(&conn.line);
        trace!(command = ?cmd, "Received command");
        if let Flow::Close = conn.handle_command(cmd).await? {
            return Ok(());
        }
    }
}

impl<'a, IO, Cfg> Conn<'a, IO, Cfg>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send,
    Cfg: Config,
{
    async fn send(&mut self, reply: Reply) -> io::Result<()> {
        send_reply(&mut self.writer, &reply, self.cfg.write_timeout()).await
    }

    async fn read_line(&mut self, max_len: usize) -> io::Result<Read> {
        let res = with_timeout(
            self.cfg.read_timeout(),
            next_crlf_line(&mut self.reader, &mut self.line, max_len),
        )
        .await;
        match res {
            Ok(Line::Complete) => Ok(Read::Line),
            Ok(Line::TooLong) => Ok(Read::TooLong),
            Ok(Line::Eof) => Ok(Read::Eof),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(Read::TimedOut),
            Err(e) => Err(e),
        }
    }

    async fn client_gone(&mut self) -> io::Result<()> {
        debug!("Client closed the connection");
        let _ = self.session.handle_quit(&self.conn_meta).await;
        Ok(())
    }

    async fn timed_out(&mut self) -> io::Result<()> {
        debug!("Client timed out");
        let _ = self.session.handle_quit(&self.conn_meta).await;
        self.send(reply::read_timeout()).await
    }

    async fn reset(&mut self) {
        self.rcpt_count = 0;
        let _ = self.session.handle_rset(&self.conn_meta).await;
    }

    async fn handle_command(
        &mut self,
        cmd: Result<Command, smtp_message::ParseError>,
    ) -> io::Result<Flow> {
        let cmd = match cmd {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!(error = ?e, "Unrecognized command");
                self.send(reply::command_unrecognized()).await?;
                return Ok(Flow::Continue);
            }
        };

        match cmd {
            Command::Helo { hostname } => self.handle_hello(false, hostname).await?,
            Command::Ehlo { hostname } => self.handle_hello(true, hostname).await?,

            Command::Auth {
                mechanism,
                initial_response,
            } => return self.handle_auth(mechanism, initial_response).await,

            Command::Mail { path, params } => {
                if self.conn_meta.hello.is_none() {
                    self.send(reply::hello_first()).await?;
                    return Ok(Flow::Continue);
                }
                if let Some(size) = params.get("SIZE") {
                    match size.and_then(|s| s.parse::<usize>().ok()) {
                        None => {
                            self.send(reply::invalid_size()).await?;
                            return Ok(Flow::Continue);
                        }
                        Some(s) if s > self.cfg.max_message_bytes() => {
                            self.send(reply::message_too_big()).await?;
                            return Ok(Flow::Continue);
                        }
                        Some(_) => (),
                    }
                }
                let decision = self.session.filter_from(&path, &self.conn_meta).await;
                if decision.is_accept() {
                    self.rcpt_count = 0;
                }
                self.send(decision.into_reply()).await?;
            }

            Command::Rcpt { path, .. } => {
                if self.rcpt_count >= self.cfg.max_recipients() {
                    self.send(reply::too_many_recipients()).await?;
                    return Ok(Flow::Continue);
                }
                let decision = self.session.filter_to(&path, &self.conn_meta).await;
                if decision.is_accept() {
                    self.rcpt_count += 1;
                }
                self.send(decision.into_reply()).await?;
            }

            Command::Data => return self.handle_data().await,

            Command::Rset => {
                self.rcpt_count = 0;
                let decision = self.session.handle_rset(&self.conn_meta).await;
                self.send(decision.into_reply()).await?;
            }

            Command::Noop { .. } => self.send(reply::okay_noop()).await?,

            Command::Quit => {
                let decision = self.session.handle_quit(&self.conn_meta).await;
                self.send(decision.into_reply()).await?;
                return Ok(Flow::Close);
            }

            Command::Starttls | Command::Vrfy { .. } | Command::Expn { .. } | Command::Help { .. } => {
                self.send(reply::command_unimplemented()).await?
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_hello(&mut self, is_ehlo: bool, hostname: String) -> io::Result<()> {
        self.conn_meta.hello = Some(HelloInfo { is_ehlo, hostname });
        self.reset().await;
        let mechanisms = self.session.auth_mechanisms();
        self.send(reply::okay_hello(
            is_ehlo,
            self.cfg.hostname(),
            self.cfg.max_message_bytes(),
            &mechanisms,
        ))
        .await
    }

    async fn handle_auth(
        &mut self,
        mechanism: String,
        initial_response: Option<String>,
    ) -> io::Result<Flow> {
        if self.conn_meta.hello.is_none() {
            self.send(reply::hello_first()).await?;
            return Ok(Flow::Continue);
        }
        if !self
            .session
            .auth_mechanisms()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(&mechanism))
        {
            self.send(reply::auth_mechanism_unsupported()).await?;
            return Ok(Flow::Continue);
        }

        let response = match initial_response {
            Some(r) => r,
            None => {
                self.send(reply::auth_continue()).await?;
                match self.read_line(self.cfg.max_line_length()).await? {
                    Read::Line => String::from_utf8_lossy(&self.line).trim().to_owned(),
                    Read::TooLong => {
                        self.send(reply::line_too_long()).await?;
                        return Ok(Flow::Continue);
                    }
                    Read::Eof => {
                        self.client_gone().await?;
                        return Ok(Flow::Close);
                    }
                    Read::TimedOut => {
                        self.timed_out().await?;
                        return Ok(Flow::Close);
                    }
                }
            }
        };

        if response == "*" {
            self.send(reply::auth_cancelled()).await?;
            return Ok(Flow::Continue);
        }
        // RFC 4954: a lone `=` stands for an empty initial response
        let payload = if response == "=" {
            Vec::new()
        } else {
            match STANDARD.decode(response.as_bytes()) {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = ?e, "Invalid base64 in AUTH exchange");
                    self.send(reply::auth_invalid_base64()).await?;
                    return Ok(Flow::Continue);
                }
            }
        };

        let decision = self
            .session
            .auth(&mechanism, &payload, &self.conn_meta)
            .await;
        self.send(decision.into_reply()).await?;
        Ok(Flow::Continue)
    }

    async fn handle_data(&mut self) -> io::Result<Flow> {
        match self.session.filter_data(&self.conn_meta).await {
            Decision::Reject { reply } => {
                self.send(reply).await?;
                return Ok(Flow::Continue);
            }
            Decision::Accept { reply } => self.send(reply).await?,
        }

        let max = self.cfg.max_message_bytes();
        let mut body = Vec::new();
        let mut overflow = false;
        loop {
            match self.read_line(max.saturating_add(DATA_LINE_OVERHEAD)).await? {
                Read::Line => (),
                Read::TooLong => {
                    overflow = true;
                    continue;
                }
                Read::Eof => {
                    self.client_gone().await?;
                    return Ok(Flow::Close);
                }
                Read::TimedOut => {
                    self.timed_out().await?;
                    return Ok(Flow::Close);
                }
            }
            match unescape_data_line(&self.line) {
                DataLine::End => break,
                DataLine::Line(_) if overflow => (),
                DataLine::Line(l) => {
                    if body.len() + l.len() > max {
                        overflow = true;
                        body = Vec::new();
                    } else {
                        body.extend_from_slice(l);
                    }
                }
            }
        }

        let reply = if overflow {
            debug!(max_message_bytes = max, "Message over the size limit");
            reply::message_too_big()
        } else {
            self.session
                .handle_mail(body, &self.conn_meta)
                .await
                .into_reply()
        };
        self.reset().await;
        self.send(reply).await?;
        Ok(Flow::Continue)
    }
}
