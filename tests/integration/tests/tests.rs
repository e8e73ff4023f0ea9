use std::{
    convert::TryFrom,
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};

use mail_message::Message;
use smtp2graph::{Credentials, Envelope, Relay, ServerConfig, FALLBACK_SUBJECT};

/// Relay double keeping everything it is handed, or failing with `fail`
#[derive(Default)]
struct Recorder {
    fail: Option<&'static str>,
    sent: Mutex<Vec<(Envelope, Message)>>,
}

#[async_trait]
impl Relay for Recorder {
    async fn relay(&self, envelope: &Envelope, message: &Message) -> anyhow::Result<()> {
        tracing::debug!(recipients = envelope.recipients.len(), "Recording message");
        if let Some(f) = self.fail {
            anyhow::bail!(f);
        }
        self.sent
            .lock()
            .unwrap()
            .push((envelope.clone(), message.clone()));
        Ok(())
    }
}

struct Server {
    addr: SocketAddr,
    relay: Arc<Recorder>,
    signal: smol::channel::Sender<()>,
    handle: thread::JoinHandle<anyhow::Result<()>>,
}

fn start(relay: Recorder) -> Server {
    let _ = tracing_subscriber::fmt::try_init();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let listener = smol::net::TcpListener::try_from(listener).unwrap();
    let relay = Arc::new(relay);
    let cfg = Arc::new(ServerConfig {
        domain: "mail.example.org".to_owned(),
        max_message_bytes: 1024,
        max_recipients: 10,
        read_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(5),
        credentials: Arc::new(Credentials {
            username: "sender@example.com".to_owned(),
            password: "password".to_owned(),
        }),
        relay: relay.clone(),
    });
    let (signal, shutdown) = smol::channel::unbounded::<()>();
    let handle = thread::spawn(move || {
        let ex = Arc::new(smol::Executor::new());
        let serving = smtp2graph::serve(listener, cfg, ex.clone(), shutdown);
        smol::block_on(ex.run(serving))
    });
    Server {
        addr,
        relay,
        signal,
        handle,
    }
}

fn plain(username: &str, password: &str) -> String {
    STANDARD.encode(format!("\0{}\0{}", username, password))
}

/// Sends the whole script at once, then reads until the server hangs up
fn dialogue(addr: SocketAddr, script: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(script.as_bytes()).unwrap();
    let mut resp = String::new();
    stream.read_to_string(&mut resp).unwrap();
    resp
}

fn check(got: &str, expected: &[&str]) {
    let expected = expected.iter().map(|l| format!("{}\r\n", l)).collect::<String>();
    println!("Expecting\n---\n{}---", expected);
    println!("Got\n---\n{}---", got);
    assert_eq!(got, expected);
}

const EHLO_REPLY: &[&str] = &[
    "220 mail.example.org ESMTP Service ready",
    "250-mail.example.org",
    "250-8BITMIME",
    "250-ENHANCEDSTATUSCODES",
    "250-SMTPUTF8",
    "250-SIZE 1024",
    "250 AUTH PLAIN",
];

#[test]
fn relays_a_submission() {
    let server = start(Recorder::default());
    let script = format!(
        "EHLO client.example.org\r\n\
         AUTH PLAIN {}\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         RCPT TO:<a@example.com>\r\n\
         RCPT TO:<b@example.com>\r\n\
         DATA\r\n\
         From: sender@example.com\r\n\
         To: a@example.com\r\n\
         Subject: hi\r\n\
         \r\n\
         ..leading dot\r\n\
         body\r\n\
         .\r\n\
         QUIT\r\n",
        plain("sender@example.com", "password")
    );
    let resp = dialogue(server.addr, &script);
    let mut expected = EHLO_REPLY.to_vec();
    expected.extend_from_slice(&[
        "235 2.7.0 Authentication succeeded",
        "250 2.0.0 Okay",
        "250 2.0.0 Okay",
        "250 2.0.0 Okay",
        "354 Start mail input; end with <CRLF>.<CRLF>",
        "250 2.0.0 Okay",
        "221 2.0.0 Bye",
    ]);
    check(&resp, &expected);

    let sent = server.relay.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (env, msg) = &sent[0];
    assert_eq!(env.sender.addr, "sender@example.com");
    assert_eq!(
        env.recipients.iter().map(|r| r.addr.as_str()).collect::<Vec<_>>(),
        vec!["a@example.com", "b@example.com"]
    );
    assert_eq!(msg.headers.get("From"), Some("sender@example.com"));
    assert_eq!(msg.headers.get("To"), Some("a@example.com"));
    assert_eq!(msg.headers.get("Bcc"), Some("b@example.com"));
    assert_eq!(msg.headers.get("Subject"), Some("hi"));
    assert_eq!(msg.body, b".leading dot\r\nbody\r\n");
}

#[test]
fn enforces_ordering_and_authentication() {
    let server = start(Recorder::default());
    let script = format!(
        "MAIL FROM:<sender@example.com>\r\n\
         HELO client.example.org\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         AUTH PLAIN {}\r\n\
         AUTH LOGIN\r\n\
         AUTH PLAIN\r\n\
         {}\r\n\
         AUTH PLAIN {}\r\n\
         RCPT TO:<a@example.com>\r\n\
         DATA\r\n\
         MAIL FROM:<not an address>\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         DATA\r\n\
         RCPT TO:<no at sign>\r\n\
         RSET\r\n\
         RCPT TO:<a@example.com>\r\n\
         QUIT\r\n",
        plain("sender@example.com", "wrong"),
        plain("sender@example.com", "password"),
        plain("sender@example.com", "password"),
    );
    let resp = dialogue(server.addr, &script);
    check(
        &resp,
        &[
            "220 mail.example.org ESMTP Service ready",
            "503 5.5.1 Please introduce yourself first",
            "250 mail.example.org",
            "530 5.7.0 authentication required",
            "535 5.7.8 invalid username or password",
            "504 5.5.4 Unsupported authentication mechanism",
            "334 ",
            "235 2.7.0 Authentication succeeded",
            "503 5.5.1 already authenticated",
            "503 5.5.1 bad sequence of commands: RCPT TO before MAIL FROM",
            "503 5.5.1 sender not specified",
            "550 5.1.7 invalid sender address",
            "250 2.0.0 Okay",
            "503 5.5.1 sender already specified",
            "503 5.5.1 no recipients specified",
            "550 5.1.3 invalid recipient address",
            "250 2.0.0 Okay",
            "503 5.5.1 bad sequence of commands: RCPT TO before MAIL FROM",
            "221 2.0.0 Bye",
        ],
    );
    assert!(server.relay.sent.lock().unwrap().is_empty());
}

#[test]
fn relay_failure_is_reported_and_transaction_cleared() {
    let server = start(Recorder {
        fail: Some("sendMail failed: 403 Forbidden\nAccess denied"),
        ..Recorder::default()
    });
    let script = format!(
        "EHLO client.example.org\r\n\
         AUTH PLAIN {}\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         RCPT TO:<a@example.com>\r\n\
         DATA\r\n\
         hello\r\n\
         .\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         QUIT\r\n",
        plain("sender@example.com", "password")
    );
    let resp = dialogue(server.addr, &script);
    let mut expected = EHLO_REPLY.to_vec();
    expected.extend_from_slice(&[
        "235 2.7.0 Authentication succeeded",
        "250 2.0.0 Okay",
        "250 2.0.0 Okay",
        "354 Start mail input; end with <CRLF>.<CRLF>",
        "554-5.3.0 sendMail failed: 403 Forbidden",
        "554 5.3.0 Access denied",
        "250 2.0.0 Okay",
        "221 2.0.0 Bye",
    ]);
    check(&resp, &expected);
}

#[test]
fn wraps_plain_text_submissions() {
    let server = start(Recorder::default());
    let script = format!(
        "EHLO client.example.org\r\n\
         AUTH PLAIN {}\r\n\
         MAIL FROM:<sender@example.com>\r\n\
         RCPT TO:<a@example.com>\r\n\
         DATA\r\n\
         just some text\r\n\
         .\r\n\
         QUIT\r\n",
        plain("sender@example.com", "password")
    );
    let resp = dialogue(server.addr, &script);
    assert!(resp.ends_with("250 2.0.0 Okay\r\n221 2.0.0 Bye\r\n"), "{}", resp);

    let sent = server.relay.sent.lock().unwrap();
    let (_, msg) = &sent[0];
    assert_eq!(msg.headers.get("Subject"), Some(FALLBACK_SUBJECT));
    assert_eq!(msg.headers.get("Content-Type"), Some("text/plain; charset=utf-8"));
    assert_eq!(msg.headers.get("To"), Some("a@example.com"));
    assert_eq!(msg.body, b"just some text\r\n");
}

#[test]
fn serves_connections_concurrently() {
    let server = start(Recorder::default());
    let clients = (0..8)
        .map(|i| {
            let addr = server.addr;
            thread::spawn(move || {
                let script = format!(
                    "EHLO client{i}.example.org\r\n\
                     AUTH PLAIN {auth}\r\n\
                     MAIL FROM:<sender@example.com>\r\n\
                     RCPT TO:<rcpt{i}@example.com>\r\n\
                     DATA\r\n\
                     Subject: message {i}\r\n\
                     \r\n\
                     body\r\n\
                     .\r\n\
                     QUIT\r\n",
                    i = i,
                    auth = plain("sender@example.com", "password")
                );
                dialogue(addr, &script)
            })
        })
        .collect::<Vec<_>>();
    for c in clients {
        let resp = c.join().unwrap();
        assert!(resp.ends_with("250 2.0.0 Okay\r\n221 2.0.0 Bye\r\n"), "{}", resp);
    }

    let sent = server.relay.sent.lock().unwrap();
    assert_eq!(sent.len(), 8);
    for i in 0..8 {
        let rcpt = format!("rcpt{}@example.com", i);
        let subject = format!("message {}", i);
        let (_, msg) = sent
            .iter()
            .find(|(env, _)| env.recipients[0].addr == rcpt)
            .unwrap();
        assert_eq!(msg.headers.get("Subject"), Some(subject.as_str()));
        assert_eq!(msg.headers.get("Bcc"), Some(rcpt.as_str()));
        assert_eq!(msg.headers.get("From"), Some("sender@example.com"));
    }
}

#[test]
fn stops_accepting_on_shutdown() {
    let server = start(Recorder::default());
    let resp = dialogue(server.addr, "QUIT\r\n");
    check(
        &resp,
        &["220 mail.example.org ESMTP Service ready", "221 2.0.0 Bye"],
    );
    drop(server.signal);
    server.handle.join().unwrap().unwrap();
}
