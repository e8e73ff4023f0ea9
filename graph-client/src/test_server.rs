//! One-shot HTTP/1.1 responders on the loopback interface, for tests of
//! code talking to the identity platform or to Graph

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
    time::Duration,
};

pub struct Recorded {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Answers the first request with `status` and `body`, then hands back what
/// it received. Returns the base URL to hit.
pub fn respond_once(status: &'static str, body: Vec<u8>) -> (String, JoinHandle<Recorded>) {
    respond_after(Duration::from_secs(0), status, body)
}

/// Like `respond_once`, waiting `delay` between reading the request and
/// answering it
pub fn respond_after(
    delay: Duration,
    status: &'static str,
    body: Vec<u8>,
) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (k, v) = line.split_at(line.find(':').unwrap());
            headers.push((k.to_owned(), v[1..].trim().to_owned()));
        }
        let len = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.parse::<usize>().unwrap())
            .unwrap_or(0);
        let mut req_body = vec![0; len];
        reader.read_exact(&mut req_body).unwrap();
        thread::sleep(delay);

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        )
        .unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();

        Recorded {
            request_line: request_line.trim_end().to_owned(),
            headers,
            body: req_body,
        }
    });
    (url, handle)
}

/// Accepts one connection and never answers it
pub fn hang_once(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(hold);
            drop(stream);
        }
    });
    url
}
