use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mail_message::{parse_address_list, Address, Message};
use smtp2graph::{reconcile, Envelope};
use smtp_message::Command;

pub fn parse_command(c: &mut Criterion) {
    let tests: &[(&str, &[u8])] = &[
        ("mail", b"MAIL FROM:<t+e-s.t_i+n-g@foo.bar.baz> SIZE=12345\r\n"),
        ("rcpt", b"RCPT TO:<someone@example.org>\r\n"),
        ("auth", b"AUTH PLAIN AHNlbmRlckBleGFtcGxlLmNvbQBwYXNzd29yZA==\r\n"),
    ];
    let mut g = c.benchmark_group("Command::parse");
    for (name, line) in tests {
        g.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| Command::parse(black_box(line)))
        });
    }
}

pub fn parse_address(c: &mut Criterion) {
    let tests: &[(&str, &str)] = &[
        ("addr-spec", "t+e-s.t_i+n-g@foo.bar.baz"),
        ("quoted-string localpart", r#""quoted\"example"@example.org"#),
        ("name-addr", "\"Doe, John\" <john@example.com>"),
    ];
    let mut g = c.benchmark_group("Address::parse");
    for (name, addr) in tests {
        g.bench_with_input(BenchmarkId::from_parameter(name), addr, |b, addr| {
            b.iter(|| Address::parse(black_box(addr)))
        });
    }
    drop(g);

    let list = (0..50)
        .map(|i| format!("User {} <user{}@example.com>", i, i))
        .collect::<Vec<_>>()
        .join(", ");
    c.bench_function("parse_address_list/50", |b| {
        b.iter(|| parse_address_list(black_box(&list)))
    });
}

fn sample_message(recipients: usize) -> Vec<u8> {
    let to = (0..recipients)
        .map(|i| format!("user{}@example.com", i))
        .collect::<Vec<_>>()
        .join(", ");
    let mut msg = format!(
        "From: Sender <sender@example.com>\r\n\
         To: {}\r\n\
         Subject: benchmark\r\n\
         X-Folded: first part\r\n\
         \tsecond part\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n",
        to
    )
    .into_bytes();
    msg.extend(b"Lorem ipsum dolor sit amet.\r\n".repeat(200));
    msg
}

pub fn parse_message(c: &mut Criterion) {
    let mut g = c.benchmark_group("Message::parse");
    for n in &[1, 10, 50] {
        let raw = sample_message(*n);
        g.bench_with_input(BenchmarkId::from_parameter(n), &raw, |b, raw| {
            b.iter(|| Message::parse(black_box(raw)))
        });
    }
}

pub fn reconcile_envelope(c: &mut Criterion) {
    let mut g = c.benchmark_group("reconcile");
    for n in &[1, 10, 50] {
        let message = Message::parse(&sample_message(*n)).unwrap();
        // Half of the envelope is already listed in the headers
        let envelope = Envelope {
            sender: Address::new("sender@example.com"),
            recipients: (n / 2..n + n / 2)
                .map(|i| Address::new(format!("user{}@example.com", i)))
                .collect(),
        };
        g.bench_with_input(BenchmarkId::from_parameter(n), &message, |b, message| {
            b.iter(|| {
                let mut m = message.clone();
                reconcile(&mut m, black_box(&envelope));
                m
            })
        });
    }
}

criterion_group!(
    benches,
    parse_command,
    parse_address,
    parse_message,
    reconcile_envelope
);
criterion_main!(benches);
