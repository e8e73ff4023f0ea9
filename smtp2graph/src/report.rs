use tracing::error;

use smtp_server::ConnectionMetadata;

use crate::Error;

/// Reports an error about to be returned to a client. Reporting never
/// changes the reply.
pub fn error(err: &Error, conn_meta: &ConnectionMetadata) {
    let peer = conn_meta.peer_addr.map(|a| a.to_string()).unwrap_or_default();
    let helo = conn_meta
        .hello
        .as_ref()
        .map(|h| h.hostname.as_str())
        .unwrap_or("");
    match err {
        Error::Relay(cause) => error!(
            kind = err.kind(),
            peer = %peer,
            helo = %helo,
            error = ?cause,
            "Relaying failed"
        ),
        _ => error!(
            kind = err.kind(),
            peer = %peer,
            helo = %helo,
            error = %err,
            "Rejecting command"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracing_subscriber::prelude::*;

    #[test]
    fn errors_reach_sentry() {
        let tests: &[(Error, &str)] = &[
            (Error::Relay(anyhow::anyhow!("graph down")), "relay"),
            (Error::InvalidCredentials, "invalid_credentials"),
        ];
        for (err, kind) in tests {
            println!("Test: {}", kind);
            let subscriber = tracing_subscriber::registry().with(sentry_tracing::layer());
            let events = sentry::test::with_captured_events(|| {
                tracing::subscriber::with_default(subscriber, || {
                    let conn_meta = ConnectionMetadata::new(Some(([127, 0, 0, 1], 2525).into()));
                    error(err, &conn_meta);
                })
            });
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].level, sentry::Level::Error);
            assert_eq!(err.kind(), *kind);
        }
    }
}
