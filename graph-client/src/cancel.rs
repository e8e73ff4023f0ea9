use std::future::Future;

use smol::{channel::Receiver, future::FutureExt};

use crate::Error;

/// Races `fut` against `shutdown`, which fires when a message is sent on it
/// or when every sender is dropped
pub async fn cancellable<T, F>(shutdown: &Receiver<()>, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    fut.or(async {
        let _ = shutdown.recv().await;
        Err(Error::Cancelled)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_close() {
        let (signal, shutdown) = smol::channel::unbounded::<()>();
        drop(signal);
        let res = smol::block_on(cancellable(&shutdown, smol::future::pending::<Result<(), Error>>()));
        assert!(matches!(res, Err(Error::Cancelled)));
    }

    #[test]
    fn passes_through_results() {
        let (_signal, shutdown) = smol::channel::unbounded::<()>();
        let res = smol::block_on(cancellable(&shutdown, async { Ok::<_, Error>(42) }));
        assert_eq!(res.unwrap(), 42);
    }
}
