use std::{io, time::Duration};

use futures::{AsyncWrite, AsyncWriteExt};
use smol::{future::FutureExt, Timer};

use smtp_message::Reply;

pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> io::Result<T>
where
    F: std::future::Future<Output = io::Result<T>>,
{
    fut.or(async move {
        Timer::after(timeout).await;
        Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
    })
    .await
}

pub async fn send_reply<W>(writer: &mut W, reply: &Reply, timeout: Duration) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = reply.to_bytes();
    with_timeout(timeout, async {
        writer.write_all(&bytes).await?;
        writer.flush().await
    })
    .await
}
