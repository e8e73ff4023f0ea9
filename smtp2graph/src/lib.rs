use std::{convert::TryFrom, sync::Arc};

use anyhow::Context;
use easy_parallel::Parallel;
use smol::{channel::Receiver, future::FutureExt};
use tracing::{debug, info, warn};

use graph_client::{Client, ClientSecretCredential, TokenCache};
use smtp_server::ConnectionMetadata;

const NUM_THREADS: usize = 4;

mod config;
mod error;
mod reconcile;
mod relay;
mod report;
mod server_config;
mod session;
mod signals;

pub use config::{parse_duration, parse_listen, Opt};
pub use error::Error;
pub use reconcile::{reconcile, Envelope};
pub use relay::{GraphRelay, Relay};
pub use server_config::ServerConfig;
pub use session::{Credentials, Session, FALLBACK_SUBJECT, PLAIN};
pub use signals::shutdown_on;

/// Accepts connections on `listener` until `shutdown` fires, running one
/// SMTP dialogue per connection on `ex`
pub async fn serve<R: Relay>(
    listener: smol::net::TcpListener,
    cfg: Arc<ServerConfig<R>>,
    ex: Arc<smol::Executor<'static>>,
    shutdown: Receiver<()>,
) -> anyhow::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "Server up, waiting for connections");
    loop {
        let accepted = async { Some(listener.accept().await) }
            .or(async {
                let _ = shutdown.recv().await;
                None
            })
            .await;
        let (stream, peer) = match accepted {
            None => {
                info!("Shutting down, no longer accepting connections");
                return Ok(());
            }
            Some(Ok(accepted)) => accepted,
            Some(Err(e)) => {
                warn!(error = ?e, "Failed accepting a connection");
                continue;
            }
        };
        tracing::trace!(peer = %peer, "New incoming stream");
        let cfg = cfg.clone();
        ex.spawn(async move {
            let conn_meta = ConnectionMetadata::new(Some(peer));
            if let Err(e) = smtp_server::interact(stream, conn_meta, cfg).await {
                warn!(peer = %peer, error = ?e, "Connection ended with an error");
            }
        })
        .detach();
    }
}

pub fn run(opt: &Opt, shutdown: Receiver<()>) -> anyhow::Result<()> {
    info!("smtp2graph starting up");

    let listener =
        std::net::TcpListener::bind(opt.listen).context("Binding on the listening port")?;

    debug!("Preparing the Graph relay");
    let credential = ClientSecretCredential::new(
        &opt.authority,
        &opt.tenant_id,
        &opt.client_id,
        &opt.client_secret,
        shutdown.clone(),
    )
    .context("Preparing the client credential")?;
    let client =
        Client::new(&opt.graph_endpoint, shutdown.clone()).context("Preparing the Graph client")?;
    let relay = GraphRelay::new(
        TokenCache::new(credential),
        client,
        opt.sender_email.clone(),
    );
    let cfg = Arc::new(ServerConfig::new(opt, relay));

    // Start the executor
    let ex = Arc::new(smol::Executor::new());

    let (stop_signal, local_shutdown) = smol::channel::unbounded::<()>();

    let (_, res): (_, anyhow::Result<()>) = Parallel::new()
        .each(0..NUM_THREADS, |_| {
            smol::block_on(ex.run(async {
                let _ = shutdown.recv().or(local_shutdown.recv()).await;
            }))
        })
        .finish(|| {
            let res = smol::block_on(async {
                let listener = smol::net::TcpListener::try_from(listener)
                    .context("Making listener async")?;
                serve(listener, cfg, ex.clone(), shutdown.clone()).await
            });
            std::mem::drop(stop_signal);
            res
        });

    res
}
