use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use structopt::StructOpt;
use tracing_subscriber::{prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let opt = smtp2graph::Opt::from_args();

    // Flushes pending events when dropped
    let _sentry = opt.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let shutdown = smtp2graph::shutdown_on(&[SIGINT, SIGTERM, SIGQUIT])?;
    smtp2graph::run(&opt, shutdown)
}
