use std::os::raw::c_int;

use anyhow::Context;
use signal_hook::iterator::Signals;
use smol::channel::Receiver;
use tracing::info;

/// Returns a shutdown channel that closes the first time one of `signals`
/// is delivered to the process
pub fn shutdown_on(signals: &[c_int]) -> anyhow::Result<Receiver<()>> {
    let mut signals = Signals::new(signals).context("Registering signal handlers")?;
    let (stop, shutdown) = smol::channel::unbounded::<()>();
    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!(signal = sig, "Received signal, shutting down");
            }
            std::mem::drop(stop);
        })
        .context("Spawning the signal thread")?;
    Ok(shutdown)
}
