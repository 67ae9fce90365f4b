//! SIGINT/SIGTERM handling for hidden sessions.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use tracing::debug;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Starts a listener thread that requests a clean shutdown on SIGINT or
/// SIGTERM. Returns once the handlers are registered.
pub fn install() -> Result<()> {
    let (ready_tx, ready_rx) = mpsc::channel();
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            rt.block_on(listen(ready_tx));
        })
        .context("Failed to start signal listener")?;

    ready_rx
        .recv()
        .context("Signal listener exited early")?
        .context("Failed to register signal handlers")
}

#[cfg(unix)]
async fn listen(ready: mpsc::Sender<io::Result<()>>) {
    use tokio::signal::unix::{signal, SignalKind};

    let registered = signal(SignalKind::interrupt())
        .and_then(|interrupt| Ok((interrupt, signal(SignalKind::terminate())?)));
    let (mut interrupt, mut terminate) = match registered {
        Ok(streams) => streams,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let received = tokio::select! {
        got = interrupt.recv() => got.map(|()| "SIGINT"),
        got = terminate.recv() => got.map(|()| "SIGTERM"),
    };
    if let Some(name) = received {
        debug!("received {}", name);
        SHUTDOWN.store(true, Ordering::SeqCst);
    }
}

#[cfg(not(unix))]
async fn listen(ready: mpsc::Sender<io::Result<()>>) {
    let _ = ready.send(Ok(()));
    if tokio::signal::ctrl_c().await.is_ok() {
        debug!("received Ctrl+C");
        SHUTDOWN.store(true, Ordering::SeqCst);
    }
}

/// Returns true once a termination signal arrived.
pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}
