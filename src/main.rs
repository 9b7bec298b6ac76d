mod allow_list;
mod config;
mod error;
mod guard;
mod logging;
mod server;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use tokio::{signal, sync::broadcast};
use tracing::{info, warn};

use crate::{
    config::{Command, Config},
    guard::{RedirectGuard, ValidationOutcome},
    server::start_server,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::parse();
    logging::init(config.log_format);

    let guard = RedirectGuard::new(config.load_allow_list()?);

    if let Some(Command::Check { destination }) = &config.command {
        let (allowed, report) = check(&guard, destination);
        println!("{report}");
        return Ok(if allowed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let (kill, _) = broadcast::channel::<()>(1);

    let kill_signal = kill.clone();
    let kill_listener = tokio::spawn(async move {
        shutdown_signal().await;
        let _ = kill_signal.send(());
    });

    let address = config.address();
    let served = start_server(Arc::new(guard), kill.subscribe(), &address).await;

    kill_listener.abort();
    served?;

    info!("Server shut down");
    Ok(ExitCode::SUCCESS)
}

/// Evaluates one destination for the `check` command. Returns whether it is
/// allowed along with the text to print.
fn check(guard: &RedirectGuard, destination: &str) -> (bool, String) {
    match guard.evaluate(Some(destination)) {
        ValidationOutcome::Valid { url } => (true, format!("allowed: {url}")),
        ValidationOutcome::Malformed(malformed) => (false, format!("malformed: {malformed:?}")),
        ValidationOutcome::Unauthorized { host } => (
            false,
            format!(
                "unauthorized: {host:?}\nallowed hosts: {}",
                guard.allow_list().hosts().join(", ")
            ),
        ),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
