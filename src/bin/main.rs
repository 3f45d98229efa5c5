//! buzon service binary

use std::sync::Arc;

use buzon::config::Config;
use buzon::handlers::AppContext;
use buzon::server::HttpServer;
use buzon::store::{JsonFileStore, RosterStore};
use buzon::uploads::UploadStore;
use futures::prelude::*;
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env();

    let store = Arc::new(
        JsonFileStore::new(&config.data_file, &config.seed_file, &config.admin_secret).await?,
    );
    let uploads = Arc::new(UploadStore::new(&config.uploads_dir).await?);

    // first load seeds the roster, so the startup summary can report it
    let roster = store.load().await?;
    log::info!("buzón digital");
    log::info!("  http://{}", config.listen_addr());
    log::info!("  {} buzones listos", roster.mailboxes.len());
    if !roster.mailboxes.is_empty() {
        log::info!("  clave admin: {}", roster.admin_secret);
    }

    let context = AppContext::new(store, uploads);
    let server = HttpServer::new(context);

    let addr = config.listen_addr();
    let _server_task = tokio::spawn(async move {
        if let Err(e) = server.listen(&addr).await {
            log::error!("server error: {}", e);
        }
    });

    // Set up signal handling for graceful shutdown
    let signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;
    let handle = signals.handle();

    let mut signals = signals.fuse();
    if let Some(signal) = signals.next().await {
        let signal_name = match signal {
            SIGTERM => "SIGTERM",
            SIGINT => "SIGINT",
            SIGHUP => "SIGHUP",
            _ => "unknown signal",
        };
        log::info!("Received {} signal, shutting down...", signal_name);
    }

    handle.close();

    log::info!("Shutdown complete");
    Ok(())
}
