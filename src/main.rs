use std::error::Error;
use std::sync::Arc;

use futures::future;
use tokio::signal;

use drum_oracle::config::Config;
use drum_oracle::environment::Environment;
use drum_oracle::routes;
use drum_oracle::snapshot::SnapshotStore;
use log::{error, info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let config = Config::from_env().map_err(|e| {
        error!(logger, "Invalid configuration"; "error" => %e);
        e
    })?;

    info!(logger, "Starting...";
        "port" => config.port,
        "mode" => %config.mode,
        "max_records" => config.max_records,
        "cors_origin" => ?config.cors_origin);
    let logger = Arc::new(logger);

    // the only copy of the snapshot; handlers reach it through the environment
    let snapshots = Arc::new(SnapshotStore::new());
    let port = config.port;
    let environment = Environment::new(logger.clone(), snapshots, config);

    let shutdown = {
        let logger = logger.clone();

        async move {
            match signal::ctrl_c().await {
                Ok(()) => info!(logger, "Received interrupt, shutting down..."),
                Err(e) => {
                    error!(logger, "Failed to listen for interrupt"; "error" => %e);
                    future::pending::<()>().await;
                }
            }
        }
    };

    let (address, server) = warp::serve(routes::make_api(environment))
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown)?;

    info!(logger, "Listening"; "address" => %address);
    server.await;

    info!(logger, "Exiting gracefully...");

    Ok(())
}
