use clap::Parser;
use lineal_core::{LineageGraph, LinealConfig};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing_subscriber::{fmt, EnvFilter};

use lineal_server::server;
use lineal_server::subsystems::warehouse::WarehouseHandler;
use lineal_server::subsystems::{consumer, intake};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "lineal.toml")]
    config: String,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match LinealConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    if args.check {
        println!("Config OK: intake on {}, socket {}", config.intake.listen_addr, config.service.socket_path);
        return Ok(());
    }

    // Shutdown broadcast fed by Ctrl-C
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Shared graph store and query facade
    let graph = Arc::new(RwLock::new(LineageGraph::new()));
    let handler = WarehouseHandler::new(graph.clone(), &config.traversal);

    // Intake queue between the event listener and the single consumer
    let (events_tx, events_rx) = mpsc::channel(config.intake.queue_capacity);

    // Event intake listener (TCP, JSON lines)
    let intake_addr = config.intake.listen_addr.clone();
    let intake_tx = events_tx.clone();
    let intake_shutdown = tx.subscribe();
    tokio::spawn(async move {
        if let Err(e) = intake::run_intake_listener(intake_addr, intake_tx, intake_shutdown).await {
            tracing::error!("Event intake error: {}", e);
        }
    });

    // Consumer loop: sole writer to the graph store
    let consumer_graph = graph.clone();
    let consumer_shutdown = tx.subscribe();
    tokio::spawn(async move {
        consumer::run_consumer_loop(consumer_graph, events_rx, consumer_shutdown).await;
    });

    // HTTP REST API if enabled
    if config.http.enabled {
        let http_handler = handler.clone();
        let http_events_tx = events_tx.clone();
        let http_config = config.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = lineal_server::http::start_http_server(
                http_handler,
                http_events_tx,
                http_config,
                http_shutdown,
            )
            .await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, handler, tx.subscribe()).await?;

    Ok(())
}
