use anyhow::Context;
use folio_workspace::{router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ADMIN_TOKEN_ENV: &str = "FOLIO_ADMIN_TOKEN";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let mut port: u16 = 3030;
    let mut data_dir = PathBuf::from("data");
    let mut admin_token = std::env::var(ADMIN_TOKEN_ENV).ok();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                let value = flag_value(&args, i)?;
                port = value
                    .parse()
                    .with_context(|| format!("Invalid port number: {}", value))?;
                i += 2;
            }
            "--data-dir" | "-d" => {
                data_dir = PathBuf::from(flag_value(&args, i)?);
                i += 2;
            }
            "--token" => {
                admin_token = Some(flag_value(&args, i)?.to_string());
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: folio-server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --port <PORT>       HTTP port to listen on (default: 3030)");
                println!("  -d, --data-dir <DIR>    Where documents and media live (default: ./data)");
                println!("  --token <TOKEN>         Admin token for writes (env: {})", ADMIN_TOKEN_ENV);
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    let state = AppState::open(&data_dir, admin_token)
        .await
        .with_context(|| format!("Failed to open data directory {:?}", data_dir))?;
    let app = router(Arc::new(state));

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("Starting Folio server...");
    println!("Data directory: {:?}", data_dir);
    println!("HTTP listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn flag_value<'a>(args: &'a [String], i: usize) -> anyhow::Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", args[i]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
