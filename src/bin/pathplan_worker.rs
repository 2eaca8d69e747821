//! Out-of-process path worker: one JSON request per stdin line, one JSON
//! reply per stdout line. Diagnostics go to stderr.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use waypoint_router::domains::path_planning::{wire, GridPathEngine, PathEngine};
use waypoint_router::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).await?,
        None => Config::default(),
    };
    let engine: Arc<dyn PathEngine> = Arc::new(GridPathEngine::new(
        config.routing.max_grid_cells,
        config.routing.bbox_padding,
    ));
    tracing::info!(max_grid_cells = config.routing.max_grid_cells, "path worker ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let engine = Arc::clone(&engine);
        let reply = tokio::task::spawn_blocking(move || wire::handle_line(engine.as_ref(), &line))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("path computation faulted: {}", e);
                r#"{"error":"internal error","kind":"internalFault"}"#.to_string()
            });
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}
