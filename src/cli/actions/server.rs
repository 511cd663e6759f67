use crate::{cli::telemetry, gateway};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub web_root: Option<PathBuf>,
    pub api_url: Url,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the web root is unusable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let web_root = match args.web_root {
        Some(root) => {
            let root = root
                .canonicalize()
                .with_context(|| format!("Invalid web root: {}", root.display()))?;
            if !root.join("index.html").is_file() {
                warn!("No index.html in {}, client-side routes will 404", root.display());
            }
            Some(root)
        }
        None => None,
    };

    debug!("Server args: port={}, web_root={:?}", args.port, web_root);
    info!("Backend API: {}", args.api_url);

    let result = gateway::new(args.port, web_root).await;

    telemetry::shutdown_tracer();

    result
}
