//! `mtprobe servers` – show the server → TLD index built from the registry.

use anyhow::{Context, Result};
use mtprobe_core::config::ProbeConfig;
use mtprobe_core::registry::{self, Server};
use std::path::Path;

/// Load the bootstrap document (local file or configured URL) and flatten it
/// into probe targets. Any failure here is fatal for the command.
pub(crate) async fn load_servers(
    cfg: &ProbeConfig,
    registry_file: Option<&Path>,
) -> Result<Vec<Server>> {
    let bootstrap = match registry_file {
        Some(path) => registry::load_bootstrap(path)
            .with_context(|| format!("load registry file {}", path.display()))?,
        None => {
            let url = cfg.registry_url.clone();
            let timeout = cfg.request_timeout();
            tokio::task::spawn_blocking(move || registry::fetch_bootstrap(&url, timeout))
                .await
                .context("registry fetch task")?
                .with_context(|| format!("fetch registry {}", cfg.registry_url))?
        }
    };
    let index = registry::build_server_index(&bootstrap.services);
    tracing::info!(
        servers = index.len(),
        publication = bootstrap.publication.as_deref().unwrap_or("-"),
        "registry loaded"
    );
    Ok(registry::servers_from_index(index))
}

pub async fn run_servers(cfg: &ProbeConfig, registry_file: Option<&Path>) -> Result<()> {
    let servers = load_servers(cfg, registry_file).await?;
    if servers.is_empty() {
        println!("Registry lists no servers.");
        return Ok(());
    }
    println!("{:<6} {}", "TLDS", "SERVER");
    for s in &servers {
        println!("{:<6} {}  ({})", s.tlds.len(), s.url, s.tld_list());
    }
    println!("{} server(s)", servers.len());
    Ok(())
}
