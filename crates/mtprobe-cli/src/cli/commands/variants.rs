//! `mtprobe variants` – show the configured variant catalog.

use anyhow::{Context, Result};
use mtprobe_core::config::ProbeConfig;

pub fn run_variants(cfg: &ProbeConfig) -> Result<()> {
    let catalog = cfg.catalog().context("variant catalog")?;
    println!("{:<3} {:<20} {}", "", "NAME", "ACCEPT");
    for v in catalog.iter() {
        let marker = if catalog.is_reference(&v.name) { "*" } else { "" };
        println!("{:<3} {:<20} {}", marker, v.name, v.accept);
    }
    println!("* reference variant; others are compared against it");
    Ok(())
}
