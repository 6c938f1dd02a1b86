//! `mtprobe run` – probe every registry server and write the result file.

use anyhow::{Context, Result};
use mtprobe_core::config::ProbeConfig;
use mtprobe_core::control::Shutdown;
use mtprobe_core::host_identity::DnsResolver;
use mtprobe_core::probe::CurlTransport;
use mtprobe_core::scheduler::{ProgressEvent, Scheduler};
use mtprobe_core::sink::CsvSink;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;

use super::servers::load_servers;

pub async fn run_probe(
    cfg: &ProbeConfig,
    registry_file: Option<&Path>,
    output: &Path,
    limit: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let servers = load_servers(cfg, registry_file).await?;
    if servers.is_empty() {
        println!("Registry lists no servers.");
        return Ok(());
    }

    let mut scheduler =
        Scheduler::from_config(cfg, Arc::new(CurlTransport), Arc::new(DnsResolver))?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    scheduler.seed(servers, &mut rng, limit);
    let total = scheduler.queued();
    let mut sink = CsvSink::create(output, scheduler.catalog())?;
    println!("Probing {} server(s) with {} variant(s)", total, scheduler.catalog().len());

    let shutdown = Shutdown::new();
    let ctrl_c = shutdown.listen_for_ctrl_c();

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressEvent>(64);
    let progress_handle = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            print_event(&event, total);
        }
    });

    let result = scheduler.run(&mut sink, &shutdown, Some(&progress_tx)).await;
    drop(progress_tx);
    let _ = progress_handle.await;
    ctrl_c.abort();
    let summary = result.with_context(|| format!("probe run writing {}", output.display()))?;

    println!();
    print!("{}", summary.stats);
    println!(
        "Finalized {} server(s) ({} after exhausting retries), {} requeue(s), {} deferral(s).",
        summary.finalized, summary.exhausted, summary.requeues, summary.deferrals
    );
    if summary.interrupted {
        println!("Interrupted: {} server(s) not probed.", summary.abandoned);
    }
    println!("Results written to {}", output.display());
    Ok(())
}

fn print_event(event: &ProgressEvent, total: usize) {
    match event {
        ProgressEvent::Probing {
            server,
            identity,
            queued,
            attempt,
        } => {
            if *attempt > 1 {
                println!("[{queued} queued] {server} ({identity}) attempt {attempt}");
            } else {
                println!("[{queued} queued] {server} ({identity})");
            }
        }
        ProgressEvent::Deferred {
            server,
            identity,
            remaining,
        } => println!(
            "  {server}: {identity} backing off for {:.1}s, requeued",
            remaining.as_secs_f64()
        ),
        ProgressEvent::RateLimited {
            server,
            reason,
            wait,
            retries,
            requeued,
            ..
        } => {
            if *requeued {
                println!(
                    "  {server}: {reason}, waiting {:.1}s (retries {retries})",
                    wait.as_secs_f64()
                );
            } else {
                println!("  {server}: {reason}, retries exhausted; recording last outcome");
            }
        }
        ProgressEvent::Finalized { finalized, .. } => {
            tracing::debug!(finalized, total, "server finalized");
        }
        ProgressEvent::Stats(report) => {
            println!();
            print!("{report}");
            println!();
        }
    }
}
