//! The probing loop: dequeue, check backoff, dispatch, classify, finalize.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::Rng;
use tokio::sync::mpsc;

use crate::backoff::{BackoffController, BackoffPolicy};
use crate::compare::{AggregateStats, EquivalenceFields, StatsReport};
use crate::config::ProbeConfig;
use crate::control::Shutdown;
use crate::host_identity::{HostIdentity, HostResolver};
use crate::probe::{DispatchSettings, Dispatcher, ProbeSet, Transport, VariantCatalog};
use crate::registry::Server;
use crate::sink::{ProbeRecord, ResultSink};

use super::classify::TriggerPolicy;
use super::progress::ProgressEvent;
use super::queue::{WorkItem, WorkQueue};

/// Loop tunables beyond the backoff policy.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub backoff: BackoffPolicy,
    pub triggers: TriggerPolicy,
    pub equivalence: EquivalenceFields,
    /// Sleep after requeueing an item whose host is not yet eligible.
    pub defer_interval: Duration,
    /// Emit running statistics every N finalized servers (0 disables).
    pub report_every: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            triggers: TriggerPolicy::default(),
            equivalence: EquivalenceFields::default(),
            defer_interval: Duration::from_secs(1),
            report_every: 10,
        }
    }
}

/// What a run did, returned once the queue drains or the run is interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub finalized: u64,
    /// Finalized while still rate-limited after the last retry.
    pub exhausted: u64,
    pub requeues: u64,
    pub deferrals: u64,
    /// Items never finalized because the run was interrupted.
    pub abandoned: usize,
    pub interrupted: bool,
    pub stats: StatsReport,
}

/// Single-worker scheduler. Owns the queue, the backoff controller and the
/// aggregate counters for one run; nothing is shared, so nothing is locked.
pub struct Scheduler {
    catalog: VariantCatalog,
    dispatcher: Dispatcher,
    resolver: Arc<dyn HostResolver>,
    backoff: BackoffController,
    stats: AggregateStats,
    queue: WorkQueue,
    identities: HashMap<String, HostIdentity>,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(
        catalog: VariantCatalog,
        dispatcher: Dispatcher,
        resolver: Arc<dyn HostResolver>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            stats: AggregateStats::new(&catalog, settings.equivalence),
            backoff: BackoffController::new(settings.backoff),
            catalog,
            dispatcher,
            resolver,
            queue: WorkQueue::default(),
            identities: HashMap::new(),
            settings,
        }
    }

    /// Build from a validated config with the given transport and resolver.
    pub fn from_config(
        cfg: &ProbeConfig,
        transport: Arc<dyn Transport>,
        resolver: Arc<dyn HostResolver>,
    ) -> Result<Self> {
        let catalog = cfg.catalog().context("variant catalog")?;
        let backoff = cfg.backoff.policy().context("backoff settings")?;
        let dispatcher = Dispatcher::new(
            transport,
            DispatchSettings {
                probe_path: cfg.probe_path.clone(),
                connect_timeout: cfg.connect_timeout(),
                timeout: cfg.request_timeout(),
                preview_bytes: cfg.preview_bytes,
            },
        );
        Ok(Self::new(
            catalog,
            dispatcher,
            resolver,
            SchedulerSettings {
                backoff,
                triggers: cfg.triggers.clone(),
                equivalence: cfg.equivalence,
                defer_interval: cfg.defer_interval(),
                report_every: cfg.report_every,
            },
        ))
    }

    /// Queue `servers` in random order (at most `limit` of them).
    pub fn seed<R: Rng + ?Sized>(&mut self, servers: Vec<Server>, rng: &mut R, limit: Option<usize>) {
        self.queue = WorkQueue::seeded(servers, rng, limit);
        tracing::info!(servers = self.queue.len(), "work queue seeded");
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn backoff(&self) -> &BackoffController {
        &self.backoff
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Process the queue until it is empty or `shutdown` is requested.
    ///
    /// Every finalized server produces exactly one record in `sink`. On
    /// interruption the sink is still flushed and the statistics for the
    /// servers finalized so far are returned.
    pub async fn run(
        &mut self,
        sink: &mut dyn ResultSink,
        shutdown: &Shutdown,
        progress_tx: Option<&mpsc::Sender<ProgressEvent>>,
    ) -> Result<RunSummary> {
        let mut summary = Counts::default();
        let mut interrupted = false;

        loop {
            if shutdown.is_requested() {
                interrupted = true;
                tracing::warn!(queued = self.queue.len(), "run interrupted; draining");
                break;
            }
            let Some(mut item) = self.queue.pop() else {
                break;
            };

            let identity = self.identity_for(&item.server.url).await;
            let now = clock_now();
            if !self.backoff.is_eligible(identity, now) {
                let remaining = self.backoff.remaining(&identity, now);
                tracing::debug!(
                    server = %item.server.url,
                    %identity,
                    ?remaining,
                    "host backing off; deferring"
                );
                notify(
                    progress_tx,
                    ProgressEvent::Deferred {
                        server: item.server.url.clone(),
                        identity,
                        remaining,
                    },
                )
                .await;
                self.queue.push(item);
                summary.deferrals += 1;
                tokio::time::sleep(self.settings.defer_interval).await;
                continue;
            }

            tracing::info!(
                server = %item.server.url,
                %identity,
                queued = self.queue.len(),
                attempt = item.attempts + 1,
                "probing"
            );
            notify(
                progress_tx,
                ProgressEvent::Probing {
                    server: item.server.url.clone(),
                    identity,
                    queued: self.queue.len(),
                    attempt: item.attempts + 1,
                },
            )
            .await;

            let pacing = self.backoff.pacing_delay(&identity);
            let set = self
                .dispatcher
                .probe(&item.server, &self.catalog, pacing)
                .await;

            let now = clock_now();
            let mut exhausted = false;
            if let Some((variant, trigger)) = self.settings.triggers.scan(&set) {
                let verdict = self.backoff.on_rate_limited(identity, now);
                let requeued = !verdict.exhausted;
                tracing::warn!(
                    server = %item.server.url,
                    %identity,
                    variant,
                    %trigger,
                    wait = ?verdict.wait,
                    retries = verdict.retries,
                    requeued,
                    "rate-limit signal"
                );
                notify(
                    progress_tx,
                    ProgressEvent::RateLimited {
                        server: item.server.url.clone(),
                        identity,
                        reason: format!("{trigger} on {variant}"),
                        wait: verdict.wait,
                        retries: verdict.retries,
                        requeued,
                    },
                )
                .await;
                if requeued {
                    item.attempts += 1;
                    self.queue.push(item);
                    summary.requeues += 1;
                    continue;
                }
                exhausted = true;
            } else {
                self.backoff.on_clean(identity, now);
            }

            self.finalize(&item, &set, exhausted, sink)?;
            summary.finalized += 1;
            if exhausted {
                summary.exhausted += 1;
            }
            notify(
                progress_tx,
                ProgressEvent::Finalized {
                    server: item.server.url,
                    finalized: summary.finalized,
                    queued: self.queue.len(),
                },
            )
            .await;

            if self.settings.report_every > 0
                && summary.finalized % self.settings.report_every as u64 == 0
            {
                notify(progress_tx, ProgressEvent::Stats(self.stats.report())).await;
            }
        }

        sink.finish().context("flush results")?;
        let stats = self.stats.report();
        tracing::info!(
            finalized = summary.finalized,
            exhausted = summary.exhausted,
            requeues = summary.requeues,
            interrupted,
            "run finished"
        );
        Ok(RunSummary {
            finalized: summary.finalized,
            exhausted: summary.exhausted,
            requeues: summary.requeues,
            deferrals: summary.deferrals,
            abandoned: self.queue.len(),
            interrupted,
            stats,
        })
    }

    fn finalize(
        &mut self,
        item: &WorkItem,
        set: &ProbeSet,
        exhausted: bool,
        sink: &mut dyn ResultSink,
    ) -> Result<()> {
        let verdicts = self.stats.record(set);
        let record = ProbeRecord::new(&item.server, set, &verdicts, exhausted);
        if exhausted {
            tracing::warn!(server = %item.server.url, "retries exhausted; recording last outcome");
        }
        sink.write(&record)
            .with_context(|| format!("record result for {}", item.server.url))
    }

    /// Resolve once per endpoint and remember the answer for the run.
    async fn identity_for(&mut self, endpoint: &str) -> HostIdentity {
        if let Some(id) = self.identities.get(endpoint) {
            return *id;
        }
        let resolver = Arc::clone(&self.resolver);
        let owned = endpoint.to_string();
        let identity = tokio::task::spawn_blocking(move || resolver.resolve(&owned))
            .await
            .unwrap_or(HostIdentity::Unresolved);
        if identity == HostIdentity::Unresolved {
            tracing::warn!(endpoint, "could not resolve; using shared unknown-host backoff");
        }
        self.identities.insert(endpoint.to_string(), identity);
        identity
    }
}

#[derive(Debug, Default)]
struct Counts {
    finalized: u64,
    exhausted: u64,
    requeues: u64,
    deferrals: u64,
}

/// Backoff deadlines follow the runtime's timer clock, so they agree with the
/// deferral and pacing sleeps.
fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn notify(tx: Option<&mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}
