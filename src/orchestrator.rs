use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::normalize;
use crate::reconcile::{reconcile, ReconcileCounts, ReconcilePolicy};
use crate::store::StoreClient;
use crate::types::{NormalizedEvent, SourceAdapter};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// What one source contributed to the run.
#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub fetched: usize,
    pub normalized: usize,
    /// Rejection reason -> count, so the date heuristics stay auditable.
    pub rejected: BTreeMap<String, usize>,
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            fetched: 0,
            normalized: 0,
            rejected: BTreeMap::new(),
            error: None,
        }
    }
}

/// Full accounting of one reconciliation run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub total_fetched: usize,
    pub total_normalized: usize,
    pub counts: ReconcileCounts,
    pub store_total: usize,
    pub dry_run: bool,
}

/// Drives the whole pipeline: fan out to sources, normalize, reconcile
/// once, persist once. Owns the lifetime of the run's candidate sets.
pub struct Orchestrator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    store: Arc<dyn StoreClient>,
    config: Config,
}

impl Orchestrator {
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        store: Arc<dyn StoreClient>,
        config: Config,
    ) -> Self {
        Self {
            sources,
            store,
            config,
        }
    }

    pub async fn run(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<RunReport> {
        // A store we cannot read is fatal: reconciling against a guessed
        // snapshot could destroy manual edits.
        let existing = self.store.load().await?;
        info!("Loaded {} existing records from store", existing.len());

        let timeout = Duration::from_secs(self.config.source_timeout_seconds);
        let mut tasks = JoinSet::new();
        for source in &self.sources {
            let source = Arc::clone(source);
            tasks.spawn(async move {
                let name = source.name();
                let outcome = match tokio::time::timeout(timeout, source.fetch()).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
                };
                (name, outcome)
            });
        }

        let mut reports = Vec::new();
        let mut fresh: Vec<NormalizedEvent> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (name, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Source task panicked: {}", e);
                    continue;
                }
            };
            let mut report = SourceReport::new(name);
            match outcome {
                Ok(candidates) => {
                    report.fetched = candidates.len();
                    info!("Source {} produced {} candidates", name, report.fetched);
                    for candidate in &candidates {
                        match normalize::normalize(candidate, today, &self.config) {
                            Ok(event) => {
                                report.normalized += 1;
                                fresh.push(event);
                            }
                            Err(e) => {
                                warn!(
                                    source = name,
                                    title = %candidate.title,
                                    "Dropping candidate: {}", e
                                );
                                *report.rejected.entry(e.reason().to_string()).or_insert(0) += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    // Partial success across sources is the expected common
                    // case; this source simply contributes nothing today.
                    warn!("Source {} failed: {}", name, e);
                    report.error = Some(e.to_string());
                }
            }
            reports.push(report);
        }
        // JoinSet completion order is nondeterministic.
        reports.sort_by(|a, b| a.source.cmp(&b.source));

        let total_fetched: usize = reports.iter().map(|r| r.fetched).sum();
        let total_normalized = fresh.len();

        let policy = ReconcilePolicy {
            grace_days: self.config.expiry_grace_days(),
            preserve_manual: true,
        };
        let result = reconcile(existing, fresh, &policy, today, now);
        info!(
            inserted = result.counts.inserted,
            refreshed = result.counts.refreshed,
            kept_manual = result.counts.kept_manual,
            kept_automated = result.counts.kept_automated,
            expired = result.counts.expired,
            "Reconciliation complete"
        );

        if dry_run {
            info!("Dry run: skipping store write");
        } else {
            self.store.save(&result.records).await?;
            info!("Persisted {} records", result.records.len());
        }

        Ok(RunReport {
            sources: reports,
            total_fetched,
            total_normalized,
            counts: result.counts,
            store_total: result.records.len(),
            dry_run,
        })
    }
}
