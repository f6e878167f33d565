use crate::types::{NormalizedEvent, Origin, StoredRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Merge policy for one reconciliation pass.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilePolicy {
    /// How many days past its date an automated record survives without
    /// being re-seen. None disables automated expiry entirely; Some(0)
    /// expires a record the moment its date passes.
    pub grace_days: Option<i64>,
    /// When true (the default), manually-edited records are never altered
    /// or expired by the pipeline.
    pub preserve_manual: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            grace_days: Some(60),
            preserve_manual: true,
        }
    }
}

/// Per-action tallies for the run report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileCounts {
    pub inserted: usize,
    pub refreshed: usize,
    pub kept_manual: usize,
    pub kept_automated: usize,
    pub expired: usize,
}

/// The complete next snapshot of the store, sorted by (date, title) for
/// the human-facing sheet, plus what happened to get there.
#[derive(Debug)]
pub struct ReconciliationResult {
    pub records: Vec<StoredRecord>,
    pub counts: ReconcileCounts,
}

/// Merge one run's normalized candidates against the previously persisted
/// store. Single-threaded, single pass over the union of fingerprints;
/// never writes anywhere itself.
///
/// Running this twice with the same candidates reaches a fixed point: no
/// duplicate inserts, no field churn beyond `last_seen_at`.
pub fn reconcile(
    existing: Vec<StoredRecord>,
    fresh: Vec<NormalizedEvent>,
    policy: &ReconcilePolicy,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> ReconciliationResult {
    // Collapse intra-run duplicates: two sources describing the same show
    // fold into the first-seen candidate.
    let mut fresh_by_key: BTreeMap<Uuid, NormalizedEvent> = BTreeMap::new();
    for event in fresh {
        if let Some(kept) = fresh_by_key.get(&event.fingerprint) {
            debug!(
                title = %event.title,
                kept_source = %kept.source_name,
                dropped_source = %event.source_name,
                "collapsed duplicate candidate"
            );
        } else {
            fresh_by_key.insert(event.fingerprint, event);
        }
    }

    let mut counts = ReconcileCounts::default();
    let mut next: Vec<StoredRecord> = Vec::with_capacity(existing.len() + fresh_by_key.len());

    for mut record in existing {
        let key = record.event.fingerprint;
        let seen_again = fresh_by_key.remove(&key);

        match (record.origin, seen_again) {
            // Manual wins: the automated refresh is discarded.
            (Origin::Manual, _) if policy.preserve_manual => {
                counts.kept_manual += 1;
                next.push(record);
            }
            (_, Some(fresh_event)) => {
                record.refresh_from(&fresh_event, now);
                counts.refreshed += 1;
                next.push(record);
            }
            (_, None) => {
                // Not re-listed this run. Within the grace window that is
                // normal (past the source's "upcoming" horizon); beyond it
                // the record has served its purpose and is dropped.
                let expired = policy
                    .grace_days
                    .map(|grace| record.event.date < today - chrono::Duration::days(grace))
                    .unwrap_or(false);
                if expired {
                    info!(
                        title = %record.event.title,
                        date = %record.event.date,
                        "expiring automated record"
                    );
                    counts.expired += 1;
                } else {
                    counts.kept_automated += 1;
                    next.push(record);
                }
            }
        }
    }

    // Whatever fingerprints remain are genuinely new.
    for (_, event) in fresh_by_key {
        debug!(title = %event.title, date = %event.date, "inserting new record");
        counts.inserted += 1;
        next.push(StoredRecord::new_automated(event, now));
    }

    next.sort_by(|a, b| {
        a.event
            .date
            .cmp(&b.event.date)
            .then_with(|| a.event.title.cmp(&b.event.title))
    });

    ReconciliationResult { records: next, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint;
    use crate::types::{Category, Price};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(title: &str, d: NaiveDate, venue: &str, source: &str) -> NormalizedEvent {
        NormalizedEvent {
            title: title.to_string(),
            date: d,
            time: None,
            venue: venue.to_string(),
            category: Category::Culture,
            price: Price::Unknown,
            description: String::new(),
            source_name: source.to_string(),
            source_url: format!("https://{source}.test"),
            fingerprint: fingerprint::fingerprint(title, d, venue),
        }
    }

    fn record(title: &str, d: NaiveDate, venue: &str, origin: Origin) -> StoredRecord {
        let mut r = StoredRecord::new_automated(event(title, d, venue, "store"), Utc::now());
        r.origin = origin;
        r
    }

    fn policy(grace_days: Option<i64>) -> ReconcilePolicy {
        ReconcilePolicy {
            grace_days,
            preserve_manual: true,
        }
    }

    #[test]
    fn test_new_event_inserted_as_automated() {
        let fresh = vec![event("Recital de piano", date(2025, 5, 1), "Teatro Regio", "a")];
        let result = reconcile(vec![], fresh, &policy(Some(60)), date(2025, 4, 1), Utc::now());

        assert_eq!(result.counts.inserted, 1);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].origin, Origin::Automated);
        assert!(result.records[0].active);
    }

    #[test]
    fn test_two_sources_same_event_collapse_to_one() {
        // Both sources report the New Year concert; normalization already
        // folded case, so the fingerprints agree.
        let fresh = vec![
            event("Concierto de Año Nuevo", date(2025, 1, 1), "Teatro Regio", "tomaticket"),
            event("Concierto de Año Nuevo", date(2025, 1, 1), "Teatro Regio", "feed"),
        ];
        let result = reconcile(vec![], fresh, &policy(Some(60)), date(2024, 12, 20), Utc::now());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.counts.inserted, 1);
        assert_eq!(result.records[0].event.source_name, "tomaticket");
    }

    #[test]
    fn test_manual_record_never_touched_by_fresh_candidate() {
        let d = date(2025, 5, 1);
        let mut manual = record("Gala benéfica", d, "Teatro Regio", Origin::Manual);
        manual.event.description = "Texto corregido a mano".to_string();

        let mut fresh = event("Gala benéfica", d, "Teatro Regio", "tomaticket");
        fresh.description = "Texto scrapeado".to_string();

        let result = reconcile(
            vec![manual.clone()],
            vec![fresh],
            &policy(Some(60)),
            date(2025, 4, 1),
            Utc::now(),
        );

        assert_eq!(result.counts.kept_manual, 1);
        assert_eq!(result.counts.inserted, 0);
        assert_eq!(result.records[0], manual);
    }

    #[test]
    fn test_automated_record_refreshed_on_reappearance() {
        let d = date(2025, 5, 1);
        let existing = record("Recital", d, "Teatro Regio", Origin::Automated);
        let first_seen = existing.first_seen_at;

        let mut fresh = event("Recital", d, "Teatro Regio", "tomaticket");
        fresh.price = Price::Amount { euros: 12.0 };

        let now = Utc::now();
        let result = reconcile(vec![existing], vec![fresh], &policy(Some(60)), date(2025, 4, 1), now);

        assert_eq!(result.counts.refreshed, 1);
        let r = &result.records[0];
        assert_eq!(r.event.price, Price::Amount { euros: 12.0 });
        assert_eq!(r.first_seen_at, first_seen);
        assert_eq!(r.last_seen_at, now);
        assert!(r.active);
    }

    #[test]
    fn test_absent_automated_record_expires_past_grace() {
        // Dated 2025-01-01, reconciled on 2025-04-01 with 60 grace days:
        // 90 days elapsed, gone.
        let existing = record("Concierto pasado", date(2025, 1, 1), "Teatro Regio", Origin::Automated);
        let result = reconcile(vec![existing], vec![], &policy(Some(60)), date(2025, 4, 1), Utc::now());

        assert_eq!(result.counts.expired, 1);
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_absent_automated_record_kept_within_grace() {
        let existing = record("Concierto reciente", date(2025, 3, 15), "Teatro Regio", Origin::Automated);
        let result = reconcile(vec![existing], vec![], &policy(Some(60)), date(2025, 4, 1), Utc::now());

        assert_eq!(result.counts.kept_automated, 1);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_zero_grace_expires_immediately_after_date() {
        let existing = record("Ayer mismo", date(2025, 3, 31), "Teatro Regio", Origin::Automated);
        let result = reconcile(vec![existing], vec![], &policy(Some(0)), date(2025, 4, 1), Utc::now());
        assert_eq!(result.counts.expired, 1);
    }

    #[test]
    fn test_disabled_expiry_keeps_everything() {
        let existing = record("Muy antiguo", date(2020, 1, 1), "Teatro Regio", Origin::Automated);
        let result = reconcile(vec![existing], vec![], &policy(None), date(2025, 4, 1), Utc::now());
        assert_eq!(result.counts.expired, 0);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_absent_manual_record_never_expires() {
        let existing = record("Nota manual antigua", date(2020, 1, 1), "Teatro Regio", Origin::Manual);
        let result = reconcile(vec![existing], vec![], &policy(Some(0)), date(2025, 4, 1), Utc::now());
        assert_eq!(result.counts.kept_manual, 1);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_output_sorted_by_date_then_title() {
        let fresh = vec![
            event("Zarzuela", date(2025, 5, 2), "Teatro Regio", "a"),
            event("Ballet", date(2025, 5, 2), "Teatro Regio", "a"),
            event("Concierto", date(2025, 5, 1), "Teatro Regio", "a"),
        ];
        let result = reconcile(vec![], fresh, &policy(Some(60)), date(2025, 4, 1), Utc::now());
        let titles: Vec<&str> = result.records.iter().map(|r| r.event.title.as_str()).collect();
        assert_eq!(titles, vec!["Concierto", "Ballet", "Zarzuela"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let today = date(2025, 4, 1);
        let now = Utc::now();
        let fresh = vec![
            event("Recital", date(2025, 5, 1), "Teatro Regio", "a"),
            event("Ballet", date(2025, 5, 2), "Teatro Principal", "b"),
        ];

        let first = reconcile(vec![], fresh.clone(), &policy(Some(60)), today, now);
        let second = reconcile(first.records.clone(), fresh, &policy(Some(60)), today, now);

        assert_eq!(second.counts.inserted, 0);
        assert_eq!(second.counts.refreshed, 2);
        assert_eq!(second.records, first.records);
    }
}
