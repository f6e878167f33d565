use crate::error::FetchError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Raw event data as scraped from one source, one run. Fields are textual
/// and partially populated; nothing in here is trusted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    pub raw_date_text: String,
    pub raw_time_text: Option<String>,
    pub venue_text: Option<String>,
    pub price_text: Option<String>,
    pub description_text: Option<String>,
    pub source_url: String,
    pub source_name: String,
}

/// Event category, classified from title + description keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Music,
    Theatre,
    Kids,
    Dance,
    Comedy,
    Cinema,
    Sport,
    Festival,
    #[default]
    Culture,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "MUSIC",
            Category::Theatre => "THEATRE",
            Category::Kids => "KIDS",
            Category::Dance => "DANCE",
            Category::Comedy => "COMEDY",
            Category::Cinema => "CINEMA",
            Category::Sport => "SPORT",
            Category::Festival => "FESTIVAL",
            Category::Culture => "CULTURE",
        }
    }

    /// Lenient parse for store rows; anything unrecognized maps to Culture.
    pub fn from_store(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MUSIC" => Category::Music,
            "THEATRE" => Category::Theatre,
            "KIDS" => Category::Kids,
            "DANCE" => Category::Dance,
            "COMEDY" => Category::Comedy,
            "CINEMA" => Category::Cinema,
            "SPORT" => Category::Sport,
            "FESTIVAL" => Category::Festival,
            _ => Category::Culture,
        }
    }
}

/// Ticket price. `Unknown` is a real sentinel: a candidate with no price
/// text is neither free nor zero-cost, it is simply unpriced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Price {
    Amount { euros: f64 },
    Free,
    Unknown,
}

impl Price {
    pub fn is_free(&self) -> bool {
        matches!(self, Price::Free)
    }

    /// Human-facing store column text.
    pub fn display(&self) -> String {
        match self {
            Price::Amount { euros } => {
                if euros.fract() == 0.0 {
                    format!("{} €", *euros as i64)
                } else {
                    format!("{euros} €")
                }
            }
            Price::Free => "Gratuito".to_string(),
            Price::Unknown => "Consultar en taquilla".to_string(),
        }
    }
}

/// A candidate after normalization: date is always a concrete, fully
/// disambiguated calendar day, and identity is pinned by the fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: String,
    pub date: NaiveDate,
    /// None means "unknown", never midnight.
    pub time: Option<NaiveTime>,
    pub venue: String,
    pub category: Category,
    pub price: Price,
    pub description: String,
    pub source_name: String,
    pub source_url: String,
    pub fingerprint: Uuid,
}

/// Who owns a stored record. Manual records were created or edited by a
/// human directly in the store and are immune to automated overwrite and
/// expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Automated,
    Manual,
}

/// One durable row of the store: a normalized event plus reconciliation
/// metadata. `extra` round-trips columns this pipeline does not own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub event: NormalizedEvent,
    pub origin: Origin,
    pub active: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StoredRecord {
    /// Wrap a freshly normalized event as a new automated record.
    pub fn new_automated(event: NormalizedEvent, now: DateTime<Utc>) -> Self {
        Self {
            event,
            origin: Origin::Automated,
            active: true,
            first_seen_at: now,
            last_seen_at: now,
            extra: BTreeMap::new(),
        }
    }

    /// Stable row identifier derived from the fingerprint.
    pub fn row_id(&self) -> String {
        crate::fingerprint::row_id(&self.event.fingerprint)
    }

    /// Overwrite the event payload from a fresh candidate, keeping the
    /// record's lineage (first_seen_at, origin, active, extra columns).
    pub fn refresh_from(&mut self, fresh: &NormalizedEvent, now: DateTime<Utc>) {
        self.event = fresh.clone();
        self.last_seen_at = now;
    }
}

/// One scraping source. Implementations live under `sources/` and each
/// may fail independently without affecting the rest of the run.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier for this source, also used in `enabled_sources`.
    fn name(&self) -> &'static str;

    /// Fetch all candidate events this source currently lists.
    async fn fetch(&self) -> std::result::Result<Vec<CandidateEvent>, FetchError>;
}
