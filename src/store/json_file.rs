use crate::error::StoreError;
use crate::fingerprint;
use crate::normalize::extract;
use crate::store::StoreClient;
use crate::types::{Category, NormalizedEvent, Origin, Price, StoredRecord};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

const TIME_UNKNOWN: &str = "unknown";

/// One row of the JSON store, in the column layout the sheet consumers
/// expect. `extra` captures any column this pipeline does not own.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    date: String,
    #[serde(default = "time_unknown")]
    time: String,
    #[serde(default)]
    venue: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    purchase_url: String,
    #[serde(default)]
    is_free: bool,
    #[serde(default)]
    source: String,
    #[serde(default = "origin_manual")]
    origin: String,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    first_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_seen_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

fn time_unknown() -> String {
    TIME_UNKNOWN.to_string()
}

// A row without an origin marker was typed in by hand.
fn origin_manual() -> String {
    "MANUAL".to_string()
}

fn default_true() -> bool {
    true
}

/// Store client backed by a single JSON array file. Writes are an atomic
/// replace (temp file + rename) so an interrupted run never leaves a
/// half-written store behind.
///
/// Manually-edited rows are written back byte-for-byte as loaded, and rows
/// the pipeline cannot type at all are carried through untouched.
pub struct JsonFileStore {
    path: PathBuf,
    manual_raw: Mutex<HashMap<String, serde_json::Value>>,
    passthrough: Mutex<Vec<serde_json::Value>>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            manual_raw: Mutex::new(HashMap::new()),
            passthrough: Mutex::new(Vec::new()),
        }
    }

    fn parse_date(text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y"))
            .ok()
    }

    fn record_from_row(row: StoredRow, now: DateTime<Utc>) -> Option<StoredRecord> {
        let date = Self::parse_date(&row.date)?;
        let time = NaiveTime::parse_from_str(row.time.trim(), "%H:%M").ok();
        let price = if row.is_free {
            Price::Free
        } else {
            extract::extract_price(&row.price)
        };
        // Rows hand-added to the sheet carry ad hoc ids; treat anything
        // outside our id scheme as manual regardless of the origin column.
        let origin = if row.origin.eq_ignore_ascii_case("AUTOMATED") && row.id.starts_with("evt_") {
            Origin::Automated
        } else {
            Origin::Manual
        };
        let event = NormalizedEvent {
            fingerprint: fingerprint::fingerprint(&row.title, date, &row.venue),
            title: row.title,
            date,
            time,
            venue: row.venue,
            category: Category::from_store(&row.category),
            price,
            description: row.description,
            source_name: row.source,
            source_url: row.purchase_url,
        };
        Some(StoredRecord {
            event,
            origin,
            active: row.active,
            first_seen_at: row.first_seen_at.unwrap_or(now),
            last_seen_at: row.last_seen_at.unwrap_or(now),
            extra: row.extra,
        })
    }

    fn row_from_record(record: &StoredRecord) -> StoredRow {
        let event = &record.event;
        StoredRow {
            id: record.row_id(),
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date.format("%Y-%m-%d").to_string(),
            time: event
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(time_unknown),
            venue: event.venue.clone(),
            category: event.category.as_str().to_string(),
            price: event.price.display(),
            purchase_url: event.source_url.clone(),
            is_free: event.price.is_free(),
            source: event.source_name.clone(),
            origin: match record.origin {
                Origin::Automated => "AUTOMATED".to_string(),
                Origin::Manual => "MANUAL".to_string(),
            },
            active: record.active,
            first_seen_at: Some(record.first_seen_at),
            last_seen_at: Some(record.last_seen_at),
            extra: record.extra.clone(),
        }
    }
}

#[async_trait]
impl StoreClient for JsonFileStore {
    async fn load(&self) -> Result<Vec<StoredRecord>, StoreError> {
        if !self.path.exists() {
            debug!("Store file {} does not exist yet, starting empty", self.path.display());
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::ReadFailed(format!("{}: {}", self.path.display(), e)))?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| StoreError::ReadFailed(format!("{}: {}", self.path.display(), e)))?;

        let now = Utc::now();
        let mut records = Vec::with_capacity(rows.len());
        let mut manual_raw = self.manual_raw.lock().unwrap();
        let mut passthrough = self.passthrough.lock().unwrap();
        manual_raw.clear();
        passthrough.clear();

        for raw in rows {
            let parsed = serde_json::from_value::<StoredRow>(raw.clone())
                .ok()
                .and_then(|row| Self::record_from_row(row, now));
            match parsed {
                Some(record) => {
                    if record.origin == Origin::Manual {
                        manual_raw.insert(record.row_id(), raw);
                    }
                    records.push(record);
                }
                None => {
                    warn!("Carrying through untyped store row: {}", raw);
                    passthrough.push(raw);
                }
            }
        }
        Ok(records)
    }

    async fn save(&self, records: &[StoredRecord]) -> Result<(), StoreError> {
        let manual_raw = self.manual_raw.lock().unwrap();
        let passthrough = self.passthrough.lock().unwrap();

        let mut rows: Vec<serde_json::Value> = Vec::with_capacity(records.len() + passthrough.len());
        for record in records {
            // A manual row goes back out exactly as it came in.
            if record.origin == Origin::Manual {
                if let Some(raw) = manual_raw.get(&record.row_id()) {
                    rows.push(raw.clone());
                    continue;
                }
            }
            let row = Self::row_from_record(record);
            rows.push(
                serde_json::to_value(row)
                    .map_err(|e| StoreError::WriteFailed(e.to_string()))?,
            );
        }
        rows.extend(passthrough.iter().cloned());

        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        // Atomic replace: the old snapshot stays intact until the new one
        // is fully on disk.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", tmp_path.display(), e)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}
