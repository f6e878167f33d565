pub mod category;
pub mod dates;
pub mod extract;
pub mod title;

use crate::config::Config;
use crate::error::NormalizeError;
use crate::fingerprint;
use crate::types::{CandidateEvent, NormalizedEvent};
use chrono::NaiveDate;
use dates::DateContext;
use tracing::debug;

const MIN_TITLE_CHARS: usize = 5;

/// Fallback venue text when no source gives one; kept stable because the
/// venue participates in the fingerprint.
const UNCONFIRMED_VENUE: &str = "Por confirmar";

/// Turn one raw candidate into a normalized event, or reject it with a
/// reason. Pure over (candidate, today, config); safe to run per candidate
/// in any order.
pub fn normalize(
    candidate: &CandidateEvent,
    today: NaiveDate,
    config: &Config,
) -> Result<NormalizedEvent, NormalizeError> {
    if candidate.source_name.trim().is_empty() {
        return Err(NormalizeError::MissingField("source_name"));
    }
    if candidate.source_url.trim().is_empty() {
        return Err(NormalizeError::MissingField("source_url"));
    }

    let cleaned_title = title::clean_title(&candidate.title);
    if title::meaningful_len(&cleaned_title) < MIN_TITLE_CHARS {
        return Err(NormalizeError::TitleTooShort(cleaned_title));
    }

    let description = candidate
        .description_text
        .as_deref()
        .map(extract::clean_description)
        .unwrap_or_default();

    // Date lives in the dedicated field when the adapter found one, but
    // feed items often only carry it inside the prose.
    let ctx = DateContext {
        today,
        grace_days: config.grace_days,
    };
    let date_text = if candidate.raw_date_text.trim().is_empty() {
        &description
    } else {
        &candidate.raw_date_text
    };
    if date_text.trim().is_empty() {
        return Err(NormalizeError::MissingField("raw_date_text"));
    }
    let date = dates::resolve_date(date_text, &ctx)
        .ok_or_else(|| NormalizeError::InvalidDate(date_text.trim().to_string()))?;

    let time = candidate
        .raw_time_text
        .as_deref()
        .and_then(extract::extract_time)
        .or_else(|| extract::extract_time(&description));

    let venue = candidate
        .venue_text
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| extract::extract_venue(v).unwrap_or_else(|| v.to_string()))
        .or_else(|| extract::extract_venue(&description))
        .unwrap_or_else(|| UNCONFIRMED_VENUE.to_string());

    let price = match candidate.price_text.as_deref() {
        Some(text) if !text.trim().is_empty() => extract::extract_price(text),
        _ => extract::extract_price(&description),
    };

    let category = category::classify(
        &format!("{} {}", cleaned_title, description),
        &config.categories,
    );

    let fingerprint = fingerprint::fingerprint(&cleaned_title, date, &venue);
    debug!(title = %cleaned_title, %date, %venue, "normalized candidate");

    Ok(NormalizedEvent {
        title: cleaned_title,
        date,
        time,
        venue,
        category,
        price,
        description,
        source_name: candidate.source_name.clone(),
        source_url: candidate.source_url.clone(),
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Price};
    use chrono::NaiveTime;

    fn candidate() -> CandidateEvent {
        CandidateEvent {
            title: "Concierto de Año Nuevo en 21".to_string(),
            raw_date_text: "01 enero".to_string(),
            raw_time_text: Some("a las 19:30".to_string()),
            venue_text: Some("Teatro Regio".to_string()),
            price_text: Some("Desde 15 €".to_string()),
            description_text: Some("<p>Gran concierto de la orquesta sinfónica.</p>".to_string()),
            source_url: "https://example.test/evento".to_string(),
            source_name: "TomaTicket".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 10).unwrap()
    }

    #[test]
    fn test_normalize_full_candidate() {
        let event = normalize(&candidate(), today(), &Config::default()).unwrap();
        assert_eq!(event.title, "Concierto de Año Nuevo");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(event.time, NaiveTime::from_hms_opt(19, 30, 0));
        assert_eq!(event.venue, "Teatro Regio");
        assert_eq!(event.category, Category::Music);
        assert_eq!(event.price, Price::Amount { euros: 15.0 });
        assert_eq!(event.description, "Gran concierto de la orquesta sinfónica.");
    }

    #[test]
    fn test_short_title_rejected() {
        let mut c = candidate();
        c.title = "Gala".to_string();
        let err = normalize(&c, today(), &Config::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::TitleTooShort(_)));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut c = candidate();
        c.raw_date_text = "31 de junio".to_string();
        let err = normalize(&c, today(), &Config::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidDate(_)));
        assert_eq!(err.reason(), "invalid-date");
    }

    #[test]
    fn test_missing_source_rejected() {
        let mut c = candidate();
        c.source_name = String::new();
        let err = normalize(&c, today(), &Config::default()).unwrap_err();
        assert_eq!(err, NormalizeError::MissingField("source_name"));
    }

    #[test]
    fn test_date_recovered_from_description() {
        let mut c = candidate();
        c.raw_date_text = String::new();
        c.description_text = Some("Actuación el 27 de septiembre a las 20:00".to_string());
        let event = normalize(&c, today(), &Config::default()).unwrap();
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 9, 27).unwrap());
    }

    #[test]
    fn test_unknown_sentinels_when_fields_absent() {
        let c = CandidateEvent {
            title: "Velada poética municipal".to_string(),
            raw_date_text: "12 de marzo".to_string(),
            raw_time_text: None,
            venue_text: None,
            price_text: None,
            description_text: None,
            source_url: "https://example.test".to_string(),
            source_name: "Ayuntamiento".to_string(),
        };
        let event = normalize(&c, today(), &Config::default()).unwrap();
        assert_eq!(event.time, None);
        assert_eq!(event.price, Price::Unknown);
        assert_eq!(event.venue, UNCONFIRMED_VENUE);
    }

    #[test]
    fn test_same_event_from_two_sources_shares_fingerprint() {
        let a = normalize(&candidate(), today(), &Config::default()).unwrap();

        let b_raw = CandidateEvent {
            title: "concierto de año nuevo".to_string(),
            raw_date_text: "2025-01-01".to_string(),
            venue_text: Some("teatro regio".to_string()),
            raw_time_text: None,
            price_text: None,
            description_text: None,
            source_url: "https://other.test".to_string(),
            source_name: "Agenda local".to_string(),
        };
        let b = normalize(&b_raw, today(), &Config::default()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}
