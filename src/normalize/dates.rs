use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Inputs every date strategy needs: the run's "today" and the grace
/// window used to disambiguate year-less dates.
#[derive(Debug, Clone, Copy)]
pub struct DateContext {
    pub today: NaiveDate,
    pub grace_days: i64,
}

/// One heuristic for pulling a calendar date out of free text. Strategies
/// are tried in order until one yields a valid date.
pub type DateStrategy = fn(&str, &DateContext) -> Option<NaiveDate>;

pub const STRATEGIES: &[DateStrategy] = &[iso_date, numeric_date, spanish_month_date];

/// Resolve free text into a concrete calendar date, or None when no
/// strategy finds one (including calendar-invalid day/month combinations).
pub fn resolve_date(text: &str, ctx: &DateContext) -> Option<NaiveDate> {
    STRATEGIES.iter().find_map(|strategy| strategy(text, ctx))
}

static ISO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap());

/// `YYYY-MM-DD`, as found in `time[datetime]` attributes and hand-edited rows.
fn iso_date(text: &str, _ctx: &DateContext) -> Option<NaiveDate> {
    let caps = ISO_RE.captures(text)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})").unwrap());

/// `DD/MM/YYYY` or `DD-MM-YYYY`.
fn numeric_date(text: &str, _ctx: &DateContext) -> Option<NaiveDate> {
    let caps = NUMERIC_RE.captures(text)?;
    NaiveDate::from_ymd_opt(
        caps[3].parse().ok()?,
        caps[2].parse().ok()?,
        caps[1].parse().ok()?,
    )
}

const MONTHS_ES: [(&str, u32); 12] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{1,2})\s*(?:de\s+)?(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|octubre|noviembre|diciembre)",
    )
    .unwrap()
});

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|octubre|noviembre|diciembre)\s+(\d{1,2})",
    )
    .unwrap()
});

static EXPLICIT_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS_ES
        .iter()
        .find(|(month, _)| *month == lower)
        .map(|(_, n)| *n)
}

/// Day plus Spanish month name, e.g. "Sábado 27 de septiembre" or
/// "27 Septiembre". Sources almost never print a year, so one is inferred:
/// the date lands in the current year unless that puts it further in the
/// past than the grace window, in which case it rolls to next year. An
/// explicit 4-digit year anywhere in the text overrides the inference.
fn spanish_month_date(text: &str, ctx: &DateContext) -> Option<NaiveDate> {
    let (day, month) = if let Some(caps) = DAY_MONTH_RE.captures(text) {
        (caps[1].parse::<u32>().ok()?, month_number(&caps[2])?)
    } else if let Some(caps) = MONTH_DAY_RE.captures(text) {
        (caps[2].parse::<u32>().ok()?, month_number(&caps[1])?)
    } else {
        return None;
    };

    if let Some(caps) = EXPLICIT_YEAR_RE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let this_year = NaiveDate::from_ymd_opt(ctx.today.year(), month, day)?;
    if (ctx.today - this_year).num_days() > ctx.grace_days {
        NaiveDate::from_ymd_opt(ctx.today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(today: (i32, u32, u32)) -> DateContext {
        DateContext {
            today: NaiveDate::from_ymd_opt(today.0, today.1, today.2).unwrap(),
            grace_days: 60,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_date_wins_first() {
        let resolved = resolve_date("2025-09-27 en el Teatro Regio", &ctx((2025, 1, 1)));
        assert_eq!(resolved, Some(date(2025, 9, 27)));
    }

    #[test]
    fn test_numeric_date() {
        let resolved = resolve_date("El 27/09/2025 a las 20:00", &ctx((2025, 1, 1)));
        assert_eq!(resolved, Some(date(2025, 9, 27)));
    }

    #[test]
    fn test_recent_past_stays_in_current_year() {
        // January 15 seen on January 20: 5 days past, within the 60-day
        // grace window, so the event keeps the current year.
        let resolved = resolve_date("15 de enero", &ctx((2025, 1, 20)));
        assert_eq!(resolved, Some(date(2025, 1, 15)));
    }

    #[test]
    fn test_far_past_rolls_to_next_year() {
        // January 15 seen on June 1: far beyond the grace window, so the
        // listing must refer to next January.
        let resolved = resolve_date("15 de enero", &ctx((2025, 6, 1)));
        assert_eq!(resolved, Some(date(2026, 1, 15)));
    }

    #[test]
    fn test_future_date_keeps_current_year() {
        let resolved = resolve_date("27 de septiembre", &ctx((2025, 6, 1)));
        assert_eq!(resolved, Some(date(2025, 9, 27)));
    }

    #[test]
    fn test_explicit_year_overrides_inference() {
        let resolved = resolve_date("15 de enero de 2024", &ctx((2025, 6, 1)));
        assert_eq!(resolved, Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_weekday_prefix_and_capitalized_month() {
        let resolved = resolve_date("Sábado 27 de Septiembre, 19:30", &ctx((2025, 6, 1)));
        assert_eq!(resolved, Some(date(2025, 9, 27)));
    }

    #[test]
    fn test_month_before_day_order() {
        let resolved = resolve_date("Septiembre 27", &ctx((2025, 6, 1)));
        assert_eq!(resolved, Some(date(2025, 9, 27)));
    }

    #[test]
    fn test_invalid_day_of_month_rejected() {
        assert_eq!(resolve_date("31 de junio", &ctx((2025, 1, 1))), None);
        assert_eq!(resolve_date("2025-02-30", &ctx((2025, 1, 1))), None);
    }

    #[test]
    fn test_no_date_at_all() {
        assert_eq!(resolve_date("Gran gala benéfica", &ctx((2025, 1, 1))), None);
    }
}
