use crate::config::VenuePage;
use crate::error::FetchError;
use crate::types::{CandidateEvent, SourceAdapter};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

pub const NAME: &str = "tomaticket";
const SOURCE_LABEL: &str = "TomaTicket";
const BASE_URL: &str = "https://www.tomaticket.es";

/// Card container selectors, most specific first. The vendor reshuffles
/// its markup periodically, so each is tried until one yields cards.
const CARD_SELECTORS: [&str; 3] = [
    "article[class*='event']",
    "div[class*='event']",
    "div[class*='card']",
];

const TITLE_SELECTORS: [&str; 4] = [
    "h2[class*='title'], h3[class*='title'], a[class*='title']",
    "h2",
    "h3",
    "h4",
];

static DATE_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d{1,2}\s*(?:de\s+)?(?:Enero|Febrero|Marzo|Abril|Mayo|Junio|Julio|Agosto|Septiembre|Octubre|Noviembre|Diciembre)(?:\s+(?:de\s+)?\d{4})?",
    )
    .unwrap()
});

static PRICE_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)desde\s*\d+(?:[.,]\d{1,2})?\s*€").unwrap());

/// Crawler for the ticket vendor's per-venue listing pages.
pub struct TomaTicketSource {
    client: reqwest::Client,
    venues: Vec<VenuePage>,
}

impl TomaTicketSource {
    pub fn new(venues: Vec<VenuePage>) -> Self {
        Self {
            client: super::http_client(),
            venues,
        }
    }
}

fn select_first_text(card: &ElementRef, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let selector = Selector::parse(selector_str).ok()?;
        if let Some(element) = card.select(&selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn absolutize(href: &str, page_url: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{BASE_URL}{href}")
    } else {
        page_url.to_string()
    }
}

/// Extract candidates from one venue page. Separated from the HTTP fetch
/// so fixtures can exercise it directly.
pub fn parse_venue_page(html: &str, venue: &str, page_url: &str) -> Vec<CandidateEvent> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    let mut cards: Vec<ElementRef> = Vec::new();
    for selector_str in CARD_SELECTORS {
        let selector = Selector::parse(selector_str).unwrap();
        cards = document.select(&selector).collect();
        if !cards.is_empty() {
            break;
        }
    }

    let mut candidates = Vec::new();
    for card in cards {
        let Some(title) = select_first_text(&card, &TITLE_SELECTORS) else {
            continue;
        };
        if title.to_lowercase().contains("cookie") {
            continue;
        }

        let card_text = card.text().collect::<String>();
        // No recognizable date text means this block is navigation chrome,
        // not an event card.
        let Some(date_match) = DATE_TEXT_RE.find(&card_text) else {
            continue;
        };

        let price_text = PRICE_TEXT_RE
            .find(&card_text)
            .map(|m| m.as_str().to_string());

        let source_url = card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolutize(href, page_url))
            .unwrap_or_else(|| page_url.to_string());

        candidates.push(CandidateEvent {
            title,
            raw_date_text: date_match.as_str().to_string(),
            raw_time_text: None,
            venue_text: Some(venue.to_string()),
            price_text,
            description_text: None,
            source_url,
            source_name: SOURCE_LABEL.to_string(),
        });
    }
    candidates
}

#[async_trait::async_trait]
impl SourceAdapter for TomaTicketSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<CandidateEvent>, FetchError> {
        let mut candidates = Vec::new();
        for page in &self.venues {
            info!("Fetching TomaTicket listings for {}", page.venue);
            let html = self
                .client
                .get(&page.url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            let found = parse_venue_page(&html, &page.venue, &page.url);
            if found.is_empty() {
                warn!(
                    "No events found for {} - the page structure may have changed",
                    page.venue
                );
            }
            candidates.extend(found);
        }
        Ok(candidates)
    }
}
