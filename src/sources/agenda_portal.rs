use crate::error::FetchError;
use crate::types::{CandidateEvent, SourceAdapter};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

pub const NAME: &str = "agenda_portal";
const SOURCE_LABEL: &str = "Agenda local";

const CARD_SELECTORS: [&str; 4] = [
    "div[class*='agenda-item']",
    "article[class*='event']",
    "li[class*='event']",
    "div[class*='event']",
];

/// Scheme + host of a page URL, for resolving root-relative links.
fn page_origin(page_url: &str) -> &str {
    let Some(scheme_end) = page_url.find("://").map(|i| i + 3) else {
        return page_url;
    };
    match page_url[scheme_end..].find('/') {
        Some(path_start) => &page_url[..scheme_end + path_start],
        None => page_url,
    }
}

fn absolutize(href: &str, page_url: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", page_origin(page_url), href)
    } else {
        page_url.to_string()
    }
}

fn first_text(card: &ElementRef, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    card.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

/// Extract candidates from the aggregator's agenda page. A `time` element
/// with a machine-readable datetime is preferred over whatever date text
/// the theme renders.
pub fn parse_agenda_page(html: &str, page_url: &str) -> Vec<CandidateEvent> {
    let document = Html::parse_document(html);
    let time_selector = Selector::parse("time[datetime]").unwrap();
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
        let Some(title) =
            first_text(&card, "h2, h3, h4").or_else(|| first_text(&card, "[class*='title']"))
        else {
            continue;
        };

        let date_text = card
            .select(&time_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .map(|s| s.to_string())
            .or_else(|| first_text(&card, "[class*='date'], [class*='fecha']"));
        let Some(raw_date_text) = date_text else {
            continue;
        };

        let venue_text =
            first_text(&card, "[class*='venue'], [class*='lugar'], [class*='location']");
        let description_text = first_text(&card, "p");

        let source_url = card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolutize(href, page_url))
            .unwrap_or_else(|| page_url.to_string());

        candidates.push(CandidateEvent {
            title,
            raw_date_text,
            raw_time_text: None,
            venue_text,
            price_text: None,
            description_text,
            source_url,
            source_name: SOURCE_LABEL.to_string(),
        });
    }
    candidates
}

/// Crawler for the local agenda aggregator page.
pub struct AgendaPortalSource {
    client: reqwest::Client,
    url: String,
}

impl AgendaPortalSource {
    pub fn new(url: String) -> Self {
        Self {
            client: super::http_client(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for AgendaPortalSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<CandidateEvent>, FetchError> {
        info!("Fetching agenda portal {}", self.url);
        let html = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let candidates = parse_agenda_page(&html, &self.url);
        if candidates.is_empty() {
            warn!("No events found on agenda portal - the page structure may have changed");
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
          <ul>
            <li class="event-row">
              <h3>Noche de monólogos</h3>
              <time datetime="2025-11-08">8 de noviembre</time>
              <span class="lugar">Casa de la Cultura</span>
              <p>Humor en directo, entrada libre.</p>
              <a href="/agenda/monologos">Ver</a>
            </li>
            <li class="event-row">
              <h3>Mercadillo navideño</h3>
              <span class="fecha">14 de diciembre</span>
            </li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_datetime_attribute_preferred_over_text() {
        let candidates = parse_agenda_page(FIXTURE, "https://portal.test/agenda/");
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.title, "Noche de monólogos");
        assert_eq!(first.raw_date_text, "2025-11-08");
        assert_eq!(first.venue_text.as_deref(), Some("Casa de la Cultura"));
        assert_eq!(first.source_url, "https://portal.test/agenda/monologos");

        let second = &candidates[1];
        assert_eq!(second.raw_date_text, "14 de diciembre");
        assert_eq!(second.source_url, "https://portal.test/agenda/");
    }

    #[test]
    fn test_root_relative_href_joins_host_not_page_path() {
        // A root-relative link must not inherit the agenda page's path.
        assert_eq!(
            absolutize("/agenda/monologos", "https://portal.test/agenda/"),
            "https://portal.test/agenda/monologos"
        );
        assert_eq!(
            absolutize("https://external.test/x", "https://portal.test/agenda/"),
            "https://external.test/x"
        );
        assert_eq!(
            absolutize("ver-mas", "https://portal.test/agenda/"),
            "https://portal.test/agenda/"
        );
    }
}
