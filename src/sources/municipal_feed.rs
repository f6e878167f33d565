use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::types::{CandidateEvent, SourceAdapter};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{info, warn};

pub const NAME: &str = "municipal_feeds";

/// A news item only becomes a candidate if it reads like an event
/// announcement; town-hall feeds mix events with plain news.
const EVENT_KEYWORDS: [&str; 15] = [
    "programa",
    "eventos",
    "concierto",
    "teatro",
    "festival",
    "feria",
    "fiestas",
    "actuación",
    "espectáculo",
    "exposición",
    "taller",
    "charla",
    "jornada",
    "encuentro",
    "celebra",
];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

fn looks_like_event(text: &str) -> bool {
    let haystack = text.to_lowercase();
    EVENT_KEYWORDS.iter().any(|kw| haystack.contains(kw))
}

/// HTML entities that make feed XML unparseable.
fn scrub_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

/// Extract candidates from one RSS document. The date is left for the
/// normalizer to dig out of the prose; feeds never carry a structured
/// event date.
pub fn parse_feed(xml: &str, feed_name: &str) -> Result<Vec<CandidateEvent>, FetchError> {
    let cleaned = scrub_entities_for_xml(xml);
    let rss: Rss = from_str(&cleaned).map_err(|e| FetchError::Parse(e.to_string()))?;

    let mut candidates = Vec::new();
    for item in rss.channel.items {
        let title = item.title.unwrap_or_default();
        let description = item.description.unwrap_or_default();
        if title.trim().is_empty() {
            continue;
        }
        if !looks_like_event(&format!("{title} {description}")) {
            continue;
        }
        let Some(link) = item.link.filter(|l| !l.trim().is_empty()) else {
            continue;
        };

        candidates.push(CandidateEvent {
            raw_date_text: format!("{title} {description}"),
            title,
            raw_time_text: None,
            venue_text: None,
            price_text: None,
            description_text: Some(description),
            source_url: link,
            source_name: feed_name.to_string(),
        });
    }
    Ok(candidates)
}

/// Crawler over the configured municipal and local-press RSS feeds.
pub struct MunicipalFeedSource {
    client: reqwest::Client,
    feeds: Vec<FeedConfig>,
}

impl MunicipalFeedSource {
    pub fn new(feeds: Vec<FeedConfig>) -> Self {
        Self {
            client: super::http_client(),
            feeds,
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for MunicipalFeedSource {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self) -> Result<Vec<CandidateEvent>, FetchError> {
        let mut candidates = Vec::new();
        let mut last_error: Option<FetchError> = None;

        for feed in &self.feeds {
            info!("Fetching feed {}", feed.name);
            let result = async {
                let xml = self
                    .client
                    .get(&feed.url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                parse_feed(&xml, &feed.name)
            }
            .await;

            match result {
                Ok(found) => candidates.extend(found),
                Err(e) => {
                    // One broken feed should not silence the others.
                    warn!("Feed {} failed: {}", feed.name, e);
                    last_error = Some(e);
                }
            }
        }

        if candidates.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(candidates)
    }
}
