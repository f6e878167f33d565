pub mod agenda_portal;
pub mod municipal_feed;
pub mod tomaticket;

use crate::config::Config;
use crate::types::SourceAdapter;
use std::sync::Arc;
use tracing::warn;

pub use agenda_portal::AgendaPortalSource;
pub use municipal_feed::MunicipalFeedSource;
pub use tomaticket::TomaTicketSource;

/// Some venue sites answer differently to unadorned HTTP clients.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Instantiate the adapters named in `enabled_sources`. Unknown names and
/// sources with no configured targets are skipped with a warning; they
/// must not fail the run.
pub fn build_sources(config: &Config) -> Vec<Arc<dyn SourceAdapter>> {
    let mut sources: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    for name in &config.enabled_sources {
        match name.as_str() {
            tomaticket::NAME => {
                if config.sources.tomaticket.is_empty() {
                    warn!("Source '{}' enabled but no venue pages configured", name);
                } else {
                    sources.push(Arc::new(TomaTicketSource::new(
                        config.sources.tomaticket.clone(),
                    )));
                }
            }
            municipal_feed::NAME => {
                if config.sources.feeds.is_empty() {
                    warn!("Source '{}' enabled but no feeds configured", name);
                } else {
                    sources.push(Arc::new(MunicipalFeedSource::new(
                        config.sources.feeds.clone(),
                    )));
                }
            }
            agenda_portal::NAME => match &config.sources.agenda_portal_url {
                Some(url) => sources.push(Arc::new(AgendaPortalSource::new(url.clone()))),
                None => warn!("Source '{}' enabled but no URL configured", name),
            },
            other => warn!("Unknown source '{}' in enabled_sources", other),
        }
    }
    sources
}
