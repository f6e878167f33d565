use crate::error::{Result, SyncError};
use crate::types::Category;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One row of the ordered category keyword table. Table order is priority
/// order: the first category whose keyword matches wins.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// A ticket-vendor venue page to crawl.
#[derive(Debug, Clone, Deserialize)]
pub struct VenuePage {
    pub venue: String,
    pub url: String,
}

/// An RSS feed to poll.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SourcesConfig {
    /// Venue pages for the ticket-vendor crawler.
    pub tomaticket: Vec<VenuePage>,
    /// RSS feeds for the municipal/press crawler.
    pub feeds: Vec<FeedConfig>,
    /// Aggregator agenda page URL.
    pub agenda_portal_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Day-count controlling both date-inference rollover and how long an
    /// automated record survives past its date without being re-seen.
    pub grace_days: i64,
    /// When false, automated records are never expired by absence.
    pub expire_past_events: bool,
    /// Per-source fetch timeout.
    pub source_timeout_seconds: u64,
    /// Which adapters run. Unknown names are logged and skipped.
    pub enabled_sources: Vec<String>,
    /// Path of the JSON store file.
    pub store_path: PathBuf,
    pub sources: SourcesConfig,
    /// Ordered classification table; first match wins.
    pub categories: Vec<CategoryKeywords>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grace_days: 60,
            expire_past_events: false,
            source_timeout_seconds: 30,
            enabled_sources: vec![
                "tomaticket".to_string(),
                "municipal_feeds".to_string(),
                "agenda_portal".to_string(),
            ],
            store_path: PathBuf::from("eventos_agenda.json"),
            sources: SourcesConfig {
                tomaticket: vec![
                    VenuePage {
                        venue: "Teatro Regio".to_string(),
                        url: "https://www.tomaticket.es/es-es/recintos/teatro-regio-almansa"
                            .to_string(),
                    },
                    VenuePage {
                        venue: "Teatro Principal".to_string(),
                        url: "https://www.tomaticket.es/es-es/recintos/teatro-principal-almansa"
                            .to_string(),
                    },
                ],
                feeds: vec![
                    FeedConfig {
                        name: "Ayuntamiento - Actualidad".to_string(),
                        url: "https://almansa.es/category/actualidad/feed/".to_string(),
                    },
                    FeedConfig {
                        name: "Ayuntamiento - Cultura".to_string(),
                        url: "https://almansa.es/category/cultura/feed/".to_string(),
                    },
                    FeedConfig {
                        name: "La Tinta RSS".to_string(),
                        url: "https://latintadealmansa.com/feed/".to_string(),
                    },
                ],
                agenda_portal_url: Some("https://dealmansa.com/agenda/".to_string()),
            },
            categories: default_category_table(),
        }
    }
}

/// Built-in classification table mirroring the curated keyword lists the
/// sheet operators maintain. Order matters.
fn default_category_table() -> Vec<CategoryKeywords> {
    fn entry(category: Category, keywords: &[&str]) -> CategoryKeywords {
        CategoryKeywords {
            category,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
    vec![
        entry(
            Category::Music,
            &["concierto", "música", "recital", "banda", "orquesta", "coral"],
        ),
        entry(Category::Theatre, &["teatro", "obra", "comedia", "drama"]),
        entry(
            Category::Kids,
            &["infantil", "niños", "niñas", "familia", "cuentacuentos", "animación"],
        ),
        entry(Category::Dance, &["danza", "ballet", "flamenco", "baile"]),
        entry(
            Category::Comedy,
            &["humor", "monólogo", "cómico", "stand up", "monólogos"],
        ),
        entry(Category::Cinema, &["cine", "película", "proyección", "documental"]),
        entry(
            Category::Sport,
            &["deporte", "carrera", "atletismo", "fútbol", "maratón"],
        ),
        entry(
            Category::Festival,
            &["feria", "fiesta", "festival", "batalla", "moros", "procesión"],
        ),
    ]
}

impl Config {
    /// Load configuration from a TOML file, falling back to built-in
    /// defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.grace_days < 0 {
            return Err(SyncError::Config("grace_days must be >= 0".to_string()));
        }
        if self.source_timeout_seconds == 0 {
            return Err(SyncError::Config(
                "source_timeout_seconds must be > 0".to_string(),
            ));
        }
        for entry in &self.categories {
            if entry.keywords.is_empty() {
                return Err(SyncError::Config(format!(
                    "category {} has an empty keyword list",
                    entry.category.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Expiry grace window: None disables automated expiry entirely.
    pub fn expiry_grace_days(&self) -> Option<i64> {
        if self.expire_past_events {
            Some(self.grace_days)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grace_days, 60);
        assert_eq!(config.expiry_grace_days(), None);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
            grace_days = 7
            expire_past_events = true
            enabled_sources = ["tomaticket"]

            [[categories]]
            category = "MUSIC"
            keywords = ["concierto"]

            [[sources.tomaticket]]
            venue = "Teatro Regio"
            url = "https://example.test/regio"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.grace_days, 7);
        assert_eq!(config.expiry_grace_days(), Some(7));
        assert_eq!(config.enabled_sources, vec!["tomaticket"]);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].category, Category::Music);
        assert_eq!(config.sources.tomaticket.len(), 1);
    }

    #[test]
    fn test_negative_grace_days_rejected() {
        let config = Config {
            grace_days: -1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
