//! Configuration management for MeetPrep services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values
//!
//! The curated lexicon (organization names, stop words) and the relevance
//! weights are versioned here as well. They are read once at startup.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Candidate store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Search pipeline limits
    #[serde(default)]
    pub search: SearchConfig,

    /// Relevance scoring weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Curated word lists
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend: postgres, memory
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Per-pattern query timeout in milliseconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,

    /// JSON export of `documents` rows loaded by the memory backend
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Maximum ranked results returned per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum records fetched per pattern query
    #[serde(default = "default_per_pattern_limit")]
    pub per_pattern_limit: usize,

    /// Maximum records returned by the legacy single-pattern search
    #[serde(default = "default_simple_limit")]
    pub simple_limit: usize,

    /// Pattern queries in flight at once
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
}

/// Additive relevance weights. The defaults are empirical and kept for
/// behavioral compatibility.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// Per overlapping curated company
    #[serde(default = "default_company_match")]
    pub company_match: f64,

    /// Per overlapping inferred (heuristic) company
    #[serde(default = "default_company_match")]
    pub inferred_company_match: f64,

    /// Subtracted from generic "client meeting" candidates without overlap
    #[serde(default = "default_generic_penalty")]
    pub generic_penalty: f64,

    /// Cleaned base labels are equal
    #[serde(default = "default_base_label_match")]
    pub base_label_match: f64,

    /// Per overlapping specific keyword
    #[serde(default = "default_keyword_match")]
    pub keyword_match: f64,

    #[serde(default = "default_company_strategy_bonus")]
    pub company_strategy_bonus: f64,

    #[serde(default = "default_exact_base_strategy_bonus")]
    pub exact_base_strategy_bonus: f64,

    #[serde(default = "default_keyword_strategy_bonus")]
    pub keyword_strategy_bonus: f64,

    #[serde(default)]
    pub lenient_strategy_bonus: f64,

    /// Recency bonus decays linearly to zero over this many days
    #[serde(default = "default_recency_window_days")]
    pub recency_window_days: f64,

    /// Once any result scores above this, weak results are dropped
    #[serde(default = "default_strong_match_threshold")]
    pub strong_match_threshold: f64,

    /// Results at or below this are weak
    #[serde(default = "default_weak_match_threshold")]
    pub weak_match_threshold: f64,
}

/// Curated word lists, lowercase.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LexiconConfig {
    /// Known organization names, matched as substrings
    #[serde(default = "default_companies")]
    pub companies: Vec<String>,

    /// Words stripped before inferring a company from a label
    #[serde(default = "default_noise_words")]
    pub noise_words: Vec<String>,

    /// Words never kept as keywords
    #[serde(default = "default_keyword_stop_words")]
    pub keyword_stop_words: Vec<String>,

    /// Placeholder "companies" that never drive a company match
    #[serde(default = "default_generic_company_terms")]
    pub generic_company_terms: Vec<String>,

    /// Terms removed from a label to build the lenient pattern
    #[serde(default = "default_lenient_generic_terms")]
    pub lenient_generic_terms: Vec<String>,

    /// Keywords too generic to become a search pattern
    #[serde(default = "default_strategy_keyword_exclusions")]
    pub strategy_keyword_exclusions: Vec<String>,

    /// Keywords too generic to count toward relevance
    #[serde(default = "default_scoring_keyword_exclusions")]
    pub scoring_keyword_exclusions: Vec<String>,

    /// Phrase marking a generic, company-less meeting label
    #[serde(default = "default_generic_phrase")]
    pub generic_phrase: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_database_url() -> String { "postgres://localhost/meetprep".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_store_backend() -> String { "postgres".to_string() }
fn default_query_timeout() -> u64 { 5000 }
fn default_max_results() -> usize { 10 }
fn default_per_pattern_limit() -> usize { 20 }
fn default_simple_limit() -> usize { 5 }
fn default_max_concurrent_queries() -> usize { 4 }
fn default_company_match() -> f64 { 10.0 }
fn default_generic_penalty() -> f64 { 5.0 }
fn default_base_label_match() -> f64 { 5.0 }
fn default_keyword_match() -> f64 { 2.0 }
fn default_company_strategy_bonus() -> f64 { 3.0 }
fn default_exact_base_strategy_bonus() -> f64 { 2.0 }
fn default_keyword_strategy_bonus() -> f64 { 1.0 }
fn default_recency_window_days() -> f64 { 30.0 }
fn default_strong_match_threshold() -> f64 { 5.0 }
fn default_weak_match_threshold() -> f64 { 1.0 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "meetprep-search".to_string() }
fn default_generic_phrase() -> String { "client meeting".to_string() }

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_companies() -> Vec<String> {
    words(&[
        "ford", "meta", "google", "pepsico", "nvidia", "nividia", "microsoft",
        "amazon", "apple", "broadcom", "target", "nestle", "oracle", "salesforce",
        "ibm", "cisco", "intel", "amd", "qualcomm", "adobe",
    ])
}

fn default_noise_words() -> Vec<String> {
    words(&[
        "meeting", "call", "discussion", "session", "sync", "standup", "review",
        "kickoff", "client", "customer", "with", "the", "and", "for",
    ])
}

fn default_keyword_stop_words() -> Vec<String> {
    words(&[
        "the", "and", "for", "with", "our", "new", "from", "meeting", "call",
        "client", "customer", "discussion", "session", "sync",
    ])
}

fn default_generic_company_terms() -> Vec<String> {
    words(&["client", "meeting"])
}

fn default_lenient_generic_terms() -> Vec<String> {
    words(&["client", "meeting", "call"])
}

fn default_strategy_keyword_exclusions() -> Vec<String> {
    words(&["client", "meeting", "call", "discussion", "session"])
}

fn default_scoring_keyword_exclusions() -> Vec<String> {
    words(&["client", "meeting", "call", "discussion"])
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            query_timeout_ms: default_query_timeout(),
            seed_file: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            per_pattern_limit: default_per_pattern_limit(),
            simple_limit: default_simple_limit(),
            max_concurrent_queries: default_max_concurrent_queries(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            company_match: default_company_match(),
            inferred_company_match: default_company_match(),
            generic_penalty: default_generic_penalty(),
            base_label_match: default_base_label_match(),
            keyword_match: default_keyword_match(),
            company_strategy_bonus: default_company_strategy_bonus(),
            exact_base_strategy_bonus: default_exact_base_strategy_bonus(),
            keyword_strategy_bonus: default_keyword_strategy_bonus(),
            lenient_strategy_bonus: 0.0,
            recency_window_days: default_recency_window_days(),
            strong_match_threshold: default_strong_match_threshold(),
            weak_match_threshold: default_weak_match_threshold(),
        }
    }
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            companies: default_companies(),
            noise_words: default_noise_words(),
            keyword_stop_words: default_keyword_stop_words(),
            generic_company_terms: default_generic_company_terms(),
            lenient_generic_terms: default_lenient_generic_terms(),
            strategy_keyword_exclusions: default_strategy_keyword_exclusions(),
            scoring_keyword_exclusions: default_scoring_keyword_exclusions(),
            generic_phrase: default_generic_phrase(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__STORE__BACKEND=memory
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the per-pattern store timeout as Duration
    pub fn store_query_timeout(&self) -> Duration {
        Duration::from_millis(self.store.query_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.per_pattern_limit, 20);
        assert_eq!(config.store.backend, "postgres");
    }

    #[test]
    fn test_store_query_timeout() {
        let mut config = AppConfig::default();
        assert_eq!(config.store_query_timeout(), Duration::from_millis(5000));
        config.store.query_timeout_ms = 250;
        assert_eq!(config.store_query_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_default_scoring_weights() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.company_match, 10.0);
        assert_eq!(scoring.inferred_company_match, scoring.company_match);
        assert_eq!(scoring.generic_penalty, 5.0);
        assert_eq!(scoring.recency_window_days, 30.0);
    }

    #[test]
    fn test_default_lexicon_is_lowercase() {
        let lexicon = LexiconConfig::default();
        assert!(lexicon.companies.contains(&"ford".to_string()));
        assert!(lexicon
            .companies
            .iter()
            .chain(&lexicon.noise_words)
            .chain(&lexicon.keyword_stop_words)
            .all(|w| *w == w.to_lowercase()));
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = Config::builder()
            .set_override("store.backend", "memory")
            .and_then(|b| b.set_override("scoring.company_match", 12.0))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("config should deserialize");

        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.query_timeout_ms, 5000);
        assert_eq!(config.scoring.company_match, 12.0);
        assert_eq!(config.scoring.keyword_match, 2.0);
        assert_eq!(config.lexicon.generic_phrase, "client meeting");
    }
}
