//! Curated word lists used to read meeting labels
//!
//! Built once from [`LexiconConfig`] at startup and shared read-only between
//! the extractor, the strategy generator and the aggregator.

use meetprep_common::config::LexiconConfig;
use meetprep_common::errors::{AppError, Result};
use regex_lite::Regex;
use std::collections::HashSet;

/// Immutable, lowercase view of the configured word lists
#[derive(Debug, Clone)]
pub struct Lexicon {
    companies: Vec<String>,
    noise_words: HashSet<String>,
    keyword_stop_words: HashSet<String>,
    generic_company_terms: HashSet<String>,
    strategy_keyword_exclusions: HashSet<String>,
    scoring_keyword_exclusions: HashSet<String>,
    generic_phrase: String,

    noise_matcher: Option<Regex>,
    generic_company_matcher: Option<Regex>,
    lenient_matcher: Option<Regex>,
}

impl Lexicon {
    /// Build from configuration
    pub fn from_config(config: &LexiconConfig) -> Result<Self> {
        let mut companies: Vec<String> = Vec::with_capacity(config.companies.len());
        for company in normalize(&config.companies) {
            if !company.is_empty() && !companies.contains(&company) {
                companies.push(company);
            }
        }

        Ok(Self {
            companies,
            noise_words: normalize(&config.noise_words).collect(),
            keyword_stop_words: normalize(&config.keyword_stop_words).collect(),
            generic_company_terms: normalize(&config.generic_company_terms).collect(),
            strategy_keyword_exclusions: normalize(&config.strategy_keyword_exclusions).collect(),
            scoring_keyword_exclusions: normalize(&config.scoring_keyword_exclusions).collect(),
            generic_phrase: config.generic_phrase.trim().to_lowercase(),
            noise_matcher: whole_word_matcher(&config.noise_words)?,
            generic_company_matcher: whole_word_matcher(&config.generic_company_terms)?,
            lenient_matcher: whole_word_matcher(&config.lenient_generic_terms)?,
        })
    }

    /// Known organization names in configured order
    pub fn companies(&self) -> &[String] {
        &self.companies
    }

    pub fn is_noise_word(&self, word: &str) -> bool {
        self.noise_words.contains(word)
    }

    pub fn is_keyword_stop_word(&self, word: &str) -> bool {
        self.keyword_stop_words.contains(word)
    }

    /// Placeholder names such as "client" that never identify a company
    pub fn is_generic_company(&self, name: &str) -> bool {
        self.generic_company_terms.contains(name)
    }

    pub fn is_strategy_keyword_excluded(&self, keyword: &str) -> bool {
        self.strategy_keyword_exclusions.contains(keyword)
    }

    pub fn is_scoring_keyword_excluded(&self, keyword: &str) -> bool {
        self.scoring_keyword_exclusions.contains(keyword)
    }

    /// Phrase marking a label as a generic, company-less meeting
    pub fn generic_phrase(&self) -> &str {
        &self.generic_phrase
    }

    /// Remove whole-word noise terms ("meeting", "with", ...)
    pub fn strip_noise_words(&self, text: &str) -> String {
        strip_words(self.noise_matcher.as_ref(), text)
    }

    /// Remove whole-word generic company placeholders ("client", "meeting")
    pub fn strip_generic_company_terms(&self, text: &str) -> String {
        strip_words(self.generic_company_matcher.as_ref(), text)
    }

    /// Remove whole-word terms too generic for the lenient pattern
    pub fn strip_lenient_terms(&self, text: &str) -> String {
        strip_words(self.lenient_matcher.as_ref(), text)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::from_config(&LexiconConfig::default()).expect("built-in lexicon is valid")
    }
}

fn normalize(words: &[String]) -> impl Iterator<Item = String> + '_ {
    words.iter().map(|w| w.trim().to_lowercase())
}

/// Case-insensitive `\b(a|b|c)\b` over the escaped words; `None` for an
/// empty list
fn whole_word_matcher(words: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = normalize(words)
        .filter(|w| !w.is_empty())
        .map(|w| regex_lite::escape(&w))
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| AppError::Configuration {
            message: format!("invalid lexicon word list: {}", e),
        })
}

fn strip_words(matcher: Option<&Regex>, text: &str) -> String {
    match matcher {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}
