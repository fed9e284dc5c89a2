//! Entity extraction from free-text meeting labels
//!
//! Derives company candidates, a base label (sequence suffix removed) and a
//! keyword set from labels such as "Ford EV Migration - 3". Extraction is
//! pure and total: any input, including empty or symbol-only text, yields a
//! bundle.

use crate::lexicon::Lexicon;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum token length for an inferred company
const MIN_INFERRED_COMPANY_LEN: usize = 4;

/// Minimum keyword length
const MIN_KEYWORD_LEN: usize = 3;

/// How a company candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyConfidence {
    /// Matched the curated organization list
    Curated,
    /// First significant token of a label with no curated match
    Inferred,
}

/// A company named (or probably named) by a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCandidate {
    pub name: String,
    pub confidence: CompanyConfidence,
}

/// Structured hints derived from one label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBundle {
    /// Company candidates, in detection order
    pub companies: Vec<CompanyCandidate>,

    /// Label without a trailing " - <n>" sequence suffix, case preserved
    pub base_label: String,

    /// Distinct keywords, in first-seen order
    pub keywords: Vec<String>,
}

impl EntityBundle {
    /// Company names in detection order
    pub fn company_names(&self) -> impl Iterator<Item = &str> {
        self.companies.iter().map(|c| c.name.as_str())
    }

    pub fn has_company(&self, name: &str) -> bool {
        self.companies.iter().any(|c| c.name == name)
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

/// Turns meeting labels into [`EntityBundle`]s
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    lexicon: Arc<Lexicon>,
}

impl EntityExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Extract entities from a label
    pub fn extract(&self, label: &str) -> EntityBundle {
        let normalized = label.trim().to_lowercase();

        let mut companies = self.detect_companies(&normalized);
        if companies.is_empty() {
            companies.extend(self.infer_company(&normalized));
        }

        EntityBundle {
            companies,
            base_label: strip_sequence_suffix(label).trim().to_string(),
            keywords: self.keywords(&normalized),
        }
    }

    /// Every curated organization appearing anywhere in the label
    fn detect_companies(&self, normalized: &str) -> Vec<CompanyCandidate> {
        self.lexicon
            .companies()
            .iter()
            .filter(|company| normalized.contains(company.as_str()))
            .map(|company| CompanyCandidate {
                name: company.clone(),
                confidence: CompanyConfidence::Curated,
            })
            .collect()
    }

    /// Best-effort guess: first significant token once noise words and
    /// punctuation are gone
    fn infer_company(&self, normalized: &str) -> Option<CompanyCandidate> {
        let cleaned: String = self
            .lexicon
            .strip_noise_words(normalized)
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        cleaned
            .split_whitespace()
            .find(|token| {
                token.chars().count() >= MIN_INFERRED_COMPANY_LEN
                    && !token.chars().all(|c| c.is_ascii_digit())
                    && !self.lexicon.is_noise_word(token)
                    && !self.lexicon.is_generic_company(token)
            })
            .map(|token| CompanyCandidate {
                name: token.to_string(),
                confidence: CompanyConfidence::Inferred,
            })
    }

    fn keywords(&self, normalized: &str) -> Vec<String> {
        let spaced: String = normalized
            .chars()
            .map(|c| if c.is_ascii_digit() || c == '-' { ' ' } else { c })
            .collect();

        let mut keywords: Vec<String> = Vec::new();
        for word in spaced.split_whitespace() {
            if word.chars().count() < MIN_KEYWORD_LEN || self.lexicon.is_keyword_stop_word(word) {
                continue;
            }
            if !keywords.iter().any(|k| k == word) {
                keywords.push(word.to_string());
            }
        }
        keywords
    }
}

/// Strip a trailing `<spaces>-<spaces><digits>` suffix; other labels are
/// returned unchanged
pub fn strip_sequence_suffix(label: &str) -> &str {
    let without_digits = label.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == label.len() {
        return label;
    }

    match without_digits.trim_end().strip_suffix('-') {
        Some(rest) => rest.trim_end(),
        None => label,
    }
}
