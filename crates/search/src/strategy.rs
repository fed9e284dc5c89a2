//! Search strategy generation
//!
//! Each strategy is a family of `ILIKE`-style patterns (`%` any run, `_` any
//! single character) derived from an [`EntityBundle`]. Strategies are emitted
//! in priority order; the order is significant because the first occurrence
//! of a title wins during deduplication.

use crate::entities::EntityBundle;
use crate::lexicon::Lexicon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Keywords must be longer than this to become a pattern
const MIN_STRATEGY_KEYWORD_LEN: usize = 4;

/// Keyword patterns per search
const MAX_KEYWORD_PATTERNS: usize = 2;

/// Lenient patterns must be longer than this
const MIN_LENIENT_LEN: usize = 4;

/// Strategy families, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CompanySpecific,
    ExactBase,
    SpecificKeywords,
    LenientSpecific,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CompanySpecific => "company_specific",
            StrategyKind::ExactBase => "exact_base",
            StrategyKind::SpecificKeywords => "specific_keywords",
            StrategyKind::LenientSpecific => "lenient_specific",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategy and the patterns it queries, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStrategy {
    pub kind: StrategyKind,
    pub patterns: Vec<String>,
}

impl MatchStrategy {
    fn new(kind: StrategyKind, patterns: Vec<String>) -> Self {
        Self { kind, patterns }
    }
}

/// Builds the ordered strategy list for a label
#[derive(Debug, Clone)]
pub struct StrategyGenerator {
    lexicon: Arc<Lexicon>,
}

impl StrategyGenerator {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Generate strategies for `label`, whose entities are `entities`.
    /// May be empty.
    pub fn generate(&self, entities: &EntityBundle, label: &str) -> Vec<MatchStrategy> {
        let mut strategies = Vec::new();

        let specific_companies: Vec<&str> = entities
            .company_names()
            .filter(|name| !self.lexicon.is_generic_company(name))
            .collect();

        for company in &specific_companies {
            strategies.push(MatchStrategy::new(
                StrategyKind::CompanySpecific,
                vec![
                    format!("{}%", company),
                    format!("%{}%", company),
                    format!("{} %", company),
                    format!("% {}%", company),
                ],
            ));
        }

        if let Some(strategy) = self.exact_base(entities, label) {
            strategies.push(strategy);
        }

        let keyword_patterns: Vec<String> = entities
            .keywords
            .iter()
            .filter(|kw| {
                !self.lexicon.is_strategy_keyword_excluded(kw)
                    && kw.chars().count() >= MIN_STRATEGY_KEYWORD_LEN
            })
            .take(MAX_KEYWORD_PATTERNS)
            .map(|kw| format!("%{}%", kw))
            .collect();

        if !keyword_patterns.is_empty() {
            strategies.push(MatchStrategy::new(StrategyKind::SpecificKeywords, keyword_patterns));
        }

        if !specific_companies.is_empty() {
            let lenient = self.lenient_pattern(label);
            if lenient.chars().count() >= MIN_LENIENT_LEN {
                strategies.push(MatchStrategy::new(
                    StrategyKind::LenientSpecific,
                    vec![format!("%{}%", lenient)],
                ));
            }
        }

        strategies
    }

    /// Numbered continuations of the same base label
    fn exact_base(&self, entities: &EntityBundle, label: &str) -> Option<MatchStrategy> {
        let base = entities.base_label.as_str();
        if base == label || base.to_lowercase().contains(self.lexicon.generic_phrase()) {
            return None;
        }

        let collapsed = collapse_whitespace(base);
        let mut patterns = Vec::with_capacity(3);
        for pattern in [
            format!("{} - %", base),
            format!("{}-%", base),
            format!("{} - %", collapsed),
        ] {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }

        Some(MatchStrategy::new(StrategyKind::ExactBase, patterns))
    }

    /// Label without digits, hyphens or generic terms
    fn lenient_pattern(&self, label: &str) -> String {
        let stripped: String = label
            .chars()
            .filter(|c| !c.is_ascii_digit() && *c != '-')
            .collect();
        collapse_whitespace(&self.lexicon.strip_lenient_terms(&collapse_whitespace(&stripped)))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityExtractor;

    fn generate(label: &str) -> Vec<MatchStrategy> {
        let lexicon = Arc::new(Lexicon::default());
        let entities = EntityExtractor::new(lexicon.clone()).extract(label);
        StrategyGenerator::new(lexicon).generate(&entities, label)
    }

    fn kinds(strategies: &[MatchStrategy]) -> Vec<StrategyKind> {
        strategies.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_full_strategy_set_in_priority_order() {
        let strategies = generate("Ford EV Migration - 3");
        assert_eq!(
            kinds(&strategies),
            vec![
                StrategyKind::CompanySpecific,
                StrategyKind::ExactBase,
                StrategyKind::SpecificKeywords,
                StrategyKind::LenientSpecific,
            ]
        );

        assert_eq!(strategies[0].patterns, vec!["ford%", "%ford%", "ford %", "% ford%"]);
        assert_eq!(strategies[1].patterns, vec!["Ford EV Migration - %", "Ford EV Migration-%"]);
        assert_eq!(strategies[2].patterns, vec!["%ford%", "%migration%"]);
        assert_eq!(strategies[3].patterns, vec!["%Ford EV Migration%"]);
    }

    #[test]
    fn test_one_company_strategy_per_company() {
        let strategies = generate("Nvidia / Microsoft sync");
        let companies: Vec<&MatchStrategy> = strategies
            .iter()
            .filter(|s| s.kind == StrategyKind::CompanySpecific)
            .collect();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].patterns[1], "%nvidia%");
        assert_eq!(companies[1].patterns[1], "%microsoft%");
    }

    #[test]
    fn test_generic_client_meeting() {
        let strategies = generate("Client Meeting");
        assert!(strategies.is_empty());

        let strategies = generate("Client Meeting - 4");
        assert!(strategies.iter().all(|s| s.kind != StrategyKind::ExactBase));
        assert!(strategies.iter().all(|s| s.kind != StrategyKind::CompanySpecific));
    }

    #[test]
    fn test_exact_base_requires_suffix() {
        let strategies = generate("Ford EV Migration");
        assert!(strategies.iter().all(|s| s.kind != StrategyKind::ExactBase));
    }

    #[test]
    fn test_exact_base_collapses_inner_whitespace() {
        let strategies = generate("Ford  EV - 2");
        let exact = strategies
            .iter()
            .find(|s| s.kind == StrategyKind::ExactBase)
            .unwrap();
        assert_eq!(exact.patterns, vec!["Ford  EV - %", "Ford  EV-%", "Ford EV - %"]);
    }

    #[test]
    fn test_keyword_patterns_skip_excluded_and_short() {
        let strategies = generate("Discussion on roadmap and pricing and budget");
        let keywords = strategies
            .iter()
            .find(|s| s.kind == StrategyKind::SpecificKeywords)
            .unwrap();
        assert_eq!(keywords.patterns, vec!["%roadmap%", "%pricing%"]);
    }

    #[test]
    fn test_lenient_strips_generic_terms() {
        let strategies = generate("Meta client call - 7");
        let lenient = strategies
            .iter()
            .find(|s| s.kind == StrategyKind::LenientSpecific)
            .unwrap();
        assert_eq!(lenient.patterns, vec!["%Meta%"]);
    }

    #[test]
    fn test_lenient_skipped_when_too_short() {
        let strategies = generate("IBM - 2");
        assert!(strategies.iter().all(|s| s.kind != StrategyKind::LenientSpecific));
        assert_eq!(strategies[0].kind, StrategyKind::CompanySpecific);
    }

    #[test]
    fn test_strategy_kind_names() {
        assert_eq!(StrategyKind::CompanySpecific.to_string(), "company_specific");
        assert_eq!(
            serde_json::to_string(&StrategyKind::LenientSpecific).unwrap(),
            "\"lenient_specific\""
        );
    }
}
