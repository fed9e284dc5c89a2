//! Deduplication, relevance scoring and final ordering of candidates
//!
//! Scoring is additive. Every weight comes from [`ScoringConfig`]; the
//! defaults reproduce the long-standing ranking behavior:
//!
//! | Signal                                                  | Default |
//! |---------------------------------------------------------|---------|
//! | each shared specific company                            | +10     |
//! | no shared company, candidate is a bare "client meeting" | -5      |
//! | cleaned base labels equal                               | +5      |
//! | each shared specific keyword                            | +2      |
//! | found by company / exact-base / keyword strategy        | +3/+2/+1|
//! | recency, linear over 30 days                            | <= +1   |

use crate::entities::{CompanyConfidence, EntityBundle, EntityExtractor};
use crate::lexicon::Lexicon;
use crate::store::MeetingRecord;
use crate::strategy::StrategyKind;
use chrono::{DateTime, Utc};
use meetprep_common::config::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Companies and keywords must be longer than this to count
const MIN_SPECIFIC_LEN: usize = 4;

/// Cleaned base labels must be longer than this to count
const MIN_BASE_LEN: usize = 4;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A record returned by one pattern query, tagged with its strategy
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    pub record: MeetingRecord,
    pub strategy: StrategyKind,
}

/// Metadata of a ranked result, in the stored metadata shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub summary: String,

    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A previous meeting judged related to the query label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub content: String,
    pub metadata: ResultMetadata,
    pub relevance_score: f64,
}

impl RankedResult {
    fn from_record(record: MeetingRecord, relevance_score: f64) -> Self {
        Self {
            content: record.content,
            metadata: ResultMetadata {
                summary: record.title,
                start_time: record.occurred_at,
                location: record.location,
            },
            relevance_score,
        }
    }

    /// Result without a relevance score (legacy search path)
    pub fn unscored(record: MeetingRecord) -> Self {
        Self::from_record(record, 0.0)
    }
}

/// Entities of the query label that scoring compares against
struct QueryProfile<'a> {
    companies: Vec<(&'a str, CompanyConfidence)>,
    keywords: Vec<&'a str>,
    clean_base: String,
}

/// Turns a pooled candidate list into the final ranked results
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    extractor: EntityExtractor,
    lexicon: Arc<Lexicon>,
    scoring: ScoringConfig,
    max_results: usize,
}

impl ResultAggregator {
    pub fn new(lexicon: Arc<Lexicon>, scoring: ScoringConfig, max_results: usize) -> Self {
        Self {
            extractor: EntityExtractor::new(lexicon.clone()),
            lexicon,
            scoring,
            max_results,
        }
    }

    /// Deduplicate by title (first occurrence wins), score, filter, sort
    /// and cap. `now` anchors the recency bonus.
    pub fn aggregate(
        &self,
        label: &str,
        candidates: Vec<CandidateMatch>,
        now: DateTime<Utc>,
    ) -> Vec<RankedResult> {
        let query_entities = self.extractor.extract(label);
        let profile = self.profile(&query_entities);

        let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
        let mut ranked: Vec<RankedResult> = Vec::new();

        for candidate in candidates {
            if !seen.insert(candidate.record.title.clone()) {
                continue;
            }

            let (score, company_overlap) = self.score(&profile, &candidate, now);
            if score > 0.0 || company_overlap > 0 {
                ranked.push(RankedResult::from_record(candidate.record, score));
            }
        }

        // sort_by is stable: ties keep traversal order
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        ranked.truncate(self.max_results);

        let has_strong = ranked
            .iter()
            .any(|r| r.relevance_score > self.scoring.strong_match_threshold);
        if has_strong {
            ranked.retain(|r| r.relevance_score > self.scoring.weak_match_threshold);
        }

        ranked
    }

    fn profile<'a>(&self, entities: &'a EntityBundle) -> QueryProfile<'a> {
        QueryProfile {
            companies: entities
                .companies
                .iter()
                .filter(|c| self.is_specific_company(&c.name))
                .map(|c| (c.name.as_str(), c.confidence))
                .collect(),
            keywords: self.specific_keywords(entities),
            clean_base: self.clean_base(&entities.base_label),
        }
    }

    /// Returns the score and the number of shared specific companies
    fn score(
        &self,
        query: &QueryProfile<'_>,
        candidate: &CandidateMatch,
        now: DateTime<Utc>,
    ) -> (f64, usize) {
        let title = &candidate.record.title;
        let title_lower = title.to_lowercase();
        let entities = self.extractor.extract(title);
        let weights = &self.scoring;
        let mut score = 0.0;

        let mut company_overlap = 0;
        for (name, confidence) in &query.companies {
            let Some(theirs) = entities.companies.iter().find(|c| c.name == *name) else {
                continue;
            };
            company_overlap += 1;
            score += if *confidence == CompanyConfidence::Inferred
                || theirs.confidence == CompanyConfidence::Inferred
            {
                weights.inferred_company_match
            } else {
                weights.company_match
            };
        }

        if company_overlap == 0
            && title_lower.contains(self.lexicon.generic_phrase())
            && !query.companies.iter().any(|(name, _)| title_lower.contains(*name))
        {
            score -= weights.generic_penalty;
        }

        let clean_base = self.clean_base(&entities.base_label);
        if query.clean_base.chars().count() >= MIN_BASE_LEN
            && clean_base.chars().count() >= MIN_BASE_LEN
            && query.clean_base == clean_base
        {
            score += weights.base_label_match;
        }

        let theirs: HashSet<&str> = self.specific_keywords(&entities).into_iter().collect();
        let shared_keywords = query.keywords.iter().filter(|kw| theirs.contains(*kw)).count();
        score += shared_keywords as f64 * weights.keyword_match;

        score += match candidate.strategy {
            StrategyKind::CompanySpecific => weights.company_strategy_bonus,
            StrategyKind::ExactBase => weights.exact_base_strategy_bonus,
            StrategyKind::SpecificKeywords => weights.keyword_strategy_bonus,
            StrategyKind::LenientSpecific => weights.lenient_strategy_bonus,
        };

        score += self.recency_bonus(candidate.record.occurred_at, now);

        (score, company_overlap)
    }

    fn is_specific_company(&self, name: &str) -> bool {
        name.chars().count() >= MIN_SPECIFIC_LEN && !self.lexicon.is_generic_company(name)
    }

    fn specific_keywords<'e>(&self, entities: &'e EntityBundle) -> Vec<&'e str> {
        entities
            .keywords
            .iter()
            .map(String::as_str)
            .filter(|kw| {
                kw.chars().count() >= MIN_SPECIFIC_LEN
                    && !self.lexicon.is_scoring_keyword_excluded(kw)
            })
            .collect()
    }

    fn clean_base(&self, base_label: &str) -> String {
        self.lexicon
            .strip_generic_company_terms(&base_label.to_lowercase())
            .trim()
            .to_string()
    }

    /// `max(0, (window - days) / window)`, days since the meeting clamped
    /// at zero
    fn recency_bonus(&self, occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let window = self.scoring.recency_window_days;
        if window <= 0.0 {
            return 0.0;
        }
        let days = ((now - occurred_at).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0);
        ((window - days) / window).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    fn aggregator() -> ResultAggregator {
        ResultAggregator::new(Arc::new(Lexicon::default()), ScoringConfig::default(), 10)
    }

    fn candidate(id: i64, title: &str, days_ago: i64, strategy: StrategyKind) -> CandidateMatch {
        CandidateMatch {
            record: MeetingRecord {
                storage_id: id,
                title: title.to_string(),
                occurred_at: now() - Duration::days(days_ago),
                content: format!("notes {}", id),
                location: None,
            },
            strategy,
        }
    }

    fn score_of(results: &[RankedResult], title: &str) -> Option<f64> {
        results
            .iter()
            .find(|r| r.metadata.summary == title)
            .map(|r| r.relevance_score)
    }

    #[test]
    fn test_company_base_keyword_and_strategy_signals() {
        let results = aggregator().aggregate(
            "Ford EV Migration - 3",
            vec![candidate(1, "Ford EV Migration - 1", 60, StrategyKind::CompanySpecific)],
            now(),
        );

        // company 10 + base 5 + keywords (ford, migration) 4 + strategy 3
        assert_eq!(score_of(&results, "Ford EV Migration - 1"), Some(22.0));
    }

    #[test]
    fn test_recency_bonus() {
        let aggregator = aggregator();
        let score_at = |days_ago| {
            let found =
                candidate(1, "Ford EV Migration - 1", days_ago, StrategyKind::CompanySpecific);
            aggregator.aggregate("Ford EV Migration - 3", vec![found], now())[0].relevance_score
        };

        assert_eq!(score_at(0), 23.0);
        assert!((score_at(15) - 22.5).abs() < 1e-9);
        assert_eq!(score_at(-3), 23.0);
    }

    #[test]
    fn test_generic_penalty_excludes_noise() {
        let results = aggregator().aggregate(
            "Ford EV Migration - 3",
            vec![candidate(1, "Generic Client Meeting", 90, StrategyKind::LenientSpecific)],
            now(),
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_first_title_occurrence_wins() {
        let results = aggregator().aggregate(
            "Ford EV Migration - 3",
            vec![
                candidate(9, "Ford EV Migration - 1", 60, StrategyKind::SpecificKeywords),
                candidate(2, "Ford EV Migration - 1", 1, StrategyKind::CompanySpecific),
            ],
            now(),
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "notes 9");
        // found by the keyword strategy: 10 + 5 + 4 + 1
        assert_eq!(results[0].relevance_score, 20.0);
    }

    #[test]
    fn test_company_overlap_kept_despite_low_score() {
        let scoring = ScoringConfig {
            company_match: 1.0,
            generic_penalty: 0.0,
            company_strategy_bonus: -20.0,
            ..ScoringConfig::default()
        };
        let aggregator = ResultAggregator::new(Arc::new(Lexicon::default()), scoring, 10);

        let results = aggregator.aggregate(
            "Meta AI Partnership",
            vec![candidate(1, "Meta quarterly", 90, StrategyKind::CompanySpecific)],
            now(),
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].relevance_score <= 0.0);
    }

    #[test]
    fn test_no_overlap_is_excluded() {
        let results = aggregator().aggregate(
            "Meta AI Partnership",
            vec![candidate(1, "Ford Rollout - 2", 90, StrategyKind::LenientSpecific)],
            now(),
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_cap_sort_and_weak_filter() {
        let mut candidates: Vec<CandidateMatch> = (0..12)
            .map(|i| {
                let title = format!("Ford EV Migration - {}", i);
                candidate(i, &title, 60, StrategyKind::CompanySpecific)
            })
            .collect();
        candidates.push(candidate(100, "Roadmap sync", 0, StrategyKind::LenientSpecific));

        let results = aggregator().aggregate("Ford EV Migration - 99", candidates, now());
        assert_eq!(results.len(), 10);
        assert!(results.windows(2).all(|w| w[0].relevance_score >= w[1].relevance_score));
        assert!(results.iter().all(|r| r.relevance_score > 1.0));
        // stable on ties
        assert_eq!(results[0].metadata.summary, "Ford EV Migration - 0");
        assert_eq!(results[9].metadata.summary, "Ford EV Migration - 9");
    }

    #[test]
    fn test_weak_results_survive_without_strong_match() {
        let results = aggregator().aggregate(
            "Quarterly roadmap",
            vec![candidate(1, "Roadmap sync", 0, StrategyKind::LenientSpecific)],
            now(),
        );
        // keyword 2 + recency 1
        assert_eq!(score_of(&results, "Roadmap sync"), Some(3.0));
    }

    #[test]
    fn test_inferred_company_weight() {
        let scoring = ScoringConfig {
            inferred_company_match: 4.0,
            ..ScoringConfig::default()
        };
        let aggregator = ResultAggregator::new(Arc::new(Lexicon::default()), scoring, 10);

        let results = aggregator.aggregate(
            "Globex renewal",
            vec![candidate(1, "Globex onboarding", 90, StrategyKind::CompanySpecific)],
            now(),
        );
        // inferred company 4 + keyword "globex" 2 + strategy 3
        assert_eq!(score_of(&results, "Globex onboarding"), Some(9.0));
    }

    #[test]
    fn test_result_serialization_shape() {
        let record = candidate(1, "Ford EV Migration - 1", 0, StrategyKind::ExactBase).record;
        let result = RankedResult::unscored(record);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metadata"]["summary"], "Ford EV Migration - 1");
        assert_eq!(json["metadata"]["startTime"], "2026-10-01T12:00:00Z");
        assert!(json["metadata"].get("location").is_none());
        assert_eq!(json["relevance_score"], 0.0);
    }
}
