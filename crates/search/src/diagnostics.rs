//! Offline analysis of why stored meetings were or were not matched

use crate::entities::{EntityBundle, EntityExtractor};
use crate::store::MeetingRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a diagnostic run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Records scanned (everything but the excluded meeting)
    pub total_records: usize,

    /// Entities extracted from the query label
    pub extracted_entities: EntityBundle,

    /// Strategies the search would run
    pub strategy_count: usize,

    pub potential_matches: Vec<PotentialMatch>,

    /// Set when the scan failed; `total_records` is then zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A stored meeting sharing a company or keyword with the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialMatch {
    pub summary: String,

    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,

    pub common_companies: Vec<String>,
    pub common_keywords: Vec<String>,
}

/// Records sharing at least one company or keyword with `query`, in scan
/// order. Shared terms are listed in the query's order.
pub fn potential_matches(
    extractor: &EntityExtractor,
    query: &EntityBundle,
    records: &[MeetingRecord],
) -> Vec<PotentialMatch> {
    records
        .iter()
        .filter_map(|record| {
            let theirs = extractor.extract(&record.title);

            let common_companies: Vec<String> = query
                .company_names()
                .filter(|name| theirs.has_company(name))
                .map(str::to_string)
                .collect();
            let common_keywords: Vec<String> = query
                .keywords
                .iter()
                .filter(|kw| theirs.has_keyword(kw))
                .cloned()
                .collect();

            if common_companies.is_empty() && common_keywords.is_empty() {
                return None;
            }

            Some(PotentialMatch {
                summary: record.title.clone(),
                start_time: record.occurred_at,
                common_companies,
                common_keywords,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn record(id: i64, title: &str) -> MeetingRecord {
        MeetingRecord {
            storage_id: id,
            title: title.to_string(),
            occurred_at: Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap(),
            content: String::new(),
            location: None,
        }
    }

    #[test]
    fn test_potential_matches() {
        let extractor = EntityExtractor::new(Arc::new(Lexicon::default()));
        let query = extractor.extract("Ford EV Migration - 3");
        let records = vec![
            record(1, "Ford Rollout - 2"),
            record(2, "Battery migration plan"),
            record(3, "Meta AI Partnership"),
        ];

        let matches = potential_matches(&extractor, &query, &records);
        assert_eq!(matches.len(), 2);

        assert_eq!(matches[0].summary, "Ford Rollout - 2");
        assert_eq!(matches[0].common_companies, vec!["ford"]);
        assert_eq!(matches[0].common_keywords, vec!["ford"]);

        assert_eq!(matches[1].summary, "Battery migration plan");
        assert!(matches[1].common_companies.is_empty());
        assert_eq!(matches[1].common_keywords, vec!["migration"]);
    }

    #[test]
    fn test_report_serializes_without_error() {
        let report = DiagnosticReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["total_records"], 0);
    }
}
