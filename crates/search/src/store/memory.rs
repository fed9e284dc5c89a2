//! In-memory candidate store

use super::postgres::normalize_documents;
use super::{parse_timestamp, CandidateStore, MeetingRecord, PatternQuery};
use meetprep_common::db::models::Document;
use meetprep_common::errors::{AppError, Result};
use std::cmp::Ordering;

const BACKEND: &str = "memory";

/// Candidate store over a fixed set of records
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<MeetingRecord>,
}

impl InMemoryStore {
    pub fn new(records: Vec<MeetingRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of `documents` rows (as exported from Postgres).
    /// Malformed rows are skipped the same way the Postgres store skips them.
    pub fn from_seed_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| AppError::Configuration {
            message: format!("cannot read seed file {}: {}", path, e),
        })?;

        let documents: Vec<Document> = serde_json::from_str(&raw)?;
        Ok(Self::new(normalize_documents(documents, BACKEND)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn excluding<'a>(
        &'a self,
        exclude_timestamp: &str,
    ) -> impl Iterator<Item = &'a MeetingRecord> + 'a {
        let excluded = parse_timestamp(exclude_timestamp);
        self.records
            .iter()
            .filter(move |record| Some(record.occurred_at) != excluded)
    }
}

#[async_trait::async_trait]
impl CandidateStore for InMemoryStore {
    async fn find(&self, query: &PatternQuery) -> Result<Vec<MeetingRecord>> {
        let mut matches: Vec<MeetingRecord> = self
            .excluding(&query.exclude_timestamp)
            .filter(|record| like_match(&query.pattern, &record.title))
            .cloned()
            .collect();

        matches.sort_by(|a, b| by_time_then_id(a, b, query.newest_first));
        matches.truncate(query.limit);
        Ok(matches)
    }

    async fn scan(&self, exclude_timestamp: &str) -> Result<Vec<MeetingRecord>> {
        let mut records: Vec<MeetingRecord> = self.excluding(exclude_timestamp).cloned().collect();
        records.sort_by(|a, b| by_time_then_id(a, b, true));
        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}

fn by_time_then_id(a: &MeetingRecord, b: &MeetingRecord, newest_first: bool) -> Ordering {
    let by_time = if newest_first {
        b.occurred_at.cmp(&a.occurred_at)
    } else {
        a.occurred_at.cmp(&b.occurred_at)
    };
    by_time.then(a.storage_id.cmp(&b.storage_id))
}

/// Case-insensitive `ILIKE`: `%` matches any run, `_` one character,
/// `\` escapes the next character
pub fn like_match(pattern: &str, text: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Token {
        Any,
        One,
        Char(char),
    }

    let mut tokens = Vec::new();
    let mut chars = pattern.chars().flat_map(char::to_lowercase);
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Char(chars.next().unwrap_or('\\')),
            other => Token::Char(other),
        });
    }

    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    // reachable[j]: the tokens consumed so far can match text[..j]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;

    for token in tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::Any => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            Token::One => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1];
                }
            }
            Token::Char(c) => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1] && text[j - 1] == c;
                }
            }
        }
        reachable = next;
    }

    reachable[text.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, title: &str, day: u32) -> MeetingRecord {
        MeetingRecord {
            storage_id: id,
            title: title.to_string(),
            occurred_at: Utc.with_ymd_and_hms(2026, 9, day, 10, 0, 0).unwrap(),
            content: String::new(),
            location: None,
        }
    }

    fn query(pattern: &str, exclude: &str) -> PatternQuery {
        PatternQuery {
            pattern: pattern.to_string(),
            exclude_timestamp: exclude.to_string(),
            limit: 20,
            newest_first: true,
        }
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("%ford%", "Ford EV Migration - 1"));
        assert!(like_match("ford%", "FORD rollout"));
        assert!(!like_match("ford %", "Fordham review"));
        assert!(like_match("% ford%", "Q3 Ford review"));
        assert!(!like_match("% ford%", "Ford review"));
        assert!(like_match("Ford EV Migration - %", "Ford EV Migration - 12"));
        assert!(!like_match("Ford EV Migration - %", "Ford EV Migration"));
        assert!(like_match("_bm", "IBM"));
        assert!(like_match("100\\%", "100%"));
        assert!(!like_match("100\\%", "1000"));
        assert!(like_match("%", ""));
        assert!(!like_match("", "x"));
    }

    #[tokio::test]
    async fn test_find_orders_and_excludes() {
        let store = InMemoryStore::new(vec![
            record(3, "Ford - 1", 1),
            record(1, "Ford - 2", 3),
            record(2, "Ford - 2b", 3),
            record(4, "Meta", 2),
        ]);

        let found = store.find(&query("%ford%", "2026-09-01T10:00:00Z")).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|r| r.storage_id).collect();
        assert_eq!(ids, vec![1, 2]);

        let mut oldest = query("%ford%", "");
        oldest.newest_first = false;
        oldest.limit = 2;
        let found = store.find(&oldest).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|r| r.storage_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_scan_and_count() {
        let store = InMemoryStore::new(vec![record(1, "A", 1), record(2, "B", 2)]);
        assert_eq!(store.count().await.unwrap(), 2);

        let all = store.scan("2026-09-02T10:00:00Z").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "A");
    }

    #[test]
    fn test_missing_seed_file() {
        let result = InMemoryStore::from_seed_file("/nonexistent/meetings.json");
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
