//! Previous-meeting search pipeline
//!
//! Extract → generate strategies → query per pattern → aggregate. Search
//! is enrichment for meeting preparation, so nothing here returns an error:
//! failed pattern queries are logged and skipped, and any failure past that
//! point yields an empty result list.

use crate::aggregate::{CandidateMatch, RankedResult, ResultAggregator};
use crate::diagnostics::{self, DiagnosticReport};
use crate::entities::EntityExtractor;
use crate::lexicon::Lexicon;
use crate::store::{parse_timestamp, CandidateStore, PatternQuery};
use crate::strategy::{MatchStrategy, StrategyGenerator, StrategyKind};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use meetprep_common::config::{AppConfig, ScoringConfig, SearchConfig};
use meetprep_common::errors::{AppError, Result};
use meetprep_common::metrics::{record_pattern_query, record_search};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs history searches against a [`CandidateStore`]
pub struct SearchOrchestrator {
    store: Arc<dyn CandidateStore>,
    extractor: EntityExtractor,
    generator: StrategyGenerator,
    aggregator: ResultAggregator,
    per_pattern_limit: usize,
    simple_limit: usize,
    max_concurrent_queries: usize,
}

impl SearchOrchestrator {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        lexicon: Arc<Lexicon>,
        search: &SearchConfig,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            store,
            extractor: EntityExtractor::new(lexicon.clone()),
            generator: StrategyGenerator::new(lexicon.clone()),
            aggregator: ResultAggregator::new(lexicon, scoring, search.max_results),
            per_pattern_limit: search.per_pattern_limit,
            simple_limit: search.simple_limit,
            max_concurrent_queries: search.max_concurrent_queries.max(1),
        }
    }

    /// Build from application configuration
    pub fn from_config(store: Arc<dyn CandidateStore>, config: &AppConfig) -> Result<Self> {
        let lexicon = Arc::new(Lexicon::from_config(&config.lexicon)?);
        Ok(Self::new(store, lexicon, &config.search, config.scoring.clone()))
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    /// Previous meetings related to `label`, best first. The meeting
    /// starting at `exclude_timestamp` (normally the one being prepared) is
    /// never returned.
    pub async fn search_previous_meetings(
        &self,
        label: &str,
        exclude_timestamp: &str,
    ) -> Vec<RankedResult> {
        self.search_previous_meetings_at(label, exclude_timestamp, Utc::now())
            .await
    }

    /// As [`Self::search_previous_meetings`], with recency measured from `now`
    pub async fn search_previous_meetings_at(
        &self,
        label: &str,
        exclude_timestamp: &str,
        now: DateTime<Utc>,
    ) -> Vec<RankedResult> {
        let started = Instant::now();

        let results = match guarded(self.try_search(label, exclude_timestamp, now)).await {
            Ok(results) => results,
            Err(e) => {
                error!(label = %label, error = %e, "History search failed, returning no results");
                Vec::new()
            }
        };

        let elapsed = started.elapsed();
        record_search(elapsed.as_secs_f64(), "ranked", results.len());
        info!(
            label = %label,
            results = results.len(),
            top_score = results.first().map(|r| r.relevance_score),
            latency_ms = elapsed.as_millis() as u64,
            "History search completed"
        );

        results
    }

    async fn try_search(
        &self,
        label: &str,
        exclude_timestamp: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedResult>> {
        let entities = self.extractor.extract(label);
        let strategies = self.generator.generate(&entities, label);
        debug!(
            label = %label,
            companies = ?entities.company_names().collect::<Vec<_>>(),
            strategies = strategies.len(),
            "Generated search strategies"
        );

        let candidates = self.gather_candidates(&strategies, exclude_timestamp).await;
        debug!(candidates = candidates.len(), "Pooled raw candidates");
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.aggregator.aggregate(label, candidates, now))
    }

    /// Run every pattern of every strategy. Up to `max_concurrent_queries`
    /// run at once, but results are pooled in strategy/pattern order.
    async fn gather_candidates(
        &self,
        strategies: &[MatchStrategy],
        exclude_timestamp: &str,
    ) -> Vec<CandidateMatch> {
        let excluded = parse_timestamp(exclude_timestamp);
        let store = self.store.as_ref();
        let limit = self.per_pattern_limit;

        let queries: Vec<(StrategyKind, PatternQuery)> = strategies
            .iter()
            .flat_map(|strategy| {
                strategy.patterns.iter().map(move |pattern| {
                    (
                        strategy.kind,
                        PatternQuery {
                            pattern: pattern.clone(),
                            exclude_timestamp: exclude_timestamp.to_string(),
                            limit,
                            newest_first: true,
                        },
                    )
                })
            })
            .collect();

        let outcomes: Vec<_> = stream::iter(queries)
            .map(|(kind, query)| async move {
                let started = Instant::now();
                let outcome = store.find(&query).await;
                (kind, query.pattern, outcome, started.elapsed())
            })
            .buffered(self.max_concurrent_queries)
            .collect()
            .await;

        let mut candidates = Vec::new();
        for (kind, pattern, outcome, elapsed) in outcomes {
            match outcome {
                Ok(records) => {
                    record_pattern_query(elapsed.as_secs_f64(), kind.as_str(), true);
                    debug!(
                        strategy = %kind,
                        pattern = %pattern,
                        found = records.len(),
                        "Pattern query completed"
                    );
                    candidates.extend(
                        records
                            .into_iter()
                            .filter(|record| Some(record.occurred_at) != excluded)
                            .map(|record| CandidateMatch { record, strategy: kind }),
                    );
                }
                Err(e) => {
                    record_pattern_query(elapsed.as_secs_f64(), kind.as_str(), false);
                    if e.is_store_failure() {
                        warn!(
                            strategy = %kind,
                            pattern = %pattern,
                            backend = store.backend(),
                            error = %e,
                            "Pattern query failed, skipping"
                        );
                    } else {
                        error!(
                            strategy = %kind,
                            pattern = %pattern,
                            backend = store.backend(),
                            error = %e,
                            "Unexpected pattern query error, skipping"
                        );
                    }
                }
            }
        }

        candidates
    }

    /// Legacy single-pattern search: the first extracted company, newest
    /// first, unscored
    pub async fn search_previous_meetings_simple(
        &self,
        label: &str,
        exclude_timestamp: &str,
    ) -> Vec<RankedResult> {
        let started = Instant::now();
        let entities = self.extractor.extract(label);

        let Some(company) = entities.company_names().next() else {
            debug!(label = %label, "No company in label, skipping simple search");
            record_search(started.elapsed().as_secs_f64(), "simple", 0);
            return Vec::new();
        };

        let query = PatternQuery {
            pattern: format!("%{}%", company),
            exclude_timestamp: exclude_timestamp.to_string(),
            limit: self.simple_limit,
            newest_first: true,
        };
        let excluded = parse_timestamp(exclude_timestamp);

        let results: Vec<RankedResult> = match guarded(self.store.find(&query)).await {
            Ok(records) => records
                .into_iter()
                .filter(|record| Some(record.occurred_at) != excluded)
                .map(RankedResult::unscored)
                .collect(),
            Err(e) => {
                warn!(label = %label, pattern = %query.pattern, error = %e, "Simple search failed");
                Vec::new()
            }
        };

        record_search(started.elapsed().as_secs_f64(), "simple", results.len());
        info!(
            label = %label,
            company = %company,
            results = results.len(),
            "Simple search completed"
        );
        results
    }

    /// Report which stored meetings share a company or keyword with
    /// `label`. A failed scan is reported in `error`, never returned.
    pub async fn diagnose_meeting_search(
        &self,
        label: &str,
        exclude_timestamp: &str,
    ) -> DiagnosticReport {
        let entities = self.extractor.extract(label);
        let strategy_count = self.generator.generate(&entities, label).len();

        match self.store.scan(exclude_timestamp).await {
            Ok(records) => {
                let potential_matches =
                    diagnostics::potential_matches(&self.extractor, &entities, &records);
                info!(
                    label = %label,
                    total_records = records.len(),
                    strategies = strategy_count,
                    potential_matches = potential_matches.len(),
                    "Diagnostic scan completed"
                );

                DiagnosticReport {
                    total_records: records.len(),
                    extracted_entities: entities,
                    strategy_count,
                    potential_matches,
                    error: None,
                }
            }
            Err(e) => {
                error!(label = %label, error = %e, "Diagnostic scan failed");
                DiagnosticReport {
                    total_records: 0,
                    extracted_entities: entities,
                    strategy_count,
                    potential_matches: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Await `fut`, turning a panic anywhere inside it into `AppError::Engine`
async fn guarded<T, F>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(AppError::Engine {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("search panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("search panicked: {}", message)
    } else {
        "search panicked".to_string()
    }
}
