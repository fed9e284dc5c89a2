//! MeetPrep history search
//!
//! Finds stored meetings related to an upcoming one so its briefing can
//! include a "previous engagement" section:
//! - Entity extraction from free-text meeting titles
//! - Pattern strategies (company, exact base, keywords, lenient)
//! - Fault-isolated pattern queries against a candidate store
//! - Deduplication and additive relevance scoring

pub mod aggregate;
pub mod diagnostics;
pub mod entities;
pub mod handlers;
pub mod lexicon;
pub mod orchestrator;
pub mod router;
pub mod store;
pub mod strategy;

pub use aggregate::{RankedResult, ResultAggregator};
pub use diagnostics::DiagnosticReport;
pub use entities::{EntityBundle, EntityExtractor};
pub use lexicon::Lexicon;
pub use orchestrator::SearchOrchestrator;
pub use router::{create_router, AppState};
pub use store::{create_store, CandidateStore, InMemoryStore, MeetingRecord, PatternQuery};
pub use strategy::{MatchStrategy, StrategyGenerator, StrategyKind};
