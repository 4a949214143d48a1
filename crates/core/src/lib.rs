pub mod consolidator;
pub mod domain;
pub mod engine;
pub mod pipeline;
pub mod pure;
pub mod storage;
pub mod testing;
pub mod worker_pool;

pub use consolidator::{Consolidator, export_report};
pub use domain::{
  ConsolidatedFact, ConsolidationQuery, ConsolidationReport, DecisionAction, ExistingMemory, ExtractedFact,
  FactResult, IngestConfig, MemoryDecision, MemoryFact, PreparedDocument, Progress, Sensitivity, Stage,
};
pub use engine::Engine;
pub use storage::{DocumentReference, Filter, QueryResult, Storage, TagMatch};
