//! `plancheck-recon`: schema normalization and semantic matching engine.
//!
//! Pure engine crate: receives raw grids, returns classified match results.
//! No file-format or CLI dependencies; the embedding capability is injected.

pub mod classify;
pub mod columns;
pub mod config;
pub mod diff;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod header;
pub mod http_embedder;
pub mod matcher;
pub mod model;
pub mod summary;
pub mod table;

pub use config::CompareConfig;
pub use embedding::{Embedder, HashingEmbedder};
pub use engine::{compare_tables, run, CompareInput};
pub use error::{EmbeddingError, ReconError};
pub use model::{Classification, ComparisonReport, ComparisonSummary, DiffSpan, MatchResult, NormalizedTable};
pub use table::SchemaNormalizer;
