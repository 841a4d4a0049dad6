//! `plancheck-core`: shared types for the planning-document comparator.
//!
//! Text normalization, raw cell grids, and the canonical column vocabulary.
//! No IO and no matching logic.

pub mod field;
pub mod grid;
pub mod text;
pub mod vocabulary;

pub use field::{CanonicalField, Subject};
pub use grid::RawGrid;
pub use text::normalize;
pub use vocabulary::{AliasEntry, Vocabulary};
