//! Word → shape classification.
//!
//! * [`Classifier`]: pure, synchronous trait the orchestrator routes final
//!   transcripts through.
//! * [`SemanticState`]: immutable classifier output.
//! * [`HierarchyMapping`]: up to three staged targets, abstract → concrete.
//! * [`KeywordClassifier`]: built-in dictionary implementation.

pub mod keyword;
pub mod semantic;

pub use keyword::{KeywordClassifier, ShapeEntry};
pub use semantic::{Classifier, HierarchyMapping, HierarchyStage, SemanticState};
