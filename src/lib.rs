//! Speech-driven particle choreography.
//!
//! Transcripts come in from a [`transcript::SpeechSource`], are classified
//! into shapes by a [`classify::Classifier`], and are choreographed into
//! per-frame override values and target swaps by
//! [`choreo::SemanticOrchestrator`].

pub mod audio;
pub mod choreo;
pub mod classify;
pub mod config;
pub mod remote;
pub mod render;
pub mod session;
pub mod transcript;
