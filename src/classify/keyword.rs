//! Dictionary-based word → shape classifier.
//!
//! [`KeywordClassifier`] tokenises a transcript, looks every token up in a
//! word → shape dictionary, and scores sentiment and intensity from small
//! static lexicons.  It is deterministic: the same text always produces the
//! same [`SemanticState`].
//!
//! Confidence levels:
//!
//! | Reading                                         | Confidence |
//! |-------------------------------------------------|------------|
//! | Dictionary hit                                  | 1.0        |
//! | Short utterance with one unknown content word   | 0.6        |
//! | Only sentiment / intensity words                | 0.5        |
//! | Nothing recognisable                            | 0.2        |
//!
//! The dictionary can be extended from a JSON file
//! (see [`KeywordClassifier::load_from`]).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::semantic::{Classifier, HierarchyMapping, HierarchyStage, SemanticState};

// ---------------------------------------------------------------------------
// Static lexicons
// ---------------------------------------------------------------------------

static STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "i", "you", "we", "they", "it", "is", "are", "was",
    "were", "be", "to", "of", "in", "on", "at", "for", "with", "this", "that", "my", "your",
    "me", "like", "just", "um", "uh", "so", "very", "really", "what", "about", "there", "here",
    "think", "see", "look", "some", "have", "has", "had", "do", "does", "did",
];

static POSITIVE: &[&str] = &[
    "love", "happy", "joy", "beautiful", "calm", "bright", "warm", "wonderful", "hope", "peace",
    "gentle", "free", "good", "great",
];

static NEGATIVE: &[&str] = &[
    "sad", "angry", "dark", "fear", "cold", "broken", "lonely", "hate", "pain", "lost", "storm",
    "bad", "afraid",
];

static INTENSIFIERS: &[&str] = &[
    "very", "so", "really", "extremely", "totally", "absolutely", "incredibly", "never",
    "always",
];

/// Content-word limit for treating an unknown word as a shape request.
const MAX_CANDIDATE_WORDS: usize = 3;

// ---------------------------------------------------------------------------
// ShapeEntry
// ---------------------------------------------------------------------------

/// One dictionary row, as stored in `dictionary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeEntry {
    /// Spoken word (lower-case).
    pub word: String,
    /// Shape name handed to the render layer.
    pub target: String,
    /// How loose the formation should be for this word.
    pub abstraction: f32,
    #[serde(default)]
    pub sentiment: f32,
    #[serde(default)]
    pub intensity: f32,
    /// Optional staged reveal, abstract → concrete.
    #[serde(default)]
    pub hierarchy: Vec<String>,
}

impl ShapeEntry {
    fn new(word: &str, target: &str, abstraction: f32, hierarchy: &[&str]) -> Self {
        Self {
            word: word.into(),
            target: target.into(),
            abstraction,
            sentiment: 0.0,
            intensity: 0.0,
            hierarchy: hierarchy.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn with_feeling(mut self, sentiment: f32, intensity: f32) -> Self {
        self.sentiment = sentiment;
        self.intensity = intensity;
        self
    }
}

fn builtin_entries() -> Vec<ShapeEntry> {
    vec![
        ShapeEntry::new("ball", "sphere", 0.3, &[]),
        ShapeEntry::new("sphere", "sphere", 0.3, &[]),
        ShapeEntry::new("planet", "sphere", 0.4, &[]),
        ShapeEntry::new("box", "cube", 0.2, &[]),
        ShapeEntry::new("cube", "cube", 0.2, &[]),
        ShapeEntry::new("ring", "torus", 0.3, &[]),
        ShapeEntry::new("donut", "torus", 0.3, &[]),
        ShapeEntry::new("spiral", "spiral", 0.5, &[]),
        ShapeEntry::new("galaxy", "spiral", 0.7, &["sphere", "spiral"]),
        ShapeEntry::new("wave", "wave", 0.6, &[]),
        ShapeEntry::new("ocean", "wave", 0.7, &["sphere", "wave"]),
        ShapeEntry::new("dna", "helix", 0.4, &["spiral", "helix"]),
        ShapeEntry::new("star", "star", 0.3, &[]),
        ShapeEntry::new("heart", "heart", 0.3, &[]).with_feeling(0.8, 0.6),
        ShapeEntry::new("tree", "tree", 0.4, &["sphere", "tree"]),
        ShapeEntry::new("person", "humanoid", 0.3, &["sphere", "humanoid"]),
        ShapeEntry::new("human", "humanoid", 0.3, &["sphere", "humanoid"]),
        ShapeEntry::new("dog", "dog", 0.3, &["sphere", "quadruped"]),
        ShapeEntry::new("cat", "cat", 0.3, &["sphere", "quadruped"]),
        ShapeEntry::new("horse", "horse", 0.3, &["sphere", "humanoid", "quadruped"]),
        ShapeEntry::new("bird", "bird", 0.4, &["sphere", "bird"]),
    ]
}

// ---------------------------------------------------------------------------
// KeywordClassifier
// ---------------------------------------------------------------------------

/// Deterministic dictionary classifier.
///
/// # Example
/// ```rust
/// use lumen_choreo::classify::{Classifier, KeywordClassifier};
///
/// let classifier = KeywordClassifier::builtin();
/// let state = classifier.classify("look at the horse");
/// assert_eq!(state.target, "horse");
/// assert_eq!(state.dominant_word, "horse");
/// assert!(classifier.lookup_hierarchy("horse").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    entries: HashMap<String, ShapeEntry>,
}

impl KeywordClassifier {
    /// Classifier with the built-in dictionary only.
    pub fn builtin() -> Self {
        Self::with_entries(builtin_entries())
    }

    /// Classifier with exactly `entries` (later rows win on duplicate words).
    pub fn with_entries(entries: Vec<ShapeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (e.word.to_lowercase(), e))
            .collect();
        Self { entries }
    }

    /// Built-in dictionary extended with rows from a JSON file.
    ///
    /// A missing or unparsable file leaves the built-in dictionary unchanged.
    pub fn load_from(path: &Path) -> Self {
        let mut classifier = Self::builtin();
        if !path.exists() {
            return classifier;
        }
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("dictionary: cannot read {} ({e})", path.display());
                return classifier;
            }
        };
        match serde_json::from_str::<Vec<ShapeEntry>>(&data) {
            Ok(extra) => {
                log::info!("dictionary: loaded {} entries from {}", extra.len(), path.display());
                for entry in extra {
                    classifier.entries.insert(entry.word.to_lowercase(), entry);
                }
            }
            Err(e) => {
                log::warn!("dictionary: ignoring {} ({e})", path.display());
            }
        }
        classifier
    }

    /// Number of dictionary rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn clamp_unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> SemanticState {
        let tokens = tokenize(text);

        let positives = tokens.iter().filter(|t| POSITIVE.contains(&t.as_str())).count();
        let negatives = tokens.iter().filter(|t| NEGATIVE.contains(&t.as_str())).count();
        let intensifiers = tokens
            .iter()
            .filter(|t| INTENSIFIERS.contains(&t.as_str()))
            .count();
        let exclamations = text.matches('!').count();

        let lexical_sentiment = if positives + negatives == 0 {
            0.0
        } else {
            (positives as f32 - negatives as f32) / (positives + negatives) as f32
        };
        let lexical_intensity = clamp_unit(
            lexical_sentiment.abs() * 0.4 + intensifiers as f32 * 0.25 + exclamations as f32 * 0.2,
        );

        // The most recent dictionary word decides the shape.
        if let Some(entry) = tokens.iter().rev().find_map(|t| self.entries.get(t)) {
            let sentiment = if positives + negatives == 0 {
                entry.sentiment
            } else {
                ((entry.sentiment + lexical_sentiment) / 2.0).clamp(-1.0, 1.0)
            };
            return SemanticState {
                target: entry.target.clone(),
                abstraction_level: clamp_unit(entry.abstraction),
                sentiment,
                emotional_intensity: clamp_unit(entry.intensity.max(lexical_intensity)),
                dominant_word: entry.word.clone(),
                confidence: 1.0,
            };
        }

        let content: Vec<&String> = tokens
            .iter()
            .filter(|t| {
                !STOP_WORDS.contains(&t.as_str())
                    && !POSITIVE.contains(&t.as_str())
                    && !NEGATIVE.contains(&t.as_str())
                    && !INTENSIFIERS.contains(&t.as_str())
            })
            .collect();

        // A short phrase naming one unknown thing: worth generating remotely.
        if (1..=MAX_CANDIDATE_WORDS).contains(&content.len()) {
            if let Some(word) = content.last().filter(|w| w.chars().count() >= 3) {
                return SemanticState {
                    target: (*word).clone(),
                    abstraction_level: 0.4,
                    sentiment: lexical_sentiment,
                    emotional_intensity: lexical_intensity,
                    dominant_word: (*word).clone(),
                    confidence: 0.6,
                };
            }
        }

        let felt = positives + negatives + intensifiers > 0;
        SemanticState {
            target: String::new(),
            abstraction_level: if felt { 0.7 } else { 0.6 },
            sentiment: lexical_sentiment,
            emotional_intensity: lexical_intensity,
            dominant_word: content.first().map(|w| (*w).clone()).unwrap_or_default(),
            confidence: if felt { 0.5 } else { 0.2 },
        }
    }

    fn lookup_hierarchy(&self, word: &str) -> Option<HierarchyMapping> {
        let entry = self.entries.get(&word.to_lowercase())?;
        if entry.hierarchy.is_empty() {
            return None;
        }
        let last = entry.hierarchy.len() - 1;
        let stages = entry
            .hierarchy
            .iter()
            .enumerate()
            .map(|(i, target)| HierarchyStage {
                target: target.clone(),
                label: if i == last {
                    entry.word.clone()
                } else {
                    target.clone()
                },
            })
            .collect();
        Some(HierarchyMapping::new(stages))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dictionary_hit_is_fully_confident() {
        let c = KeywordClassifier::builtin();
        let s = c.classify("I can see a spiral");
        assert_eq!(s.target, "spiral");
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn latest_dictionary_word_wins() {
        let c = KeywordClassifier::builtin();
        let s = c.classify("a ball no wait a cube");
        assert_eq!(s.target, "cube");
        assert_eq!(s.dominant_word, "cube");
    }

    #[test]
    fn classification_is_deterministic() {
        let c = KeywordClassifier::builtin();
        assert_eq!(c.classify("a happy horse!"), c.classify("a happy horse!"));
    }

    #[test]
    fn short_unknown_word_becomes_remote_candidate() {
        let c = KeywordClassifier::builtin();
        let s = c.classify("a giraffe");
        assert_eq!(s.target, "giraffe");
        assert!((s.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn long_unknown_sentence_is_low_confidence() {
        let c = KeywordClassifier::builtin();
        let s = c.classify("yesterday we walked around downtown after lunch together");
        assert!(!s.has_target());
        assert!(s.confidence < 0.5);
    }

    #[test]
    fn feeling_only_utterance_has_no_target() {
        let c = KeywordClassifier::builtin();
        let s = c.classify("so very happy");
        assert!(!s.has_target());
        assert!(s.sentiment > 0.0);
        assert!(s.emotional_intensity > 0.0);
        assert!((s.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn negative_words_pull_sentiment_down() {
        let c = KeywordClassifier::builtin();
        let s = c.classify("a sad lonely tree");
        assert_eq!(s.target, "tree");
        assert!(s.sentiment < 0.0);
    }

    #[test]
    fn hierarchy_final_label_is_the_word() {
        let c = KeywordClassifier::builtin();
        let h = c.lookup_hierarchy("horse").expect("horse has stages");
        let targets: Vec<&str> = h.stages().iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, ["sphere", "humanoid", "quadruped"]);
        assert_eq!(h.final_stage().unwrap().label, "horse");
    }

    #[test]
    fn word_without_hierarchy_returns_none() {
        let c = KeywordClassifier::builtin();
        assert!(c.lookup_hierarchy("cube").is_none());
        assert!(c.lookup_hierarchy("unknown").is_none());
    }

    #[test]
    fn load_from_extends_builtin() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("dictionary.json");
        std::fs::write(
            &path,
            r#"[{"word":"kite","target":"diamond","abstraction":0.3}]"#,
        )
        .expect("write");

        let c = KeywordClassifier::load_from(&path);
        assert_eq!(c.len(), KeywordClassifier::builtin().len() + 1);
        assert_eq!(c.classify("a kite").target, "diamond");
    }

    #[test]
    fn load_from_bad_json_keeps_builtin() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("dictionary.json");
        std::fs::write(&path, "not json").expect("write");

        let c = KeywordClassifier::load_from(&path);
        assert_eq!(c.len(), KeywordClassifier::builtin().len());
    }

    #[test]
    fn unreadable_dictionary_keeps_builtin() {
        let dir = tempdir().expect("temp dir");
        // A directory exists but cannot be read as a file.
        let c = KeywordClassifier::load_from(dir.path());
        assert_eq!(c.len(), KeywordClassifier::builtin().len());
        assert_eq!(c.classify("a horse").dominant_word, "horse");
    }
}
