use crate::emotion::Emotion;
use crate::features::{FeatureVector, ENERGY, SPECTRAL_CENTROID, TEMPO, ZCR};

/// Applied only when `tempo` is absent; extraction itself reports 0 for no rhythm.
pub const DEFAULT_TEMPO: f64 = 120.0;
pub const DEFAULT_SPECTRAL_CENTROID: f64 = 2000.0;
pub const DEFAULT_ZCR: f64 = 0.0;
pub const DEFAULT_ENERGY: f64 = 0.0;

/// Seam for swapping the hand-tuned rules for a trained model.
/// Implementations must be total: every input maps to some label.
pub trait EmotionAnalyzer: Send + Sync {
    fn analyze_features(&self, features: &FeatureVector) -> Emotion;

    fn analyze_text(&self, text: &str) -> Emotion;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedAnalyzer;

impl RuleBasedAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl EmotionAnalyzer for RuleBasedAnalyzer {
    fn analyze_features(&self, features: &FeatureVector) -> Emotion {
        classify_features(features)
    }

    fn analyze_text(&self, text: &str) -> Emotion {
        classify_text(text)
    }
}

// Priority order matters: the first group with any substring hit wins.
const KEYWORD_RULES: [(Emotion, &[&str]); 5] = [
    (Emotion::Happy, &["happy", "joy"]),
    (Emotion::Sad, &["sad", "depress"]),
    (Emotion::Energetic, &["energetic", "excite"]),
    (Emotion::Calm, &["calm", "peace"]),
    (Emotion::Stressed, &["stress", "anxious"]),
];

pub fn classify_text(hint: &str) -> Emotion {
    let lower = hint.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(emotion, _)| *emotion)
        .unwrap_or(Emotion::Neutral)
}

/// The four scalars the decision list reads, with defaults already applied.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Readings {
    zcr: f64,
    energy: f64,
    tempo: f64,
    spectral_centroid: f64,
}

impl Readings {
    fn from_features(features: &FeatureVector) -> Self {
        Self {
            zcr: features.get_or(ZCR, DEFAULT_ZCR),
            energy: features.get_or(ENERGY, DEFAULT_ENERGY),
            tempo: features.get_or(TEMPO, DEFAULT_TEMPO),
            spectral_centroid: features.get_or(SPECTRAL_CENTROID, DEFAULT_SPECTRAL_CENTROID),
        }
    }
}

struct FeatureRule {
    name: &'static str,
    matches: fn(&Readings) -> bool,
    emotion: Emotion,
}

// Evaluated top to bottom, first match wins. Reordering changes outcomes on
// overlapping conditions, and the constants are frozen.
const FEATURE_RULES: &[FeatureRule] = &[
    FeatureRule {
        name: "loud_and_fast",
        matches: |r| r.energy > 0.1 && r.tempo > 140.0,
        emotion: Emotion::Energetic,
    },
    FeatureRule {
        name: "quiet_slow_dark",
        matches: |r| r.energy < 0.05 && r.tempo < 80.0 && r.spectral_centroid < 1500.0,
        emotion: Emotion::Sad,
    },
    FeatureRule {
        name: "quiet_slow",
        matches: |r| r.energy < 0.05 && r.tempo < 80.0,
        emotion: Emotion::Calm,
    },
    FeatureRule {
        name: "noisy_and_loud",
        matches: |r| r.zcr > 0.1 && r.energy > 0.08,
        emotion: Emotion::Happy,
    },
    FeatureRule {
        name: "dark",
        matches: |r| r.spectral_centroid < 1000.0,
        emotion: Emotion::Stressed,
    },
];

pub fn classify_features(features: &FeatureVector) -> Emotion {
    let readings = Readings::from_features(features);
    match FEATURE_RULES.iter().find(|rule| (rule.matches)(&readings)) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, emotion = %rule.emotion, ?readings, "feature rule matched");
            rule.emotion
        }
        None => Emotion::Neutral,
    }
}
