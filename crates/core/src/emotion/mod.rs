mod analyzer;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use analyzer::{classify_features, classify_text, EmotionAnalyzer, RuleBasedAnalyzer};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Energetic,
    Calm,
    Stressed,
    #[default]
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Energetic,
        Emotion::Calm,
        Emotion::Stressed,
        Emotion::Neutral,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Energetic => "energetic",
            Emotion::Calm => "calm",
            Emotion::Stressed => "stressed",
            Emotion::Neutral => "neutral",
        }
    }

    /// Exact match against the canonical labels after trimming and case-folding.
    pub fn parse_canonical(label: &str) -> Option<Self> {
        let folded = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|e| e.as_str() == folded)
    }

    /// Boundary normalization: anything outside the closed set becomes `Neutral`.
    pub fn from_label(label: &str) -> Self {
        Self::parse_canonical(label).unwrap_or_default()
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_label_case_folds_and_trims() {
        assert_eq!(Emotion::from_label("HAPPY"), Emotion::Happy);
        assert_eq!(Emotion::from_label("  Calm "), Emotion::Calm);
        assert_eq!(Emotion::from_label("stressed"), Emotion::Stressed);
    }

    #[test]
    fn unknown_labels_collapse_to_neutral() {
        assert_eq!(Emotion::from_label("Unknown"), Emotion::Neutral);
        assert_eq!(Emotion::from_label(""), Emotion::Neutral);
        assert_eq!(Emotion::parse_canonical("angry"), None);
    }

    #[test]
    fn serializes_as_lowercase_label() {
        let json = serde_json::to_string(&Emotion::Energetic).unwrap();
        assert_eq!(json, "\"energetic\"");
        let back: Emotion = serde_json::from_str("\"sad\"").unwrap();
        assert_eq!(back, Emotion::Sad);
    }

    #[test]
    fn display_matches_as_str() {
        for e in Emotion::ALL {
            assert_eq!(e.to_string(), e.as_str());
        }
    }
}
