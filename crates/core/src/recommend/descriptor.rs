use crate::emotion::Emotion;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Valence {
    Positive,
    Neutral,
    Negative,
}

/// What to search for when a listener is in a given mood.
/// Genres are ordered by preference.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct EmotionDescriptor {
    pub emotion: Emotion,
    pub genres: &'static [&'static str],
    pub mood: &'static str,
    pub energy: EnergyLevel,
    pub valence: Valence,
}

static HAPPY: EmotionDescriptor = EmotionDescriptor {
    emotion: Emotion::Happy,
    genres: &["pop", "dance", "indie-pop", "happy"],
    mood: "upbeat",
    energy: EnergyLevel::High,
    valence: Valence::Positive,
};

static SAD: EmotionDescriptor = EmotionDescriptor {
    emotion: Emotion::Sad,
    genres: &["indie", "acoustic", "sad", "ballad"],
    mood: "melancholic",
    energy: EnergyLevel::Low,
    valence: Valence::Negative,
};

static ENERGETIC: EmotionDescriptor = EmotionDescriptor {
    emotion: Emotion::Energetic,
    genres: &["rock", "electronic", "hip-hop", "workout"],
    mood: "energetic",
    energy: EnergyLevel::VeryHigh,
    valence: Valence::Positive,
};

static CALM: EmotionDescriptor = EmotionDescriptor {
    emotion: Emotion::Calm,
    genres: &["ambient", "classical", "meditation", "chill"],
    mood: "peaceful",
    energy: EnergyLevel::Low,
    valence: Valence::Neutral,
};

static STRESSED: EmotionDescriptor = EmotionDescriptor {
    emotion: Emotion::Stressed,
    genres: &["ambient", "nature-sounds", "meditation", "zen"],
    mood: "relaxing",
    energy: EnergyLevel::VeryLow,
    valence: Valence::Neutral,
};

static NEUTRAL: EmotionDescriptor = EmotionDescriptor {
    emotion: Emotion::Neutral,
    genres: &["indie", "pop", "chill", "easy-listening"],
    mood: "neutral",
    energy: EnergyLevel::Medium,
    valence: Valence::Neutral,
};

pub fn describe(emotion: Emotion) -> &'static EmotionDescriptor {
    match emotion {
        Emotion::Happy => &HAPPY,
        Emotion::Sad => &SAD,
        Emotion::Energetic => &ENERGETIC,
        Emotion::Calm => &CALM,
        Emotion::Stressed => &STRESSED,
        Emotion::Neutral => &NEUTRAL,
    }
}

/// Like [`describe`], for raw labels; unknown labels get the neutral entry.
pub fn describe_label(label: &str) -> &'static EmotionDescriptor {
    describe(Emotion::from_label(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_has_genres() {
        for e in Emotion::ALL {
            let d = describe(e);
            assert_eq!(d.emotion, e);
            assert!(!d.genres.is_empty());
            assert!(!d.mood.is_empty());
        }
    }

    #[test]
    fn unknown_label_is_neutral_descriptor() {
        assert_eq!(describe_label("Unknown"), describe_label("neutral"));
        assert_eq!(describe_label("Unknown"), describe(Emotion::Neutral));
    }

    #[test]
    fn label_lookup_is_case_insensitive() {
        assert_eq!(describe_label("STRESSED").mood, "relaxing");
    }

    #[test]
    fn descriptor_triples_are_fixed() {
        let d = describe(Emotion::Energetic);
        assert_eq!(d.genres[..2], ["rock", "electronic"]);
        assert_eq!((d.mood, d.energy, d.valence), ("energetic", EnergyLevel::VeryHigh, Valence::Positive));

        let d = describe(Emotion::Sad);
        assert_eq!((d.mood, d.energy, d.valence), ("melancholic", EnergyLevel::Low, Valence::Negative));
    }

    #[test]
    fn energy_serializes_kebab_case() {
        let json = serde_json::to_value(describe(Emotion::Stressed)).unwrap();
        assert_eq!(json["energy"], "very-low");
        assert_eq!(json["valence"], "neutral");
        assert_eq!(json["emotion"], "stressed");
        assert_eq!(json["genres"][1], "nature-sounds");
    }
}
