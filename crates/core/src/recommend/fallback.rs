use crate::emotion::Emotion;
use crate::recommend::{Recommendation, RecommendationKind};

pub const FALLBACK_ARTIST: &str = "Various Artists";
pub const FALLBACK_URL: &str = "#";

fn playlist_names(emotion: Emotion) -> &'static [&'static str; 5] {
    match emotion {
        Emotion::Happy => &[
            "Happy Hits 2024",
            "Upbeat Pop Mix",
            "Feel Good Music",
            "Dance Party",
            "Sunny Day Vibes",
        ],
        Emotion::Sad => &[
            "Melancholic Melodies",
            "Emotional Ballads",
            "Reflective Tunes",
            "Rainy Day Music",
            "Heartbreak Songs",
        ],
        Emotion::Energetic => &[
            "High Energy Workout",
            "Power Anthems",
            "Energetic Beats",
            "Pump Up Music",
            "Workout Motivation",
        ],
        Emotion::Calm => &[
            "Peaceful Sounds",
            "Meditation Music",
            "Relaxing Vibes",
            "Calm Instrumentals",
            "Zen Garden",
        ],
        Emotion::Stressed => &[
            "Stress Relief",
            "Calming Nature Sounds",
            "Zen Music",
            "Anxiety Relief",
            "Peaceful Meditation",
        ],
        Emotion::Neutral => &[
            "Chill Vibes",
            "Background Music",
            "Easy Listening",
            "Indie Mix",
            "Casual Listening",
        ],
    }
}

/// Static playlists used whenever remote search yields nothing.
pub fn fallback_recommendations(emotion: Emotion) -> Vec<Recommendation> {
    playlist_names(emotion)
        .iter()
        .map(|name| Recommendation {
            name: (*name).to_owned(),
            artist: FALLBACK_ARTIST.to_owned(),
            url: FALLBACK_URL.to_owned(),
            kind: RecommendationKind::Playlist,
            image: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_has_five_playlists() {
        for e in Emotion::ALL {
            let items = fallback_recommendations(e);
            assert_eq!(items.len(), 5, "{e}");
            assert!(items.iter().all(|r| r.kind == RecommendationKind::Playlist));
            assert!(items.iter().all(|r| r.artist == FALLBACK_ARTIST && r.url == FALLBACK_URL));
        }
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(
            fallback_recommendations(Emotion::Calm),
            fallback_recommendations(Emotion::Calm)
        );
        assert_eq!(fallback_recommendations(Emotion::Neutral)[0].name, "Chill Vibes");
        assert_eq!(fallback_recommendations(Emotion::Stressed)[3].name, "Anxiety Relief");
    }

    #[test]
    fn fallback_json_matches_wire_shape() {
        let json = serde_json::to_value(&fallback_recommendations(Emotion::Happy)[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Happy Hits 2024",
                "artist": "Various Artists",
                "url": "#",
                "type": "playlist"
            })
        );
    }
}
