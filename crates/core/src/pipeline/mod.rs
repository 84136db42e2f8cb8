use crate::{
    decode::{decode_bytes, decode_file, DecodeError},
    emotion::{Emotion, EmotionAnalyzer, RuleBasedAnalyzer},
    features::{extract, FeatureVector},
    signal::AudioSignal,
};
use bytes::Bytes;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

const LOG_TARGET: &str = "pipeline";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct VoiceAnalysis {
    pub emotion: Emotion,
    pub features: FeatureVector,
}

/// Label normalization plus the decode, extract and classify chain for audio.
///
/// Voice analysis never fails from the caller's point of view: any decode
/// problem is logged and reported as [`Emotion::Neutral`].
pub struct EmotionPipeline<A> {
    analyzer: Arc<A>,
}

impl<A> Clone for EmotionPipeline<A> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
        }
    }
}

impl Default for EmotionPipeline<RuleBasedAnalyzer> {
    fn default() -> Self {
        Self::new(RuleBasedAnalyzer::new())
    }
}

impl<A: EmotionAnalyzer + 'static> EmotionPipeline<A> {
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }

    /// Canonical labels pass through; free text goes through the keyword
    /// rules; a missing or blank label is neutral.
    pub fn resolve_label(&self, label: Option<&str>) -> Emotion {
        let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
            return Emotion::Neutral;
        };
        Emotion::parse_canonical(label).unwrap_or_else(|| self.analyzer.analyze_text(label))
    }

    pub fn analyze_signal(&self, signal: &AudioSignal) -> VoiceAnalysis {
        let features = extract(signal);
        let emotion = self.analyzer.analyze_features(&features);
        tracing::debug!(
            target: LOG_TARGET,
            %emotion,
            duration = ?signal.duration(),
            sample_rate = signal.sample_rate(),
            "classified audio"
        );
        VoiceAnalysis { emotion, features }
    }

    pub fn analyze_file(&self, path: &Path) -> Result<VoiceAnalysis, DecodeError> {
        let signal = decode_file(path)?;
        Ok(self.analyze_signal(&signal))
    }

    /// Decode and classify an upload on the blocking pool.
    pub async fn analyze_voice(&self, audio: Bytes, extension: Option<String>) -> Emotion {
        let analyzer = Arc::clone(&self.analyzer);
        let size = audio.len();
        let job = tokio::task::spawn_blocking(move || {
            let signal = decode_bytes(audio, extension.as_deref())?;
            let features = extract(&signal);
            Ok::<_, DecodeError>(analyzer.analyze_features(&features))
        });
        match job.await {
            Ok(Ok(emotion)) => emotion,
            Ok(Err(e)) => {
                tracing::warn!(target: LOG_TARGET, error = %e, bytes = size, "audio analysis failed");
                Emotion::Neutral
            }
            Err(e) => {
                tracing::error!(target: LOG_TARGET, error = %e, "analysis task panicked");
                Emotion::Neutral
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{ENERGY, TEMPO};
    use std::f32::consts::PI;
    use std::io::Cursor;

    fn pipeline() -> EmotionPipeline<RuleBasedAnalyzer> {
        EmotionPipeline::default()
    }

    fn wav_bytes(samples: &[i16], sample_rate: u32) -> Bytes {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        Bytes::from(cursor.into_inner())
    }

    #[test]
    fn canonical_labels_pass_through() {
        let p = pipeline();
        assert_eq!(p.resolve_label(Some("Happy")), Emotion::Happy);
        assert_eq!(p.resolve_label(Some("CALM")), Emotion::Calm);
    }

    #[test]
    fn free_text_uses_keywords() {
        let p = pipeline();
        assert_eq!(p.resolve_label(Some("feeling anxious")), Emotion::Stressed);
        assert_eq!(p.resolve_label(Some("joyful")), Emotion::Happy);
        assert_eq!(p.resolve_label(Some("surprised")), Emotion::Neutral);
    }

    #[test]
    fn missing_or_blank_label_is_neutral() {
        let p = pipeline();
        assert_eq!(p.resolve_label(None), Emotion::Neutral);
        assert_eq!(p.resolve_label(Some("   ")), Emotion::Neutral);
    }

    #[test]
    fn silent_signal_is_classified() {
        let p = pipeline();
        let analysis = p.analyze_signal(&AudioSignal::new(vec![0.0; 22_050], 22_050));
        assert!(analysis.features.missing_keys().is_empty());
        // No energy, no rhythm, no brightness.
        assert_eq!(analysis.features.get(ENERGY), Some(0.0));
        assert_eq!(analysis.features.get(TEMPO), Some(crate::features::NO_TEMPO));
        assert_eq!(analysis.emotion, Emotion::Sad);
    }

    #[tokio::test]
    async fn undecodable_upload_is_neutral() {
        let p = pipeline();
        let emotion = p
            .analyze_voice(Bytes::from_static(b"definitely not audio"), Some("mp3".to_owned()))
            .await;
        assert_eq!(emotion, Emotion::Neutral);
    }

    #[tokio::test]
    async fn empty_upload_is_neutral() {
        assert_eq!(pipeline().analyze_voice(Bytes::new(), None).await, Emotion::Neutral);
    }

    #[tokio::test]
    async fn silent_wav_matches_signal_path() {
        let p = pipeline();
        let bytes = wav_bytes(&vec![0i16; 22_050], 22_050);
        assert_eq!(p.analyze_voice(bytes, Some("wav".to_owned())).await, Emotion::Sad);
    }

    fn tone(freq: f32, amplitude: f32, sample_rate: u32, secs: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * secs) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn tone_label_does_not_depend_on_sample_rate() {
        let p = pipeline();
        let labels: Vec<Emotion> = [22_050, 44_100, 48_000]
            .into_iter()
            .map(|rate| {
                p.analyze_signal(&AudioSignal::new(tone(1_500.0, 0.43, rate, 5.0), rate))
                    .emotion
            })
            .collect();
        assert_eq!(labels, vec![Emotion::Happy; 3]);
    }

    #[tokio::test]
    async fn cd_rate_wav_is_classified_at_analysis_rate() {
        let p = pipeline();
        let pcm: Vec<i16> = tone(1_500.0, 0.43, 44_100, 5.0)
            .into_iter()
            .map(|s| (s * 32_767.0) as i16)
            .collect();
        let bytes = wav_bytes(&pcm, 44_100);

        let signal = crate::decode::decode_bytes(bytes.clone(), Some("wav")).unwrap();
        assert_eq!(signal.sample_rate(), crate::signal::ANALYSIS_SAMPLE_RATE);

        assert_eq!(p.analyze_voice(bytes, Some("wav".to_owned())).await, Emotion::Happy);
    }

    struct AlwaysCalm;

    impl EmotionAnalyzer for AlwaysCalm {
        fn analyze_features(&self, _features: &FeatureVector) -> Emotion {
            Emotion::Calm
        }

        fn analyze_text(&self, _text: &str) -> Emotion {
            Emotion::Calm
        }
    }

    #[test]
    fn analyzer_is_pluggable() {
        let p = EmotionPipeline::new(AlwaysCalm);
        assert_eq!(p.resolve_label(Some("whatever")), Emotion::Calm);
        assert_eq!(p.resolve_label(Some("sad")), Emotion::Sad);
        let analysis = p.analyze_signal(&AudioSignal::new(vec![0.1; 4096], 8000));
        assert_eq!(analysis.emotion, Emotion::Calm);
    }
}
