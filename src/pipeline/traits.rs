use std::path::Path;

use crate::error::PrepError;
use crate::types::{FeatureArray, VocabType};

/// Header-level facts about a recording, readable without decoding samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingInfo {
    pub sample_rate_hz: u32,
    /// Total samples per channel.
    pub total_samples: u64,
}

/// Raw waveform access for source recordings.
pub trait WaveformSource: Send + Sync {
    fn info(&self, path: &Path) -> Result<RecordingInfo, PrepError>;

    /// Decodes `[offset_samples, offset_samples + duration_samples)` as mono
    /// f32 in [-1, 1]. Windows extending past the recording end fail with
    /// [`PrepError::AudioRead`].
    fn read_window(
        &self,
        path: &Path,
        offset_samples: u64,
        duration_samples: u64,
    ) -> Result<Vec<f32>, PrepError>;
}

/// Per-utterance acoustic feature computation. Implementations must be pure:
/// identical samples and rate yield bit-identical output.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, samples: &[f32], sample_rate_hz: u32) -> Result<FeatureArray, PrepError>;

    /// Number of channels per output frame.
    fn feature_dim(&self) -> usize;
}

/// Opaque subword-model trainer: consumes sentences, emits
/// `<model_prefix>.model` (plus trainer-specific companions).
pub trait SubwordTrainer: Send + Sync {
    fn train(
        &self,
        sentences: &[String],
        model_prefix: &Path,
        vocab_type: VocabType,
        vocab_size: usize,
    ) -> Result<(), PrepError>;
}
