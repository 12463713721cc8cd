use crate::config::{CmvnType, PrepConfig};
use crate::error::PrepError;
use crate::pipeline::defaults::{HoundWaveformSource, LogMelExtractor, SpmCliTrainer};
use crate::pipeline::runtime::{CorpusPreparer, CorpusPreparerParts};
use crate::pipeline::traits::{FeatureExtractor, SubwordTrainer, WaveformSource};
use crate::types::VocabType;

pub struct CorpusPreparerBuilder {
    config: PrepConfig,
    waveform_source: Option<Box<dyn WaveformSource>>,
    feature_extractor: Option<Box<dyn FeatureExtractor>>,
    subword_trainer: Option<Box<dyn SubwordTrainer>>,
}

impl CorpusPreparerBuilder {
    pub fn new(config: PrepConfig) -> Self {
        Self {
            config,
            waveform_source: None,
            feature_extractor: None,
            subword_trainer: None,
        }
    }

    pub fn with_waveform_source(mut self, waveform_source: Box<dyn WaveformSource>) -> Self {
        self.waveform_source = Some(waveform_source);
        self
    }

    pub fn with_feature_extractor(mut self, feature_extractor: Box<dyn FeatureExtractor>) -> Self {
        self.feature_extractor = Some(feature_extractor);
        self
    }

    pub fn with_subword_trainer(mut self, subword_trainer: Box<dyn SubwordTrainer>) -> Self {
        self.subword_trainer = Some(subword_trainer);
        self
    }

    /// Validates the configuration (before any I/O) and assembles the
    /// pipeline, defaulting any seam that was not overridden.
    pub fn build(self) -> Result<CorpusPreparer, PrepError> {
        let config = validated(self.config)?;
        Ok(CorpusPreparer::from_parts(CorpusPreparerParts {
            config,
            waveform_source: self
                .waveform_source
                .unwrap_or_else(|| Box::new(HoundWaveformSource)),
            feature_extractor: self
                .feature_extractor
                .unwrap_or_else(|| Box::new(LogMelExtractor)),
            subword_trainer: self
                .subword_trainer
                .unwrap_or_else(|| Box::new(SpmCliTrainer::default())),
        }))
    }
}

fn validated(mut config: PrepConfig) -> Result<PrepConfig, PrepError> {
    if config.data_root.as_os_str().is_empty() {
        return Err(PrepError::config("data_root must be set"));
    }
    if config.languages.is_empty() {
        return Err(PrepError::config("at least one target language is required"));
    }
    if config.tasks.is_empty() {
        return Err(PrepError::config("at least one task is required"));
    }
    if config.vocab_type != VocabType::Char && config.vocab_size == 0 {
        return Err(PrepError::config(
            "vocab_size must be positive for bpe/unigram models",
        ));
    }
    if config.cmvn_type == CmvnType::Global && config.gcmvn_max_num == 0 {
        return Err(PrepError::config(
            "gcmvn_max_num must be positive for global cmvn",
        ));
    }
    if config.filter.min_n_frames > config.filter.max_n_frames {
        return Err(PrepError::config(
            "min_n_frames must not exceed max_n_frames",
        ));
    }
    dedup_in_place(&mut config.languages);
    dedup_in_place(&mut config.tasks);
    Ok(config)
}

fn dedup_in_place<T: PartialEq + Copy>(values: &mut Vec<T>) {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|&value| {
        if seen.contains(&value) {
            return false;
        }
        seen.push(value);
        true
    });
}
