use std::path::PathBuf;
use std::str::FromStr;

use crate::error::PrepError;
use crate::types::{Task, TargetLang, VocabType};

/// Feature normalization applied downstream of this pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmvnType {
    /// Per-utterance mean/variance normalization; no corpus statistics needed.
    Utterance,
    /// Corpus-wide statistics estimated over a bounded training sample.
    Global,
}

impl CmvnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utterance => "utterance",
            Self::Global => "global",
        }
    }
}

impl FromStr for CmvnType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utterance" => Ok(Self::Utterance),
            "global" => Ok(Self::Global),
            other => Err(PrepError::config(format!("unknown cmvn type '{other}'"))),
        }
    }
}

/// Training-split manifest filter thresholds.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub min_n_frames: i64,
    pub max_n_frames: i64,
    /// Upper bound on `n_frames / target character count`.
    pub max_frames_per_tgt_char: f64,
}

impl FilterConfig {
    pub const DEFAULT_MIN_N_FRAMES: i64 = 5;
    pub const DEFAULT_MAX_N_FRAMES: i64 = 3_000;
    pub const DEFAULT_MAX_FRAMES_PER_TGT_CHAR: f64 = 30.0;
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_n_frames: Self::DEFAULT_MIN_N_FRAMES,
            max_n_frames: Self::DEFAULT_MAX_N_FRAMES,
            max_frames_per_tgt_char: Self::DEFAULT_MAX_FRAMES_PER_TGT_CHAR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrepConfig {
    pub data_root: PathBuf,
    /// Artifacts land under `<output_root>/en-<lang>`; defaults to the corpus
    /// language directory itself when unset.
    pub output_root: Option<PathBuf>,
    pub languages: Vec<TargetLang>,
    pub tasks: Vec<Task>,
    pub vocab_type: VocabType,
    pub vocab_size: usize,
    /// Per-task overrides; 0 inherits `vocab_size`.
    pub vocab_size_asr: usize,
    pub vocab_size_st: usize,
    pub cmvn_type: CmvnType,
    /// Maximum number of training utterances folded into the global CMVN
    /// sample.
    pub gcmvn_max_num: usize,
    pub filter: FilterConfig,
}

impl PrepConfig {
    pub const DEFAULT_VOCAB_SIZE: usize = 8_000;
    pub const DEFAULT_GCMVN_MAX_NUM: usize = 150_000;

    /// Effective vocabulary size for a task, honoring per-task overrides.
    pub fn vocab_size_for(&self, task: Task) -> usize {
        let override_size = match task {
            Task::Asr => self.vocab_size_asr,
            Task::St => self.vocab_size_st,
        };
        if override_size > 0 {
            override_size
        } else {
            self.vocab_size
        }
    }

    pub fn language_root(&self, lang: TargetLang) -> PathBuf {
        self.data_root.join(lang.pair_dir())
    }

    pub fn output_root_for(&self, lang: TargetLang) -> PathBuf {
        match &self.output_root {
            Some(root) => root.join(lang.pair_dir()),
            None => self.language_root(lang),
        }
    }
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::new(),
            output_root: None,
            languages: Vec::new(),
            tasks: Vec::new(),
            vocab_type: VocabType::Unigram,
            vocab_size: Self::DEFAULT_VOCAB_SIZE,
            vocab_size_asr: 0,
            vocab_size_st: 0,
            cmvn_type: CmvnType::Utterance,
            gcmvn_max_num: Self::DEFAULT_GCMVN_MAX_NUM,
            filter: FilterConfig::default(),
        }
    }
}
