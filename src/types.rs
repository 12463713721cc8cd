use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::{Array1, Array2};

use crate::error::PrepError;

/// One timed utterance span within a longer source recording, with aligned
/// source/target text.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub recording_path: PathBuf,
    /// Sample window is [offset_samples, offset_samples + duration_samples);
    /// it never extends past the end of the recording.
    pub offset_samples: u64,
    pub duration_samples: u64,
    pub sample_rate_hz: u32,
    pub source_text: String,
    pub target_text: String,
    pub speaker_id: String,
    /// `<recording stem>_<index within recording group>`, groups ordered by
    /// ascending offset.
    pub utterance_id: String,
}

/// Materialized counterpart of a [`Segment`]: the decoded waveform window plus
/// the metadata needed downstream.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub waveform: Vec<f32>,
    pub sample_rate_hz: u32,
    pub source_text: String,
    pub target_text: String,
    pub speaker_id: String,
    pub utterance_id: String,
}

/// Per-channel corpus statistics for global CMVN, length [`N_MELS`] each.
///
/// [`N_MELS`]: crate::features::fbank::N_MELS
#[derive(Debug, Clone, PartialEq)]
pub struct GcmvnStats {
    pub mean: Array1<f32>,
    pub std: Array1<f32>,
}

pub type FeatureArray = Array2<f32>;

/// Byte range of one packed feature array inside the sealed archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveIndexEntry {
    pub byte_offset: u64,
    pub byte_len: u64,
}

impl ArchiveIndexEntry {
    /// Manifest pointer string: `<archive_path>:<offset>-<offset + len>`.
    pub fn pointer(&self, archive_path: &Path) -> String {
        format!(
            "{}:{}-{}",
            archive_path.display(),
            self.byte_offset,
            self.byte_offset + self.byte_len
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Dev,
    TstCommon,
    TstHe,
}

impl Split {
    pub const ALL: [Split; 4] = [Split::Train, Split::Dev, Split::TstCommon, Split::TstHe];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Dev => "dev",
            Self::TstCommon => "tst-COMMON",
            Self::TstHe => "tst-HE",
        }
    }

    pub fn is_train(self) -> bool {
        matches!(self, Self::Train)
    }
}

impl FromStr for Split {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "dev" => Ok(Self::Dev),
            "tst-COMMON" => Ok(Self::TstCommon),
            "tst-HE" => Ok(Self::TstHe),
            other => Err(PrepError::config(format!("unknown split '{other}'"))),
        }
    }
}

/// Translation target language; the source side is always English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLang {
    De,
    Ja,
    Zh,
}

impl TargetLang {
    pub const ALL: [TargetLang; 3] = [TargetLang::De, TargetLang::Ja, TargetLang::Zh];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Ja => "ja",
            Self::Zh => "zh",
        }
    }

    /// Corpus subdirectory for this language pair, e.g. `en-de`.
    pub fn pair_dir(self) -> String {
        format!("en-{}", self.as_str())
    }
}

impl FromStr for TargetLang {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "de" => Ok(Self::De),
            "ja" => Ok(Self::Ja),
            "zh" => Ok(Self::Zh),
            other => Err(PrepError::config(format!(
                "unsupported target language '{other}'"
            ))),
        }
    }
}

/// Which text column feeds the manifest and vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Transcription in the source language.
    Asr,
    /// Translation into the target language.
    St,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asr => "asr",
            Self::St => "st",
        }
    }
}

impl FromStr for Task {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asr" => Ok(Self::Asr),
            "st" => Ok(Self::St),
            other => Err(PrepError::config(format!("unknown task '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VocabType {
    Bpe,
    Unigram,
    Char,
}

impl VocabType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bpe => "bpe",
            Self::Unigram => "unigram",
            Self::Char => "char",
        }
    }
}

impl FromStr for VocabType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bpe" => Ok(Self::Bpe),
            "unigram" => Ok(Self::Unigram),
            "char" => Ok(Self::Char),
            other => Err(PrepError::config(format!("unknown vocabulary type '{other}'"))),
        }
    }
}
