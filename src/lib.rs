pub mod archive;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod vocab;

pub use config::{CmvnType, FilterConfig, PrepConfig};
pub use error::PrepError;
pub use pipeline::builder::CorpusPreparerBuilder;
pub use pipeline::runtime::{CorpusPreparer, ARCHIVE_FILENAME, GCMVN_FILENAME};
pub use pipeline::traits::{FeatureExtractor, RecordingInfo, SubwordTrainer, WaveformSource};
pub use types::{
    ArchiveIndexEntry, FeatureArray, GcmvnStats, Segment, Split, TargetLang, Task, Utterance,
    VocabType,
};
