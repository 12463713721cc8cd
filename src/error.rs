use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("invalid configuration: {message}")]
    Config { message: String },
    #[error("corpus integrity violated while {context}: {message}")]
    CorpusIntegrity {
        context: &'static str,
        message: String,
    },
    #[error("audio read failed for '{path}': {message}")]
    AudioRead { path: PathBuf, message: String },
    #[error("degenerate feature input: {message}")]
    DegenerateInput { message: String },
    #[error("feature archive corrupted while {context}: {message}")]
    ArchiveCorruption {
        context: &'static str,
        message: String,
    },
    #[error("no archive index entry for utterance '{utterance_id}'")]
    MissingIndexEntry { utterance_id: String },
    #[error("subword trainer failed while {context}: {message}")]
    VocabTrainer {
        context: &'static str,
        message: String,
    },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error while {context}: {source}")]
    Yaml {
        context: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("manifest error while {context}: {source}")]
    Manifest {
        context: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
}

impl PrepError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn corpus_integrity(context: &'static str, message: impl Into<String>) -> Self {
        Self::CorpusIntegrity {
            context,
            message: message.into(),
        }
    }

    pub(crate) fn audio_read(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::AudioRead {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub(crate) fn degenerate_input(message: impl Into<String>) -> Self {
        Self::DegenerateInput {
            message: message.into(),
        }
    }

    pub(crate) fn archive_corruption(
        context: &'static str,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::ArchiveCorruption {
            context,
            message: message.to_string(),
        }
    }

    pub(crate) fn missing_index_entry(utterance_id: impl Into<String>) -> Self {
        Self::MissingIndexEntry {
            utterance_id: utterance_id.into(),
        }
    }

    pub(crate) fn vocab_trainer(context: &'static str, message: impl std::fmt::Display) -> Self {
        Self::VocabTrainer {
            context,
            message: message.to_string(),
        }
    }

    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn yaml(context: &'static str, source: serde_yaml::Error) -> Self {
        Self::Yaml { context, source }
    }

    pub(crate) fn manifest(context: &'static str, source: csv::Error) -> Self {
        Self::Manifest { context, source }
    }

    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }
}
