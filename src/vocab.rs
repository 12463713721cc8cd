use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::CmvnType;
use crate::error::PrepError;
use crate::features::fbank::N_MELS;
use crate::types::{Task, VocabType};

/// Special-symbol id convention shared with downstream model loaders.
pub const SPM_BOS_ID: i32 = 0;
pub const SPM_PAD_ID: i32 = 1;
pub const SPM_EOS_ID: i32 = 2;
pub const SPM_UNK_ID: i32 = 3;

const SPECAUGMENT_POLICY: &str = "lb";

/// Vocabulary artifact prefix: `spm_<type><size>_<task>`. Character models
/// carry no size suffix regardless of the configured size.
pub fn spm_prefix(vocab_type: VocabType, vocab_size: usize, task: Task) -> String {
    let size_suffix = match vocab_type {
        VocabType::Char => String::new(),
        VocabType::Bpe | VocabType::Unigram => vocab_size.to_string(),
    };
    format!("spm_{}{size_suffix}_{}", vocab_type.as_str(), task.as_str())
}

/// Companion descriptor written next to each trained vocabulary model.
#[derive(Debug, Clone, Serialize)]
pub struct TaskConfig {
    pub sentencepiece_model: String,
    pub input_channels: u32,
    pub input_feat_per_channel: usize,
    pub specaugment_policy: &'static str,
    pub cmvn_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_cmvn_stats_npz: Option<String>,
}

impl TaskConfig {
    pub fn new(model_filename: String, cmvn_type: CmvnType, gcmvn_path: Option<&Path>) -> Self {
        Self {
            sentencepiece_model: model_filename,
            input_channels: 1,
            input_feat_per_channel: N_MELS,
            specaugment_policy: SPECAUGMENT_POLICY,
            cmvn_type: cmvn_type.as_str(),
            global_cmvn_stats_npz: gcmvn_path.map(|p| p.display().to_string()),
        }
    }
}

pub fn write_task_config(
    out_root: &Path,
    task: Task,
    config: &TaskConfig,
) -> Result<PathBuf, PrepError> {
    let path = out_root.join(format!("config_{}.yaml", task.as_str()));
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| PrepError::yaml("serializing task config", e))?;
    std::fs::write(&path, yaml).map_err(|e| PrepError::io("writing task config", e))?;
    Ok(path)
}
