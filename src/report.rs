use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::error::PrepError;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Per-language summary of one preparation run, written alongside the
/// generated artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct PrepReport {
    pub schema_version: u32,
    pub meta: Meta,
    pub manifests: Vec<ManifestSummary>,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub data_root: String,
    pub language: String,
    pub cmvn_type: String,
}

impl Meta {
    pub fn new(data_root: &Path, language: &str, cmvn_type: &str) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            data_root: data_root.display().to_string(),
            language: language.to_string(),
            cmvn_type: cmvn_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestSummary {
    pub split: String,
    pub task: String,
    pub rows_total: usize,
    pub rows_kept: usize,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Artifacts {
    pub archive: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcmvn_stats: Option<String>,
    pub vocab_models: Vec<String>,
}

pub fn write_report(path: &Path, report: &PrepReport) -> Result<(), PrepError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| PrepError::runtime("serializing prep report", e))?;
    std::fs::write(path, json).map_err(|e| PrepError::io("writing prep report", e))?;
    Ok(())
}
