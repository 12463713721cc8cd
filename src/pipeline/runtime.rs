use std::collections::HashMap;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::archive::{read_archive_index, verify_packed_ids, FeatureArchiveWriter};
use crate::config::{CmvnType, PrepConfig};
use crate::corpus::materialize::SplitDataset;
use crate::corpus::segments::load_split_segments;
use crate::error::PrepError;
use crate::features::gcmvn::{write_gcmvn_npz, GcmvnAccumulator};
use crate::manifest::{
    apply_length_filter, manifest_rows, n_frames_for_duration_ms, write_manifest, UtteranceRow,
};
use crate::pipeline::traits::{FeatureExtractor, SubwordTrainer, WaveformSource};
use crate::report::{
    write_report, Artifacts, ManifestSummary, Meta, PrepReport, REPORT_SCHEMA_VERSION,
};
use crate::types::{ArchiveIndexEntry, Split, TargetLang, Task};
use crate::vocab::{spm_prefix, write_task_config, TaskConfig};

pub const ARCHIVE_FILENAME: &str = "fbank80.zip";
pub const GCMVN_FILENAME: &str = "gcmvn.npz";
const REPORT_FILENAME: &str = "prep_report.json";

/// Sequential, single-threaded corpus preparation pipeline.
///
/// Determinism rests on three orderings that must not change: segment
/// group/offset order (utterance numbering), feature production order
/// (archive reproducibility), and training traversal order (the bounded
/// statistics sample).
pub struct CorpusPreparer {
    config: PrepConfig,
    waveform_source: Box<dyn WaveformSource>,
    feature_extractor: Box<dyn FeatureExtractor>,
    subword_trainer: Box<dyn SubwordTrainer>,
}

pub(crate) struct CorpusPreparerParts {
    pub config: PrepConfig,
    pub waveform_source: Box<dyn WaveformSource>,
    pub feature_extractor: Box<dyn FeatureExtractor>,
    pub subword_trainer: Box<dyn SubwordTrainer>,
}

impl std::fmt::Debug for CorpusPreparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusPreparer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CorpusPreparer {
    pub(crate) fn from_parts(parts: CorpusPreparerParts) -> Self {
        Self {
            config: parts.config,
            waveform_source: parts.waveform_source,
            feature_extractor: parts.feature_extractor,
            subword_trainer: parts.subword_trainer,
        }
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Prepares every requested language. Languages without a corpus
    /// subdirectory are skipped with a warning; an integrity failure aborts
    /// that language only and the remaining languages still run.
    pub fn run(&self) -> Result<(), PrepError> {
        let mut failed: Vec<TargetLang> = Vec::new();
        for &lang in &self.config.languages {
            let lang_root = self.config.language_root(lang);
            if !lang_root.is_dir() {
                tracing::warn!(
                    language = lang.as_str(),
                    root = %lang_root.display(),
                    "corpus directory missing, skipping language"
                );
                continue;
            }
            match self.prepare_language(lang) {
                Ok(()) => {}
                Err(err @ PrepError::CorpusIntegrity { .. }) => {
                    tracing::error!(
                        language = lang.as_str(),
                        error = %err,
                        "language failed an integrity check, continuing with remaining languages"
                    );
                    failed.push(lang);
                }
                Err(err) => return Err(err),
            }
        }
        if !failed.is_empty() {
            let names: Vec<&str> = failed.iter().map(|lang| lang.as_str()).collect();
            return Err(PrepError::corpus_integrity(
                "preparing corpus",
                format!("{} language(s) failed: {}", names.len(), names.join(", ")),
            ));
        }
        Ok(())
    }

    fn prepare_language(&self, lang: TargetLang) -> Result<(), PrepError> {
        let out_root = self.config.output_root_for(lang);
        std::fs::create_dir_all(&out_root).map_err(|e| PrepError::io("creating output root", e))?;
        let archive_path = out_root.join(ARCHIVE_FILENAME);
        let gcmvn_path = out_root.join(GCMVN_FILENAME);

        if archive_path.exists() {
            tracing::info!(
                archive = %archive_path.display(),
                "feature archive already sealed, skipping extraction"
            );
        } else {
            self.pack_features(lang, &archive_path, &gcmvn_path)?;
        }

        let index = read_archive_index(&archive_path)?;
        let (manifests, train_text_asr, train_text_st) =
            self.generate_manifests(lang, &out_root, &archive_path, &index)?;

        let mut vocab_models = Vec::new();
        for &task in &self.config.tasks {
            let train_text = match task {
                Task::Asr => &train_text_asr,
                Task::St => &train_text_st,
            };
            let vocab_size = self.config.vocab_size_for(task);
            let prefix = spm_prefix(self.config.vocab_type, vocab_size, task);
            tracing::info!(
                task = task.as_str(),
                model = %prefix,
                sentences = train_text.len(),
                "training subword vocabulary"
            );
            self.subword_trainer.train(
                train_text,
                &out_root.join(&prefix),
                self.config.vocab_type,
                vocab_size,
            )?;

            let model_filename = format!("{prefix}.model");
            let task_config = TaskConfig::new(
                model_filename.clone(),
                self.config.cmvn_type,
                match self.config.cmvn_type {
                    CmvnType::Global => Some(gcmvn_path.as_path()),
                    CmvnType::Utterance => None,
                },
            );
            write_task_config(&out_root, task, &task_config)?;
            vocab_models.push(model_filename);
        }

        let report = PrepReport {
            schema_version: REPORT_SCHEMA_VERSION,
            meta: Meta::new(
                &self.config.data_root,
                lang.as_str(),
                self.config.cmvn_type.as_str(),
            ),
            manifests,
            artifacts: Artifacts {
                archive: archive_path.display().to_string(),
                gcmvn_stats: match self.config.cmvn_type {
                    CmvnType::Global => Some(gcmvn_path.display().to_string()),
                    CmvnType::Utterance => None,
                },
                vocab_models,
            },
        };
        write_report(&out_root.join(REPORT_FILENAME), &report)?;
        tracing::info!(
            language = lang.as_str(),
            output = %out_root.display(),
            "language preparation complete"
        );
        Ok(())
    }

    /// Pack phase: extract features for every split into a fresh archive,
    /// folding the bounded training sample into the statistics accumulator
    /// along the way, then seal and verify via the rebuilt index. The archive
    /// is assembled under a `.part` name and only renamed into place once
    /// verified, so an interrupted run never leaves a sealed-looking archive.
    fn pack_features(
        &self,
        lang: TargetLang,
        archive_path: &Path,
        gcmvn_path: &Path,
    ) -> Result<(), PrepError> {
        let part_path = archive_path.with_extension("zip.part");
        let mut archive = FeatureArchiveWriter::create(&part_path)?;
        let mut gcmvn = match self.config.cmvn_type {
            CmvnType::Global => Some(GcmvnAccumulator::new(self.config.gcmvn_max_num)),
            CmvnType::Utterance => None,
        };

        for split in Split::ALL {
            tracing::info!(
                language = lang.as_str(),
                split = split.as_str(),
                "extracting log-mel filterbank features"
            );
            let segments = load_split_segments(
                &self.config.data_root,
                lang,
                split,
                self.waveform_source.as_ref(),
            )?;
            let dataset = SplitDataset::new(segments);
            let progress = split_progress(dataset.len(), "extracting", split);
            for utterance in dataset.utterances(self.waveform_source.as_ref()) {
                let utterance = utterance?;
                let features = self
                    .feature_extractor
                    .extract(&utterance.waveform, utterance.sample_rate_hz)?;
                if split.is_train() {
                    if let Some(accumulator) = gcmvn.as_mut() {
                        accumulator.push(&features);
                    }
                }
                archive.append(&utterance.utterance_id, &features)?;
                progress.inc(1);
            }
            progress.finish_and_clear();

            if split.is_train() {
                if let Some(accumulator) = gcmvn.as_ref() {
                    let stats = accumulator.finalize()?;
                    write_gcmvn_npz(gcmvn_path, &stats)?;
                    tracing::info!(
                        sampled = accumulator.len(),
                        stats = %gcmvn_path.display(),
                        "estimated global cmvn statistics"
                    );
                }
            }
        }

        let packed_ids = archive.seal()?;
        let index = read_archive_index(&part_path)?;
        verify_packed_ids(&index, &packed_ids)?;
        std::fs::rename(&part_path, archive_path)
            .map_err(|e| PrepError::io("moving sealed archive into place", e))?;
        tracing::info!(
            members = packed_ids.len(),
            archive = %archive_path.display(),
            "sealed feature archive"
        );
        Ok(())
    }

    /// Manifest phase: a second materialization pass, decoupled from packing
    /// so no feature array stays in memory; joins against the rebuilt index
    /// and gathers the training transcripts for the vocabulary stage.
    fn generate_manifests(
        &self,
        lang: TargetLang,
        out_root: &Path,
        archive_path: &Path,
        index: &HashMap<String, ArchiveIndexEntry>,
    ) -> Result<(Vec<ManifestSummary>, Vec<String>, Vec<String>), PrepError> {
        let mut summaries = Vec::new();
        let mut train_text_asr = Vec::new();
        let mut train_text_st = Vec::new();

        for split in Split::ALL {
            let segments = load_split_segments(
                &self.config.data_root,
                lang,
                split,
                self.waveform_source.as_ref(),
            )?;
            let dataset = SplitDataset::new(segments);
            let progress = split_progress(dataset.len(), "manifesting", split);
            let mut rows = Vec::with_capacity(dataset.len());
            for utterance in dataset.utterances(self.waveform_source.as_ref()) {
                let utterance = utterance?;
                let entry = index
                    .get(&utterance.utterance_id)
                    .copied()
                    .ok_or_else(|| PrepError::missing_index_entry(&utterance.utterance_id))?;
                let duration_ms =
                    utterance.waveform.len() as u64 * 1000 / u64::from(utterance.sample_rate_hz);
                rows.push(UtteranceRow {
                    id: utterance.utterance_id,
                    audio: entry.pointer(archive_path),
                    n_frames: n_frames_for_duration_ms(duration_ms),
                    speaker: utterance.speaker_id,
                    source_text: utterance.source_text,
                    target_text: utterance.target_text,
                });
                progress.inc(1);
            }
            progress.finish_and_clear();

            if split.is_train() {
                train_text_asr.extend(rows.iter().map(|row| row.source_text.clone()));
                train_text_st.extend(rows.iter().map(|row| row.target_text.clone()));
            }

            for &task in &self.config.tasks {
                let task_rows = manifest_rows(&rows, task);
                let total = task_rows.len();
                let (kept, dropped) =
                    apply_length_filter(task_rows, split.is_train(), &self.config.filter);
                let manifest_path =
                    out_root.join(format!("{}_{}.tsv", split.as_str(), task.as_str()));
                write_manifest(&manifest_path, &kept)?;
                if dropped > 0 {
                    tracing::info!(
                        split = split.as_str(),
                        task = task.as_str(),
                        kept = kept.len(),
                        total,
                        "dropped out-of-band training rows"
                    );
                }
                summaries.push(ManifestSummary {
                    split: split.as_str().to_string(),
                    task: task.as_str().to_string(),
                    rows_total: total,
                    rows_kept: kept.len(),
                    path: manifest_path.display().to_string(),
                });
            }
        }
        Ok((summaries, train_text_asr, train_text_st))
    }
}

fn split_progress(len: usize, stage: &str, split: Split) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message(format!("{stage} {}", split.as_str()));
    progress
}
