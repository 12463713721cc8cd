use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::PrepError;
use crate::pipeline::traits::WaveformSource;
use crate::types::{Segment, Split, TargetLang};

/// The source side of every language pair.
pub const SOURCE_LANG: &str = "en";

/// One record of the per-split alignment metadata file.
#[derive(Debug, Deserialize)]
struct SegmentRecord {
    wav: String,
    /// Decimal seconds from the start of the recording.
    offset: f64,
    duration: f64,
    speaker_id: String,
}

/// Builds the per-utterance segment index for one (language, split).
///
/// Segments are grouped by source recording (first-appearance order), each
/// group stable-sorted by ascending offset, and numbered within the group to
/// derive utterance ids. Deterministic for a fixed input.
pub fn load_split_segments(
    data_root: &Path,
    lang: TargetLang,
    split: Split,
    source: &dyn WaveformSource,
) -> Result<Vec<Segment>, PrepError> {
    let split_root = data_root
        .join(lang.pair_dir())
        .join("data")
        .join(split.as_str());
    let wav_root = split_root.join("wav");
    let txt_root = split_root.join("txt");
    for dir in [&split_root, &wav_root, &txt_root] {
        if !dir.is_dir() {
            return Err(PrepError::corpus_integrity(
                "locating split directories",
                format!("missing directory '{}'", dir.display()),
            ));
        }
    }

    let yaml_path = txt_root.join(format!("{}.yaml", split.as_str()));
    let yaml_text = std::fs::read_to_string(&yaml_path)
        .map_err(|e| PrepError::io("reading segment metadata", e))?;
    let records: Vec<SegmentRecord> =
        serde_yaml::from_str(&yaml_text).map_err(|e| PrepError::yaml("parsing segment metadata", e))?;

    let source_lines = read_transcript(&txt_root, split, SOURCE_LANG, records.len())?;
    let target_lines = read_transcript(&txt_root, split, lang.as_str(), records.len())?;

    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        groups
            .entry(record.wav.clone())
            .or_insert_with(|| {
                group_order.push(record.wav.clone());
                Vec::new()
            })
            .push(idx);
    }

    let mut segments = Vec::with_capacity(records.len());
    for wav_name in &group_order {
        let wav_path = wav_root.join(wav_name);
        let info = source.info(&wav_path)?;
        let rate = f64::from(info.sample_rate_hz);

        let mut members = groups[wav_name].clone();
        // Stable sort: equal offsets keep original record order.
        members.sort_by(|&a, &b| {
            records[a]
                .offset
                .partial_cmp(&records[b].offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let stem = Path::new(wav_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| wav_name.clone());

        for (index_in_group, &idx) in members.iter().enumerate() {
            let record = &records[idx];
            if record.offset < 0.0 || record.duration < 0.0 {
                return Err(PrepError::corpus_integrity(
                    "validating segment timing",
                    format!(
                        "negative offset or duration for '{wav_name}' (offset {}, duration {})",
                        record.offset, record.duration
                    ),
                ));
            }
            let offset_samples = (record.offset * rate).floor() as u64;
            let duration_samples = (record.duration * rate).floor() as u64;
            if offset_samples + duration_samples > info.total_samples {
                return Err(PrepError::audio_read(
                    &wav_path,
                    format!(
                        "segment window {}..{} exceeds recording length {}",
                        offset_samples,
                        offset_samples + duration_samples,
                        info.total_samples
                    ),
                ));
            }
            segments.push(Segment {
                recording_path: wav_path.clone(),
                offset_samples,
                duration_samples,
                sample_rate_hz: info.sample_rate_hz,
                source_text: source_lines[idx].clone(),
                target_text: target_lines[idx].clone(),
                speaker_id: record.speaker_id.clone(),
                utterance_id: format!("{stem}_{index_in_group}"),
            });
        }
    }
    Ok(segments)
}

fn read_transcript(
    txt_root: &Path,
    split: Split,
    lang: &str,
    expected: usize,
) -> Result<Vec<String>, PrepError> {
    let path = txt_root.join(format!("{}.{lang}", split.as_str()));
    let text =
        std::fs::read_to_string(&path).map_err(|e| PrepError::io("reading transcript", e))?;
    let lines: Vec<String> = text.lines().map(|l| l.trim().to_string()).collect();
    if lines.len() != expected {
        return Err(PrepError::corpus_integrity(
            "aligning transcripts with segments",
            format!(
                "'{}' has {} lines but the split has {} segments",
                path.display(),
                lines.len(),
                expected
            ),
        ));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::pipeline::traits::RecordingInfo;

    struct FixedSource {
        rate: u32,
        total: u64,
    }

    impl WaveformSource for FixedSource {
        fn info(&self, _path: &Path) -> Result<RecordingInfo, PrepError> {
            Ok(RecordingInfo {
                sample_rate_hz: self.rate,
                total_samples: self.total,
            })
        }

        fn read_window(
            &self,
            _path: &Path,
            _offset_samples: u64,
            duration_samples: u64,
        ) -> Result<Vec<f32>, PrepError> {
            Ok(vec![0.0; duration_samples as usize])
        }
    }

    fn write_split(root: &Path, lang: TargetLang, split: Split, yaml: &str, en: &str, tgt: &str) {
        let split_root = root.join(lang.pair_dir()).join("data").join(split.as_str());
        fs::create_dir_all(split_root.join("wav")).expect("create wav dir");
        fs::create_dir_all(split_root.join("txt")).expect("create txt dir");
        fs::write(
            split_root.join("txt").join(format!("{}.yaml", split.as_str())),
            yaml,
        )
        .expect("write yaml");
        fs::write(
            split_root.join("txt").join(format!("{}.en", split.as_str())),
            en,
        )
        .expect("write en");
        fs::write(
            split_root
                .join("txt")
                .join(format!("{}.{}", split.as_str(), lang.as_str())),
            tgt,
        )
        .expect("write target");
    }

    const THREE_SEGMENT_YAML: &str = "\
- {duration: 2.0, offset: 2.0, speaker_id: spk.1, wav: ted_1.wav}
- {duration: 1.5, offset: 0.0, speaker_id: spk.1, wav: ted_1.wav}
- {duration: 1.0, offset: 5.0, speaker_id: spk.2, wav: ted_1.wav}
";

    fn corpus_with_three_segments() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        write_split(
            dir.path(),
            TargetLang::De,
            Split::Train,
            THREE_SEGMENT_YAML,
            "second line\nfirst line\nthird line\n",
            "zweite Zeile\nerste Zeile\ndritte Zeile\n",
        );
        let root = dir.path().to_path_buf();
        (dir, root)
    }

    #[test]
    fn segments_are_sorted_by_offset_and_numbered_within_group() {
        let (_dir, root) = corpus_with_three_segments();
        let source = FixedSource {
            rate: 16_000,
            total: 16_000 * 600,
        };
        let segments =
            load_split_segments(&root, TargetLang::De, Split::Train, &source).expect("load");

        assert_eq!(segments.len(), 3);
        let ids: Vec<&str> = segments.iter().map(|s| s.utterance_id.as_str()).collect();
        assert_eq!(ids, ["ted_1_0", "ted_1_1", "ted_1_2"]);
        let offsets: Vec<u64> = segments.iter().map(|s| s.offset_samples).collect();
        assert_eq!(offsets, [0, 32_000, 80_000]);
        let durations: Vec<u64> = segments.iter().map(|s| s.duration_samples).collect();
        assert_eq!(durations, [24_000, 32_000, 16_000]);
        // Transcripts follow the original record order, not the sorted order.
        assert_eq!(segments[0].source_text, "first line");
        assert_eq!(segments[1].target_text, "zweite Zeile");
        assert_eq!(segments[2].speaker_id, "spk.2");
    }

    #[test]
    fn index_is_deterministic_across_runs() {
        let (_dir, root) = corpus_with_three_segments();
        let source = FixedSource {
            rate: 16_000,
            total: 16_000 * 600,
        };
        let first =
            load_split_segments(&root, TargetLang::De, Split::Train, &source).expect("load");
        let second =
            load_split_segments(&root, TargetLang::De, Split::Train, &source).expect("load");
        assert_eq!(first, second);
    }

    #[test]
    fn transcript_count_mismatch_is_integrity_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_split(
            dir.path(),
            TargetLang::De,
            Split::Dev,
            "- {duration: 1.0, offset: 0.0, speaker_id: spk.1, wav: a.wav}\n",
            "one\nextra\n",
            "eins\n",
        );
        let source = FixedSource {
            rate: 16_000,
            total: 1_000_000,
        };
        let err = load_split_segments(dir.path(), TargetLang::De, Split::Dev, &source).unwrap_err();
        assert!(matches!(err, PrepError::CorpusIntegrity { .. }));
    }

    #[test]
    fn missing_split_directory_is_integrity_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FixedSource {
            rate: 16_000,
            total: 0,
        };
        let err =
            load_split_segments(dir.path(), TargetLang::Ja, Split::Train, &source).unwrap_err();
        assert!(matches!(err, PrepError::CorpusIntegrity { .. }));
    }

    #[test]
    fn window_past_recording_end_is_audio_read_error() {
        let (_dir, root) = corpus_with_three_segments();
        // Recording is shorter than the last window (5.0s + 1.0s).
        let source = FixedSource {
            rate: 16_000,
            total: 16_000 * 5,
        };
        let err = load_split_segments(&root, TargetLang::De, Split::Train, &source).unwrap_err();
        assert!(matches!(err, PrepError::AudioRead { .. }));
    }
}
