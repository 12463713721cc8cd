use std::path::Path;

use crate::config::FilterConfig;
use crate::error::PrepError;
use crate::types::Task;

pub const MANIFEST_COLUMNS: [&str; 5] = ["id", "audio", "n_frames", "tgt_text", "speaker"];

/// Frame-count approximation for length filtering: fixed 25 ms window / 10 ms
/// hop applied to the decoded waveform duration. Deliberately independent of
/// the extracted array's frame count; downstream thresholds are tuned against
/// this value.
pub fn n_frames_for_duration_ms(duration_ms: u64) -> i64 {
    1 + (duration_ms as i64 - 25).div_euclid(10)
}

/// One utterance after the archive-index join, before task selection.
#[derive(Debug, Clone)]
pub struct UtteranceRow {
    pub id: String,
    pub audio: String,
    pub n_frames: i64,
    pub speaker: String,
    pub source_text: String,
    pub target_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub id: String,
    pub audio: String,
    pub n_frames: i64,
    pub tgt_text: String,
    pub speaker: String,
}

/// Selects the target-text column for a task: transcription keeps the source
/// transcript, translation keeps the target-language transcript.
pub fn manifest_rows(rows: &[UtteranceRow], task: Task) -> Vec<ManifestRow> {
    rows.iter()
        .map(|row| ManifestRow {
            id: row.id.clone(),
            audio: row.audio.clone(),
            n_frames: row.n_frames,
            tgt_text: match task {
                Task::Asr => row.source_text.clone(),
                Task::St => row.target_text.clone(),
            },
            speaker: row.speaker.clone(),
        })
        .collect()
}

/// Length filter, applied strictly to the training split; every other split
/// passes through untouched. Returns the surviving rows and the drop count.
pub fn apply_length_filter(
    rows: Vec<ManifestRow>,
    is_train_split: bool,
    filter: &FilterConfig,
) -> (Vec<ManifestRow>, usize) {
    if !is_train_split {
        return (rows, 0);
    }
    let total = rows.len();
    let kept: Vec<ManifestRow> = rows
        .into_iter()
        .filter(|row| keep_train_row(row, filter))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

fn keep_train_row(row: &ManifestRow, filter: &FilterConfig) -> bool {
    if row.n_frames < filter.min_n_frames || row.n_frames > filter.max_n_frames {
        return false;
    }
    let tgt_chars = row.tgt_text.chars().count();
    if tgt_chars == 0 {
        return false;
    }
    row.n_frames as f64 / tgt_chars as f64 <= filter.max_frames_per_tgt_char
}

/// Writes one `(split, task)` manifest: tab-delimited, unquoted, columns
/// exactly [`MANIFEST_COLUMNS`].
pub fn write_manifest(path: &Path, rows: &[ManifestRow]) -> Result<(), PrepError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_path(path)
        .map_err(|e| PrepError::manifest("creating manifest", e))?;
    writer
        .write_record(MANIFEST_COLUMNS)
        .map_err(|e| PrepError::manifest("writing manifest header", e))?;
    for row in rows {
        writer
            .write_record([
                row.id.as_str(),
                row.audio.as_str(),
                &row.n_frames.to_string(),
                row.tgt_text.as_str(),
                row.speaker.as_str(),
            ])
            .map_err(|e| PrepError::manifest("writing manifest row", e))?;
    }
    writer
        .flush()
        .map_err(|e| PrepError::io("flushing manifest", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, n_frames: i64, tgt_text: &str) -> ManifestRow {
        ManifestRow {
            id: id.to_string(),
            audio: format!("/tmp/fbank80.zip:0-{n_frames}"),
            n_frames,
            tgt_text: tgt_text.to_string(),
            speaker: "spk.1".to_string(),
        }
    }

    #[test]
    fn one_second_is_98_frames() {
        assert_eq!(n_frames_for_duration_ms(1_000), 98);
    }

    #[test]
    fn frame_formula_floors_sub_window_durations() {
        assert_eq!(n_frames_for_duration_ms(25), 1);
        assert_eq!(n_frames_for_duration_ms(35), 2);
        assert_eq!(n_frames_for_duration_ms(20), 0);
        assert_eq!(n_frames_for_duration_ms(0), -2);
    }

    #[test]
    fn task_selects_the_text_column() {
        let rows = vec![UtteranceRow {
            id: "u0".to_string(),
            audio: "a.zip:0-10".to_string(),
            n_frames: 50,
            speaker: "spk.1".to_string(),
            source_text: "hello".to_string(),
            target_text: "hallo".to_string(),
        }];
        assert_eq!(manifest_rows(&rows, Task::Asr)[0].tgt_text, "hello");
        assert_eq!(manifest_rows(&rows, Task::St)[0].tgt_text, "hallo");
    }

    #[test]
    fn filter_applies_to_train_only() {
        let filter = FilterConfig::default();
        let too_short = row("u0", 2, "text");
        let (kept, dropped) = apply_length_filter(vec![too_short.clone()], true, &filter);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);

        let (kept, dropped) = apply_length_filter(vec![too_short], false, &filter);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn train_filter_band_and_ratio() {
        let filter = FilterConfig {
            min_n_frames: 5,
            max_n_frames: 100,
            max_frames_per_tgt_char: 10.0,
        };
        let cases = [
            (row("ok", 50, "ten chars!"), true),
            (row("short", 4, "ten chars!"), false),
            (row("long", 101, "ten chars!"), false),
            (row("ratio", 100, "abc"), false),
            (row("empty", 50, ""), false),
        ];
        for (candidate, expected) in cases {
            let id = candidate.id.clone();
            let (kept, _) = apply_length_filter(vec![candidate], true, &filter);
            assert_eq!(!kept.is_empty(), expected, "case {id}");
        }
    }

    #[test]
    fn manifest_is_tab_separated_with_fixed_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("train_st.tsv");
        write_manifest(&path, &[row("u0", 98, "hallo welt")]).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id\taudio\tn_frames\ttgt_text\tspeaker"));
        let data = lines.next().expect("data row");
        assert_eq!(
            data,
            "u0\t/tmp/fbank80.zip:0-98\t98\thallo welt\tspk.1"
        );
    }
}
