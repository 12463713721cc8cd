use std::path::{Path, PathBuf};
use std::process::Command;

use hound::{SampleFormat, WavReader};
use ndarray::Array2;

use crate::error::PrepError;
use crate::features::fbank;
use crate::pipeline::traits::{FeatureExtractor, RecordingInfo, SubwordTrainer, WaveformSource};
use crate::types::VocabType;
use crate::vocab::{SPM_BOS_ID, SPM_EOS_ID, SPM_PAD_ID, SPM_UNK_ID};

/// WAV-backed waveform source with sample-accurate window reads. Multi-channel
/// recordings are downmixed to mono by channel averaging.
pub struct HoundWaveformSource;

impl WaveformSource for HoundWaveformSource {
    fn info(&self, path: &Path) -> Result<RecordingInfo, PrepError> {
        let reader = WavReader::open(path).map_err(|e| PrepError::audio_read(path, e))?;
        Ok(RecordingInfo {
            sample_rate_hz: reader.spec().sample_rate,
            total_samples: u64::from(reader.duration()),
        })
    }

    fn read_window(
        &self,
        path: &Path,
        offset_samples: u64,
        duration_samples: u64,
    ) -> Result<Vec<f32>, PrepError> {
        let mut reader = WavReader::open(path).map_err(|e| PrepError::audio_read(path, e))?;
        let spec = reader.spec();
        let total_samples = u64::from(reader.duration());
        if offset_samples + duration_samples > total_samples {
            return Err(PrepError::audio_read(
                path,
                format!(
                    "window {}..{} exceeds recording length {total_samples}",
                    offset_samples,
                    offset_samples + duration_samples
                ),
            ));
        }
        let offset = u32::try_from(offset_samples)
            .map_err(|_| PrepError::audio_read(path, "window offset beyond seekable range"))?;
        reader
            .seek(offset)
            .map_err(|e| PrepError::audio_read(path, e))?;

        let channels = usize::from(spec.channels.max(1));
        let want = duration_samples as usize * channels;
        let mut interleaved = Vec::with_capacity(want);
        match spec.sample_format {
            SampleFormat::Int => {
                let scale = if spec.bits_per_sample > 1 {
                    ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32
                } else {
                    1.0
                };
                for sample in reader.samples::<i32>().take(want) {
                    let sample = sample.map_err(|e| PrepError::audio_read(path, e))?;
                    interleaved.push(sample as f32 / scale);
                }
            }
            SampleFormat::Float => {
                for sample in reader.samples::<f32>().take(want) {
                    let sample = sample.map_err(|e| PrepError::audio_read(path, e))?;
                    interleaved.push(sample);
                }
            }
        }
        if interleaved.len() != want {
            return Err(PrepError::audio_read(
                path,
                "recording ended before the requested window",
            ));
        }

        if channels == 1 {
            return Ok(interleaved);
        }
        Ok(interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect())
    }
}

/// Default extractor: the fixed 80-channel log-mel filterbank.
pub struct LogMelExtractor;

impl FeatureExtractor for LogMelExtractor {
    fn extract(&self, samples: &[f32], sample_rate_hz: u32) -> Result<Array2<f32>, PrepError> {
        fbank::log_mel_fbank(samples, sample_rate_hz)
    }

    fn feature_dim(&self) -> usize {
        fbank::N_MELS
    }
}

/// Default subword trainer: shells out to the `spm_train` command-line tool.
pub struct SpmCliTrainer {
    spm_train_bin: PathBuf,
}

impl SpmCliTrainer {
    pub fn new(spm_train_bin: impl Into<PathBuf>) -> Self {
        Self {
            spm_train_bin: spm_train_bin.into(),
        }
    }
}

impl Default for SpmCliTrainer {
    fn default() -> Self {
        Self::new("spm_train")
    }
}

impl SubwordTrainer for SpmCliTrainer {
    fn train(
        &self,
        sentences: &[String],
        model_prefix: &Path,
        vocab_type: VocabType,
        vocab_size: usize,
    ) -> Result<(), PrepError> {
        let input_path = model_prefix.with_extension("txt");
        let mut body = String::new();
        for sentence in sentences {
            body.push_str(sentence);
            body.push('\n');
        }
        std::fs::write(&input_path, body)
            .map_err(|e| PrepError::io("writing subword trainer input", e))?;

        let mut command = Command::new(&self.spm_train_bin);
        command
            .arg(format!("--input={}", input_path.display()))
            .arg(format!("--model_prefix={}", model_prefix.display()))
            .arg(format!("--model_type={}", vocab_type.as_str()))
            .arg("--character_coverage=1.0")
            .arg(format!("--bos_id={SPM_BOS_ID}"))
            .arg(format!("--pad_id={SPM_PAD_ID}"))
            .arg(format!("--eos_id={SPM_EOS_ID}"))
            .arg(format!("--unk_id={SPM_UNK_ID}"));
        if vocab_type != VocabType::Char {
            command.arg(format!("--vocab_size={vocab_size}"));
        }

        let status = command
            .status()
            .map_err(|e| PrepError::vocab_trainer("invoking spm_train", e));
        let _ = std::fs::remove_file(&input_path);
        let status = status?;
        if !status.success() {
            return Err(PrepError::vocab_trainer(
                "training subword model",
                format!("spm_train exited with {status}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hound::{WavSpec, WavWriter};

    use super::*;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).expect("create wav");
        for &sample in samples {
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn info_reports_rate_and_per_channel_length() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0; 320]);
        let info = HoundWaveformSource.info(&path).expect("info");
        assert_eq!(info.sample_rate_hz, 16_000);
        assert_eq!(info.total_samples, 320);
    }

    #[test]
    fn window_read_is_sample_accurate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ramp.wav");
        let samples: Vec<i16> = (0..100).collect();
        write_wav(&path, 1, &samples);

        let window = HoundWaveformSource
            .read_window(&path, 10, 3)
            .expect("window");
        let scale = f32::from(i16::MAX);
        assert_eq!(window.len(), 3);
        for (i, &value) in window.iter().enumerate() {
            let expected = (10 + i) as f32 / scale;
            assert!((value - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn stereo_windows_are_downmixed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stereo.wav");
        // Interleaved frames: (0, 100), (10, 110), (20, 120), (30, 130)
        write_wav(&path, 2, &[0, 100, 10, 110, 20, 120, 30, 130]);

        let window = HoundWaveformSource
            .read_window(&path, 1, 2)
            .expect("window");
        let scale = f32::from(i16::MAX);
        assert_eq!(window.len(), 2);
        assert!((window[0] - 60.0 / scale).abs() < 1e-6);
        assert!((window[1] - 70.0 / scale).abs() < 1e-6);
    }

    #[test]
    fn out_of_bounds_window_is_audio_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("short.wav");
        write_wav(&path, 1, &[0; 10]);
        let err = HoundWaveformSource
            .read_window(&path, 5, 10)
            .unwrap_err();
        assert!(matches!(err, PrepError::AudioRead { .. }));
    }

    #[test]
    fn missing_recording_is_audio_read_error() {
        let err = HoundWaveformSource
            .read_window(Path::new("/nonexistent/rec.wav"), 0, 10)
            .unwrap_err();
        assert!(matches!(err, PrepError::AudioRead { .. }));
    }

    #[test]
    fn missing_trainer_binary_is_vocab_trainer_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let trainer = SpmCliTrainer::new("/nonexistent/spm_train");
        let err = trainer
            .train(
                &["hello world".to_string()],
                &dir.path().join("spm_unigram8000_st"),
                VocabType::Unigram,
                8_000,
            )
            .unwrap_err();
        assert!(matches!(err, PrepError::VocabTrainer { .. }));
    }
}
