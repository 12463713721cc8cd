use ndarray::Array2;
use realfft::RealFftPlanner;

use crate::error::PrepError;

pub const N_MELS: usize = 80;
pub const FRAME_LENGTH_MS: usize = 25;
pub const FRAME_SHIFT_MS: usize = 10;

const LOG_FLOOR: f32 = 1e-10;

/// Log-mel filterbank features: 80 mel channels over 25 ms Hann windows with
/// a 10 ms hop. Pure function of (samples, rate); identical input yields
/// bit-identical output.
///
/// Windows shorter than a single frame fail with
/// [`PrepError::DegenerateInput`]; the output shape is never adjusted to
/// accommodate them.
pub fn log_mel_fbank(samples: &[f32], sample_rate_hz: u32) -> Result<Array2<f32>, PrepError> {
    if sample_rate_hz == 0 {
        return Err(PrepError::degenerate_input("sample rate is zero"));
    }
    let window_len = sample_rate_hz as usize * FRAME_LENGTH_MS / 1000;
    let hop_len = sample_rate_hz as usize * FRAME_SHIFT_MS / 1000;
    if window_len == 0 || hop_len == 0 {
        return Err(PrepError::degenerate_input(format!(
            "sample rate {sample_rate_hz} Hz is too low for {FRAME_LENGTH_MS}/{FRAME_SHIFT_MS} ms framing"
        )));
    }
    if samples.len() < window_len {
        return Err(PrepError::degenerate_input(format!(
            "waveform of {} samples is shorter than one {window_len}-sample frame",
            samples.len()
        )));
    }

    let n_fft = window_len.next_power_of_two();
    let n_frames = 1 + (samples.len() - window_len) / hop_len;
    let hann = hann_window(window_len);
    let filters = mel_filters(sample_rate_hz as usize, n_fft, N_MELS);

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut windowed = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    let mut features = Array2::<f32>::zeros((n_frames, N_MELS));
    for frame_idx in 0..n_frames {
        let start = frame_idx * hop_len;
        windowed.fill(0.0);
        for (i, &sample) in samples[start..start + window_len].iter().enumerate() {
            windowed[i] = sample * hann[i];
        }
        fft.process(&mut windowed, &mut spectrum)
            .map_err(|e| PrepError::runtime("fbank fft", e))?;

        for (mel_idx, filter) in filters.iter().enumerate() {
            let mut energy = 0.0f32;
            for (bin, c) in spectrum.iter().enumerate() {
                energy += c.norm() * filter[bin];
            }
            features[[frame_idx, mel_idx]] = (energy + LOG_FLOOR).ln();
        }
    }
    Ok(features)
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let x = std::f32::consts::PI * i as f32 / (len - 1) as f32;
            0.5 * (1.0 - (2.0 * x).cos())
        })
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filters over the `n_fft / 2 + 1` magnitude bins, spanning
/// 0 Hz to Nyquist.
fn mel_filters(sample_rate: usize, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(sample_rate as f32 / 2.0);

    let hz_points: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32)
        .map(mel_to_hz)
        .collect();
    let bin_points: Vec<usize> = hz_points
        .iter()
        .map(|&hz| ((n_fft + 1) as f32 * hz / sample_rate as f32).floor() as usize)
        .collect();

    let n_bins = n_fft / 2 + 1;
    let mut filters = vec![vec![0.0f32; n_bins]; n_mels];
    for (mel_idx, filter) in filters.iter_mut().enumerate() {
        let start = bin_points[mel_idx];
        let center = bin_points[mel_idx + 1];
        let end = bin_points[mel_idx + 2];

        for bin in start..center.min(n_bins) {
            if center > start {
                filter[bin] = (bin - start) as f32 / (center - start) as f32;
            }
        }
        for bin in center..end.min(n_bins) {
            if end > center {
                filter[bin] = (end - bin) as f32 / (end - center) as f32;
            }
        }
    }
    filters
}
