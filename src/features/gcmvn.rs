use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::{Array1, Array2};
use ndarray_npy::NpzWriter;

use crate::error::PrepError;
use crate::types::GcmvnStats;

const VAR_FLOOR: f64 = 1e-8;

/// Bounded-sample estimator for global CMVN statistics.
///
/// Training feature arrays are appended until the configured cap; arrays
/// beyond the cap are extracted for packaging but never folded in. The cap is
/// a memory/representativeness trade-off and is checked strictly before
/// appending.
#[derive(Debug)]
pub struct GcmvnAccumulator {
    max_num: usize,
    features: Vec<Array2<f32>>,
}

impl GcmvnAccumulator {
    pub fn new(max_num: usize) -> Self {
        Self {
            max_num,
            features: Vec::new(),
        }
    }

    /// Number of arrays folded in so far.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Appends a copy of `features` unless the sample is already full.
    /// Returns whether the array was folded in.
    pub fn push(&mut self, features: &Array2<f32>) -> bool {
        if self.features.len() < self.max_num {
            self.features.push(features.clone());
            return true;
        }
        false
    }

    /// Per-channel mean and standard deviation over the concatenation of the
    /// accumulated arrays along the time axis. Idempotent: the sample is not
    /// consumed, so repeated calls yield identical output.
    pub fn finalize(&self) -> Result<GcmvnStats, PrepError> {
        let n_channels = match self.features.first() {
            Some(first) => first.ncols(),
            None => {
                return Err(PrepError::corpus_integrity(
                    "estimating global cmvn statistics",
                    "no training features were sampled",
                ))
            }
        };

        let mut frame_count = 0u64;
        let mut sums = vec![0.0f64; n_channels];
        let mut square_sums = vec![0.0f64; n_channels];
        for features in &self.features {
            frame_count += features.nrows() as u64;
            for row in features.rows() {
                for (channel, &value) in row.iter().enumerate() {
                    let value = f64::from(value);
                    sums[channel] += value;
                    square_sums[channel] += value * value;
                }
            }
        }

        let n = frame_count as f64;
        let mut mean = Array1::<f32>::zeros(n_channels);
        let mut std = Array1::<f32>::zeros(n_channels);
        for channel in 0..n_channels {
            let channel_mean = sums[channel] / n;
            let variance = square_sums[channel] / n - channel_mean * channel_mean;
            mean[channel] = channel_mean as f32;
            std[channel] = variance.max(VAR_FLOOR).sqrt() as f32;
        }
        Ok(GcmvnStats { mean, std })
    }
}

/// Persists the statistics artifact: an npz container with the named vectors
/// `mean` and `std`. Written once per (corpus, language), never updated.
pub fn write_gcmvn_npz(path: &Path, stats: &GcmvnStats) -> Result<(), PrepError> {
    let file = File::create(path).map_err(|e| PrepError::io("creating gcmvn archive", e))?;
    let mut npz = NpzWriter::new(BufWriter::new(file));
    npz.add_array("mean", &stats.mean)
        .map_err(|e| PrepError::runtime("writing gcmvn mean", e))?;
    npz.add_array("std", &stats.std)
        .map_err(|e| PrepError::runtime("writing gcmvn std", e))?;
    npz.finish()
        .map_err(|e| PrepError::runtime("sealing gcmvn archive", e))?;
    Ok(())
}
