use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::WriteNpyExt;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PrepError;

/// Append-only writer for the per-corpus feature archive.
///
/// Members are named `<utterance_id>.npy` and stored uncompressed so the byte
/// range recorded by the indexer reproduces the serialized array exactly.
/// Append order is the caller's production order; the archive is sealed once
/// and never reopened for writing.
pub struct FeatureArchiveWriter {
    path: PathBuf,
    zip: ZipWriter<BufWriter<File>>,
    packed_ids: Vec<String>,
}

impl FeatureArchiveWriter {
    pub fn create(path: &Path) -> Result<Self, PrepError> {
        let file = File::create(path).map_err(|e| PrepError::io("creating feature archive", e))?;
        Ok(Self {
            path: path.to_path_buf(),
            zip: ZipWriter::new(BufWriter::new(file)),
            packed_ids: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, utterance_id: &str, features: &Array2<f32>) -> Result<(), PrepError> {
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip
            .start_file(format!("{utterance_id}.npy"), options)
            .map_err(|e| PrepError::runtime("starting archive member", e))?;
        features
            .write_npy(&mut self.zip)
            .map_err(|e| PrepError::runtime("writing archive member", e))?;
        self.packed_ids.push(utterance_id.to_string());
        Ok(())
    }

    /// Finishes the container and returns the packed ids in append order.
    pub fn seal(mut self) -> Result<Vec<String>, PrepError> {
        self.zip
            .finish()
            .map_err(|e| PrepError::runtime("sealing feature archive", e))?;
        Ok(self.packed_ids)
    }
}
