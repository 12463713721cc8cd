use crate::error::PrepError;
use crate::pipeline::traits::WaveformSource;
use crate::types::{Segment, Utterance};

/// Segments of one split in deterministic traversal order.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    segments: Vec<Segment>,
}

impl SplitDataset {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Lazy traversal over decoded utterances. Restartable: every call starts
    /// a fresh pass recomputed from the immutable segment list, with no cursor
    /// shared between iterators.
    pub fn utterances<'a>(&'a self, source: &'a dyn WaveformSource) -> UtteranceIter<'a> {
        UtteranceIter {
            segments: &self.segments,
            source,
            next: 0,
        }
    }
}

pub struct UtteranceIter<'a> {
    segments: &'a [Segment],
    source: &'a dyn WaveformSource,
    next: usize,
}

impl UtteranceIter<'_> {
    fn materialize(&self, segment: &Segment) -> Result<Utterance, PrepError> {
        let waveform = self.source.read_window(
            &segment.recording_path,
            segment.offset_samples,
            segment.duration_samples,
        )?;
        Ok(Utterance {
            waveform,
            sample_rate_hz: segment.sample_rate_hz,
            source_text: segment.source_text.clone(),
            target_text: segment.target_text.clone(),
            speaker_id: segment.speaker_id.clone(),
            utterance_id: segment.utterance_id.clone(),
        })
    }
}

impl Iterator for UtteranceIter<'_> {
    type Item = Result<Utterance, PrepError>;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.segments.get(self.next)?;
        self.next += 1;
        Some(self.materialize(segment))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.segments.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for UtteranceIter<'_> {}
