//! Spill records: one JSON object per line.
//!
//! Blank lines and lines starting with `#` are skipped. Parse and read
//! errors carry the 1-based line number.
//!
//! [`SpillReader`] streams a sample in delivery order and sets
//! `first_in_subrun` as it goes, so every spill it yields is ready for
//! exposure accounting.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use serde::Serialize;
use spine_kernel::Spill;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("{path}: cannot open: {message}")]
    Open { path: String, message: String },

    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),
}

/// Marks the first spill of every `(run, subrun)` seen in a sample.
///
/// Subrun-scoped exposure is reported on exactly one spill, so the marker
/// must see the sample once, in delivery order. It is never reset between
/// files of the same sample.
#[derive(Debug, Default)]
pub struct SubrunMarker {
    seen: BTreeSet<(i64, i64)>,
}

impl SubrunMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `first_in_subrun` on `spill` and returns it.
    pub fn mark(&mut self, spill: &mut Spill) -> bool {
        let key = (spill.header.run, spill.header.subrun);
        spill.header.first_in_subrun = self.seen.insert(key);
        spill.header.first_in_subrun
    }

    pub fn subruns(&self) -> usize {
        self.seen.len()
    }
}

/// Streams marked spills out of a JSONL source.
pub struct SpillReader<R> {
    lines: Lines<R>,
    line_no: usize,
    marker: SubrunMarker,
}

impl<R: BufRead> SpillReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            marker: SubrunMarker::new(),
        }
    }

    /// Distinct `(run, subrun)` pairs yielded so far.
    pub fn subruns(&self) -> usize {
        self.marker.subruns()
    }
}

impl SpillReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RecordError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for SpillReader<R> {
    type Item = Result<Spill, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(RecordError::Io(self.line_no, e.to_string()))),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let parsed = serde_json::from_str::<Spill>(trimmed)
                .map_err(|e| RecordError::Parse(self.line_no, e.to_string()));
            return Some(parsed.map(|mut spill| {
                self.marker.mark(&mut spill);
                spill
            }));
        }
    }
}

/// Shape of a record file, for inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub spills: usize,
    pub simulated_spills: usize,
    pub reco_interactions: usize,
    pub true_interactions: usize,
    pub reco_particles: usize,
    pub true_particles: usize,
    pub subruns: usize,
}

/// Drains `reader`, counting what it yields.
pub fn summarize<R: BufRead>(mut reader: SpillReader<R>) -> Result<RecordSummary, RecordError> {
    let mut summary = RecordSummary::default();
    for spill in reader.by_ref() {
        let spill = spill?;
        summary.spills += 1;
        summary.simulated_spills += usize::from(spill.header.ismc);
        summary.reco_interactions += spill.reco.len();
        summary.true_interactions += spill.truth.len();
        summary.reco_particles += spill.reco.iter().map(|i| i.particles.len()).sum::<usize>();
        summary.true_particles += spill.truth.iter().map(|i| i.particles.len()).sum::<usize>();
    }
    summary.subruns = reader.subruns();
    Ok(summary)
}
