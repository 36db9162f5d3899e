//! Dataset-file DTOs (§6). The compressed dataset writer/reader is an
//! external collaborator; this module models only the on-disk header
//! contract it shares with the data file, so a caller can parse or emit
//! one without pulling in the writer itself.

use serde::{Deserialize, Serialize};

/// A single `{start, end, src_size}` byte range into the data file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatasetRange {
    /// Byte offset of the first LZ4 frame for this piece.
    pub start: u64,
    /// Byte offset one past the last LZ4 frame for this piece.
    pub end: u64,
    /// Size in bytes of the piece once decompressed.
    pub src_size: u64,
}

/// The `.header` file's index: three disjoint range lists over the same
/// data file, one per split. The writer flushes this every 1000 appends
/// and once more on close.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatasetHeader {
    /// Ranges for pieces assigned to the training split.
    #[serde(default)]
    pub train: Vec<DatasetRange>,
    /// Ranges for pieces assigned to the validation split.
    #[serde(default)]
    pub valid: Vec<DatasetRange>,
    /// Ranges for pieces assigned to the test split.
    #[serde(default)]
    pub test: Vec<DatasetRange>,
}

impl DatasetHeader {
    /// Total number of pieces indexed across all three splits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    /// Whether every split is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.valid.is_empty() && self.test.is_empty()
    }
}
