//! Virtual data entries.
//!
//! One `DataEntry` per directory slot: the slot header plus the payload
//! clusters it owns. Entries live exclusively inside a
//! [`super::data::VolumeData`] and are mutated in place.

use crate::radix50::Filename;
use crate::{DEF_CH_JOB, DEF_DATE, PAD_BYTE, STATUS_EMPTY, STATUS_PERMANENT};

/// Header of a virtual entry (one directory slot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntryHeader {
    pub status: u16,
    pub filename: [u16; 3],
    pub n_clusters: u16,
    pub ch_job: u16,
    pub date: u16,
    pub extra_word: u16,
}

impl DataEntryHeader {
    pub fn is_empty(&self) -> bool {
        self.status == STATUS_EMPTY
    }

    pub fn is_permanent(&self) -> bool {
        self.status == STATUS_PERMANENT
    }

    /// Printable filename for listings and error messages.
    pub fn print_ascii_filename(&self) -> String {
        Filename::from_radix50(self.filename).print_ascii()
    }
}

/// A directory slot plus its payload.
///
/// Invariant: `data.len() == n_clusters * CLUSTER_SIZE` at all times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub(crate) header: DataEntryHeader,
    pub(crate) data: Vec<u8>,
}

impl DataEntry {
    pub fn new(header: DataEntryHeader, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            header.n_clusters as usize * crate::CLUSTER_SIZE
        );
        Self { header, data }
    }

    /// A permanent file entry; the payload must already be cluster-padded.
    pub fn new_file(filename: &Filename, data: Vec<u8>, extra_word: u16) -> Self {
        let n_clusters = (data.len() / crate::CLUSTER_SIZE) as u16;
        Self {
            header: DataEntryHeader {
                status: STATUS_PERMANENT,
                filename: filename.radix50(),
                n_clusters,
                ch_job: DEF_CH_JOB,
                date: DEF_DATE,
                extra_word,
            },
            data,
        }
    }

    /// An empty (free space) entry of `n_clusters` clusters.
    pub fn new_empty(n_clusters: u16, extra_word: u16) -> Self {
        Self {
            header: DataEntryHeader {
                status: STATUS_EMPTY,
                filename: Filename::pad_triple(),
                n_clusters,
                ch_job: DEF_CH_JOB,
                date: DEF_DATE,
                extra_word,
            },
            data: vec![PAD_BYTE; n_clusters as usize * crate::CLUSTER_SIZE],
        }
    }

    pub fn header(&self) -> &DataEntryHeader {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn n_clusters(&self) -> u16 {
        self.header.n_clusters
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    pub fn is_permanent(&self) -> bool {
        self.header.is_permanent()
    }

    /// Turn the slot back into free space: clear the name, pad the payload,
    /// keep the cluster count and position.
    pub fn clean(&mut self) {
        self.header.status = STATUS_EMPTY;
        self.header.filename = Filename::pad_triple();
        self.data.fill(PAD_BYTE);
    }

    pub fn rename(&mut self, new_name: &Filename) {
        self.header.filename = new_name.radix50();
    }

    /// Shrink an empty entry by `n` clusters.
    pub(crate) fn shrink(&mut self, n: u16) {
        debug_assert!(self.is_empty() && n < self.header.n_clusters);
        self.header.n_clusters -= n;
        self.data
            .truncate(self.header.n_clusters as usize * crate::CLUSTER_SIZE);
    }
}
