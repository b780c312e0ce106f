//! Volume configuration parameters.
//!
//! All constraints are enforced at construction; a `VolumeParams` value is
//! always internally consistent and never re-validated at call sites.

use serde::Serialize;

use crate::error::{VolumeError, VolumeResult};
use crate::{
    CLUSTER_SIZE, ENTRY_BASE_SIZE, EXTRA_WORD_V1, EXTRA_WORD_V2, N_CLUSTERS_MAX, N_SYS_CLUSTERS,
    SEGMENT_FOOTER_SIZE, SEGMENT_HEADER_SIZE,
};

/// Validated volume configuration, plus the quantities derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeParams {
    n_clusters_allocated: u16,
    n_extra_bytes_per_entry: u16,
    n_dir_segs: u16,
    n_clusters_per_dir_seg: u16,
    /// Dialect tag written to the extra word of new entries.
    extra_word: u16,
    n_max_entries_per_dir_seg: u16,
    n_max_entries: u16,
    /// Reserved header word, carried verbatim from parsed images.
    #[serde(skip)]
    i_highest_seg_used: u16,
}

impl VolumeParams {
    pub fn new(
        n_clusters_allocated: u16,
        n_extra_bytes_per_entry: u16,
        n_dir_segs: u16,
        n_clusters_per_dir_seg: u16,
        extra_word: u16,
    ) -> VolumeResult<Self> {
        if n_clusters_allocated > N_CLUSTERS_MAX {
            return Err(VolumeError::InvalidParams(format!(
                "n_clusters_allocated must be <= {}, got {}",
                N_CLUSTERS_MAX, n_clusters_allocated
            )));
        }
        if n_extra_bytes_per_entry != 0 && n_extra_bytes_per_entry != 2 {
            return Err(VolumeError::InvalidParams(format!(
                "n_extra_bytes_per_entry must be 0 or 2, got {}",
                n_extra_bytes_per_entry
            )));
        }
        if !(1..=2).contains(&n_dir_segs) {
            return Err(VolumeError::InvalidParams(format!(
                "n_dir_segs must be 1 or 2, got {}",
                n_dir_segs
            )));
        }
        if !(1..=2).contains(&n_clusters_per_dir_seg) {
            return Err(VolumeError::InvalidParams(format!(
                "n_clusters_per_dir_seg must be 1 or 2, got {}",
                n_clusters_per_dir_seg
            )));
        }
        // A two-segment directory of single-cluster segments is not a
        // layout the target machine produces.
        if n_dir_segs == 2 && n_clusters_per_dir_seg == 1 {
            return Err(VolumeError::InvalidParams(
                "can't combine n_dir_segs = 2 with n_clusters_per_dir_seg = 1".into(),
            ));
        }

        let n_min_clusters = N_SYS_CLUSTERS + n_dir_segs * n_clusters_per_dir_seg + 1;
        if n_clusters_allocated < n_min_clusters {
            return Err(VolumeError::InvalidParams(format!(
                "min. number of clusters for this configuration is {}",
                n_min_clusters
            )));
        }

        let entry_size = ENTRY_BASE_SIZE + n_extra_bytes_per_entry as usize;
        let seg_bytes = n_clusters_per_dir_seg as usize * CLUSTER_SIZE;
        let n_max_entries_per_dir_seg =
            ((seg_bytes - SEGMENT_HEADER_SIZE - SEGMENT_FOOTER_SIZE) / entry_size) as u16;

        Ok(Self {
            n_clusters_allocated,
            n_extra_bytes_per_entry,
            n_dir_segs,
            n_clusters_per_dir_seg,
            extra_word,
            n_max_entries_per_dir_seg,
            n_max_entries: n_dir_segs * n_max_entries_per_dir_seg,
            i_highest_seg_used: 1,
        })
    }

    /// BASIC v1.0 layout: no extra bytes per entry.
    pub fn v1(
        n_clusters_allocated: u16,
        n_dir_segs: u16,
        n_clusters_per_dir_seg: u16,
    ) -> VolumeResult<Self> {
        Self::new(
            n_clusters_allocated,
            0,
            n_dir_segs,
            n_clusters_per_dir_seg,
            EXTRA_WORD_V1,
        )
    }

    /// BASIC v2.0 layout: two extra bytes per entry, tagged 0x00A0.
    pub fn v2(
        n_clusters_allocated: u16,
        n_dir_segs: u16,
        n_clusters_per_dir_seg: u16,
    ) -> VolumeResult<Self> {
        Self::new(
            n_clusters_allocated,
            2,
            n_dir_segs,
            n_clusters_per_dir_seg,
            EXTRA_WORD_V2,
        )
    }

    /// The extra-word dialect tag implied by the extra-bytes setting. The
    /// format has no version field; this is the whole inference.
    pub fn extra_word_for(n_extra_bytes_per_entry: u16) -> u16 {
        if n_extra_bytes_per_entry == 0 {
            EXTRA_WORD_V1
        } else {
            EXTRA_WORD_V2
        }
    }

    pub fn n_clusters_allocated(&self) -> u16 {
        self.n_clusters_allocated
    }

    pub fn n_extra_bytes_per_entry(&self) -> u16 {
        self.n_extra_bytes_per_entry
    }

    pub fn n_dir_segs(&self) -> u16 {
        self.n_dir_segs
    }

    pub fn n_clusters_per_dir_seg(&self) -> u16 {
        self.n_clusters_per_dir_seg
    }

    pub fn extra_word(&self) -> u16 {
        self.extra_word
    }

    pub fn n_max_entries_per_dir_seg(&self) -> u16 {
        self.n_max_entries_per_dir_seg
    }

    pub fn n_max_entries(&self) -> u16 {
        self.n_max_entries
    }

    pub fn i_highest_seg_used(&self) -> u16 {
        self.i_highest_seg_used
    }

    /// Clusters available for file data.
    pub fn n_data_clusters(&self) -> u16 {
        self.n_clusters_allocated - N_SYS_CLUSTERS - self.n_dir_segs * self.n_clusters_per_dir_seg
    }

    pub(crate) fn set_i_highest_seg_used(&mut self, value: u16) {
        self.i_highest_seg_used = value;
    }

    pub(crate) fn add_clusters(&mut self, n: u16) {
        self.n_clusters_allocated += n;
    }

    pub(crate) fn remove_clusters(&mut self, n: u16) {
        self.n_clusters_allocated -= n;
    }
}
