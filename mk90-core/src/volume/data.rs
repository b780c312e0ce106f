//! The entry container: placement, release and compaction.
//!
//! `VolumeData` owns the ordered slot sequence and exposes exactly the
//! operations the allocator defines; nothing else can mutate the entries.
//! Every operation validates fully before mutating, so a rejected call
//! leaves the sequence untouched.

use crate::error::{VolumeError, VolumeResult};
use crate::radix50::Filename;

use super::entry::DataEntry;

/// Ordered slot sequence, in on-disk directory traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeData {
    entries: Vec<DataEntry>,
    /// Dialect tag stamped on synthesized empty entries.
    extra_word: u16,
}

impl VolumeData {
    pub fn new(entries: Vec<DataEntry>, extra_word: u16) -> Self {
        Self {
            entries,
            extra_word,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataEntry> {
        self.entries.iter()
    }

    /// Free clusters across all empty slots.
    pub fn n_free_clusters(&self) -> u16 {
        self.entries
            .iter()
            .filter(|e| e.is_empty())
            .map(|e| e.n_clusters())
            .sum()
    }

    /// Clusters across all slots, free and occupied.
    pub fn n_total_clusters(&self) -> u16 {
        self.entries.iter().map(|e| e.n_clusters()).sum()
    }

    pub fn has_permanent_entries(&self) -> bool {
        self.entries.iter().any(|e| e.is_permanent())
    }

    pub fn find_index(&self, id: &Filename) -> Option<usize> {
        let words = id.radix50();
        self.entries
            .iter()
            .position(|e| e.header().filename == words)
    }

    fn get(&self, id: &Filename) -> VolumeResult<usize> {
        self.find_index(id)
            .ok_or_else(|| VolumeError::FileNotFound(id.print_ascii()))
    }

    /// Place a new permanent entry into free space.
    ///
    /// The scan runs from the tail toward the head and takes the first
    /// empty slot with enough clusters (free space tends to pool at the
    /// tail after a squeeze). A larger slot is split: the file takes its
    /// place and the remainder becomes a new empty slot right after it.
    pub fn push_file(&mut self, entry: DataEntry) -> VolumeResult<()> {
        let id = Filename::from_radix50(entry.header().filename);
        if self.find_index(&id).is_some() {
            return Err(VolumeError::FileAlreadyExists(id.print_ascii()));
        }

        let needed = entry.n_clusters();
        let idx = self
            .entries
            .iter()
            .rposition(|e| e.is_empty() && e.n_clusters() >= needed)
            .ok_or(VolumeError::InsufficientFreeSpace { needed })?;

        let spare = self.entries[idx].n_clusters() - needed;
        self.entries[idx] = entry;
        if spare > 0 {
            self.entries
                .insert(idx + 1, DataEntry::new_empty(spare, self.extra_word));
        }

        Ok(())
    }

    /// Release a file's slot back to free space, in place.
    pub fn delete_file(&mut self, id: &Filename) -> VolumeResult<()> {
        let idx = self.get(id)?;
        self.entries[idx].clean();
        Ok(())
    }

    pub fn rename_file(&mut self, old_id: &Filename, new_id: &Filename) -> VolumeResult<()> {
        if self.find_index(new_id).is_some() {
            return Err(VolumeError::FileAlreadyExists(new_id.print_ascii()));
        }
        let idx = self.get(old_id)?;
        self.entries[idx].rename(new_id);
        Ok(())
    }

    pub fn payload(&self, id: &Filename) -> VolumeResult<&[u8]> {
        let idx = self.get(id)?;
        Ok(self.entries[idx].data())
    }

    /// Merge all free slots into a single one at the tail. Permanent
    /// entries keep their relative order. Returns the coalesced
    /// free-cluster count.
    pub fn squeeze(&mut self) -> u16 {
        let free = self.n_free_clusters();
        let n_empty = self.entries.iter().filter(|e| e.is_empty()).count();

        // Already compact: no free slots, or a single one at the tail.
        if n_empty == 0 || (n_empty == 1 && self.entries.last().is_some_and(|e| e.is_empty())) {
            return free;
        }

        self.entries.retain(|e| !e.is_empty());
        self.entries
            .push(DataEntry::new_empty(free, self.extra_word));

        free
    }

    /// Append a free slot of `n` clusters at the tail.
    pub fn push_empty_entry(&mut self, n_clusters: u16) {
        self.entries
            .push(DataEntry::new_empty(n_clusters, self.extra_word));
    }

    /// Give up `n` free clusters, taking them from the tailmost empty
    /// slots. The caller has already checked that `n` does not exceed the
    /// free total and that at least one slot survives.
    pub(crate) fn trim(&mut self, mut n: u16) {
        let mut i = self.entries.len();
        while n > 0 && i > 0 {
            i -= 1;
            if !self.entries[i].is_empty() {
                continue;
            }
            let clusters = self.entries[i].n_clusters();
            if clusters <= n {
                self.entries.remove(i);
                n -= clusters;
            } else {
                self.entries[i].shrink(n);
                n = 0;
            }
        }
        debug_assert_eq!(n, 0);
    }
}
