//! The editable in-memory volume.
//!
//! A `Volume` is either parsed from a raw image or created fresh from
//! validated parameters. All edits are synchronous transformations of the
//! owned entry sequence; each one either fully applies or is rejected
//! before any mutation.

mod convert;
mod data;
mod entry;
mod params;

pub use data::VolumeData;
pub use entry::{DataEntry, DataEntryHeader};
pub use params::VolumeParams;

use serde::Serialize;

use crate::error::{VolumeError, VolumeResult};
use crate::image::RawVolume;
use crate::radix50::Filename;
use crate::text::{self, FileRecord, TextFile};
use crate::{CLUSTER_SIZE, N_CLUSTERS_MAX};

/// An MK-90 volume, decoupled from the on-disk segment framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub(crate) bootloader: Vec<u8>,
    pub(crate) home_block: Vec<u8>,
    pub(crate) params: VolumeParams,
    pub(crate) data: VolumeData,
}

/// One directory slot in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub status: String,
    pub filename: String,
    pub n_clusters: u16,
}

/// Structured listing of a volume's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshot {
    pub params: VolumeParams,
    pub entries: Vec<EntrySnapshot>,
    pub n_free_clusters: u16,
    pub n_max_entries: u16,
}

impl Volume {
    /// Parse a raw image into an editable volume.
    pub fn read(bytes: &[u8]) -> VolumeResult<Self> {
        convert::from_raw(RawVolume::parse(bytes)?)
    }

    /// A fresh volume: zero-filled system blocks and a single empty entry
    /// spanning every data cluster.
    pub fn create(params: VolumeParams) -> Self {
        Self::fresh(params, vec![0; CLUSTER_SIZE], vec![0; CLUSTER_SIZE])
    }

    /// A fresh volume with caller-supplied bootloader and home block
    /// (padded with zeroes up to one cluster each).
    pub fn create_with_blocks(
        params: VolumeParams,
        mut bootloader: Vec<u8>,
        mut home_block: Vec<u8>,
    ) -> VolumeResult<Self> {
        for (name, block) in [("bootloader", &bootloader), ("home block", &home_block)] {
            if block.len() > CLUSTER_SIZE {
                return Err(VolumeError::InvalidParams(format!(
                    "{} larger than one cluster ({} bytes)",
                    name,
                    block.len()
                )));
            }
        }
        bootloader.resize(CLUSTER_SIZE, 0);
        home_block.resize(CLUSTER_SIZE, 0);

        Ok(Self::fresh(params, bootloader, home_block))
    }

    fn fresh(params: VolumeParams, bootloader: Vec<u8>, home_block: Vec<u8>) -> Self {
        let mut data = VolumeData::new(Vec::new(), params.extra_word());
        data.push_empty_entry(params.n_data_clusters());

        Self {
            bootloader,
            home_block,
            params,
            data,
        }
    }

    pub fn params(&self) -> &VolumeParams {
        &self.params
    }

    /// Serialize to a raw image, byte-exact inverse of [`Volume::read`].
    pub fn to_bytes(&self) -> Vec<u8> {
        convert::to_raw(self).to_bytes()
    }

    /// Store host text lines as a new file (KOI-7, CR/LF framed).
    pub fn push_text(&mut self, filename: &str, lines: &[String]) -> VolumeResult<()> {
        self.push_payload(filename, text::encode_lines(lines))
    }

    /// Store an arbitrary payload as a new file, padded to whole clusters.
    pub fn push_raw(&mut self, filename: &str, bytes: Vec<u8>) -> VolumeResult<()> {
        self.push_payload(filename, text::pad_to_cluster(bytes))
    }

    fn push_payload(&mut self, filename: &str, payload: Vec<u8>) -> VolumeResult<()> {
        let id = Filename::from_ascii(filename);
        if self.data.find_index(&id).is_some() {
            return Err(VolumeError::FileAlreadyExists(id.print_ascii()));
        }
        if self.data.len() as u16 >= self.params.n_max_entries() {
            return Err(VolumeError::DirectoryFull);
        }

        self.data
            .push_file(DataEntry::new_file(&id, payload, self.params.extra_word()))
    }

    /// A file's payload, as stored.
    pub fn extract_raw(&self, filename: &str) -> VolumeResult<Vec<u8>> {
        Ok(self
            .data
            .payload(&Filename::from_ascii(filename))?
            .to_vec())
    }

    /// A file's payload decoded as text lines.
    pub fn extract_text(&self, filename: &str) -> VolumeResult<Vec<String>> {
        Ok(text::decode_payload(
            self.data.payload(&Filename::from_ascii(filename))?,
        ))
    }

    /// Every file's raw payload, in directory order.
    pub fn extract_raw_all(&self) -> Vec<FileRecord> {
        self.data
            .iter()
            .filter(|e| e.is_permanent())
            .map(|e| FileRecord {
                filename: e.header().print_ascii_filename(),
                data: e.data().to_vec(),
            })
            .collect()
    }

    /// Every file decoded as text, in directory order.
    pub fn extract_text_all(&self) -> Vec<TextFile> {
        self.data
            .iter()
            .filter(|e| e.is_permanent())
            .map(|e| TextFile {
                filename: e.header().print_ascii_filename(),
                lines: text::decode_payload(e.data()),
            })
            .collect()
    }

    pub fn rename(&mut self, old: &str, new: &str) -> VolumeResult<()> {
        self.data
            .rename_file(&Filename::from_ascii(old), &Filename::from_ascii(new))
    }

    pub fn delete(&mut self, filename: &str) -> VolumeResult<()> {
        self.data.delete_file(&Filename::from_ascii(filename))
    }

    /// Consolidate all free space into one tail slot. Returns the
    /// coalesced free-cluster count.
    pub fn squeeze(&mut self) -> u16 {
        self.data.squeeze()
    }

    /// Allocate `n` more clusters as a new free slot at the tail.
    pub fn grow(&mut self, n: u16) -> VolumeResult<()> {
        if n == 0 {
            return Ok(());
        }
        if self.data.len() as u16 >= self.params.n_max_entries() {
            return Err(VolumeError::DirectoryFull);
        }
        if self.params.n_clusters_allocated() + n > N_CLUSTERS_MAX {
            return Err(VolumeError::CapacityExceeded);
        }

        self.data.push_empty_entry(n);
        self.params.add_clusters(n);
        Ok(())
    }

    /// Give up `n` free clusters, shrinking the volume.
    pub fn trim(&mut self, n: u16) -> VolumeResult<()> {
        if n == 0 {
            return Ok(());
        }
        let free = self.data.n_free_clusters();
        if n > free {
            return Err(VolumeError::InvalidTrim(format!(
                "can't trim more than {} free cluster(s)",
                free
            )));
        }
        if !self.data.has_permanent_entries() && n == self.data.n_total_clusters() {
            return Err(VolumeError::InvalidTrim(
                "trimming would leave the directory without entries".into(),
            ));
        }

        self.data.trim(n);
        self.params.remove_clusters(n);
        Ok(())
    }

    /// Structured listing: per-slot status/name/size plus the derived
    /// free-space and capacity figures.
    pub fn snapshot(&self) -> VolumeSnapshot {
        VolumeSnapshot {
            params: self.params.clone(),
            entries: self
                .data
                .iter()
                .map(|e| EntrySnapshot {
                    status: match e.header().status {
                        crate::STATUS_EMPTY => "empty".to_string(),
                        crate::STATUS_PERMANENT => "file".to_string(),
                        other => format!("unknown (0x{:04X})", other),
                    },
                    filename: e.header().print_ascii_filename(),
                    n_clusters: e.n_clusters(),
                })
                .collect(),
            n_free_clusters: self.data.n_free_clusters(),
            n_max_entries: self.params.n_max_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Volume {
        Volume::create(VolumeParams::v1(20, 1, 2).unwrap())
    }

    #[test]
    fn test_fresh_volume_has_one_empty_entry() {
        let vol = fresh();
        let snap = vol.snapshot();

        assert_eq!(snap.entries.len(), 1);
        assert_eq!(snap.entries[0].status, "empty");
        assert_eq!(snap.entries[0].n_clusters, 16);
        assert_eq!(snap.n_free_clusters, 16);
    }

    #[test]
    fn test_push_then_delete_restores_free_total() {
        let mut vol = fresh();
        let before = vol.snapshot().n_free_clusters;

        vol.push_text("PROG.BAS", &["10 END".to_string()]).unwrap();
        assert_eq!(vol.snapshot().n_free_clusters, before - 1);

        vol.delete("PROG.BAS").unwrap();
        assert_eq!(vol.snapshot().n_free_clusters, before);
    }

    #[test]
    fn test_push_rejects_oversized_file() {
        let mut vol = fresh();
        let err = vol.push_raw("BIG.DAT", vec![0; 17 * CLUSTER_SIZE]);
        assert!(matches!(
            err,
            Err(VolumeError::InsufficientFreeSpace { needed: 17 })
        ));
    }

    #[test]
    fn test_text_roundtrip_through_payload() {
        let mut vol = fresh();
        let lines = vec!["10 PRINT \"ПРИВЕТ\"".to_string(), "20 GOTO 10".to_string()];
        vol.push_text("HELLO.BAS", &lines).unwrap();

        assert_eq!(vol.extract_text("HELLO.BAS").unwrap(), lines);
        assert_eq!(vol.extract_raw("HELLO.BAS").unwrap().len(), CLUSTER_SIZE);
    }

    #[test]
    fn test_extract_all() {
        let mut vol = fresh();
        vol.push_text("A.BAS", &["10 END".to_string()]).unwrap();
        vol.push_text("B.BAS", &["20 END".to_string()]).unwrap();

        let all = vol.extract_text_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].filename, "A.BAS");
        assert_eq!(all[1].lines, vec!["20 END".to_string()]);
    }

    #[test]
    fn test_rename_errors() {
        let mut vol = fresh();
        vol.push_text("A.BAS", &[]).unwrap();
        vol.push_text("B.BAS", &[]).unwrap();

        assert!(matches!(
            vol.rename("MISSING.BAS", "C.BAS"),
            Err(VolumeError::FileNotFound(_))
        ));
        assert!(matches!(
            vol.rename("A.BAS", "B.BAS"),
            Err(VolumeError::FileAlreadyExists(_))
        ));

        vol.rename("A.BAS", "C.BAS").unwrap();
        assert!(vol.extract_raw("C.BAS").is_ok());
    }

    #[test]
    fn test_grow_then_trim_restores_size() {
        let mut vol = fresh();
        let allocated = vol.params().n_clusters_allocated();
        let free = vol.snapshot().n_free_clusters;

        vol.grow(5).unwrap();
        assert_eq!(vol.params().n_clusters_allocated(), allocated + 5);
        assert_eq!(vol.snapshot().n_free_clusters, free + 5);

        vol.trim(5).unwrap();
        assert_eq!(vol.params().n_clusters_allocated(), allocated);
        assert_eq!(vol.snapshot().n_free_clusters, free);
    }

    #[test]
    fn test_grow_past_ceiling_fails() {
        let mut vol = Volume::create(VolumeParams::v1(N_CLUSTERS_MAX, 1, 2).unwrap());
        assert!(matches!(vol.grow(1), Err(VolumeError::CapacityExceeded)));
    }

    #[test]
    fn test_trim_limits() {
        let mut vol = fresh();
        assert!(matches!(
            vol.trim(17),
            Err(VolumeError::InvalidTrim(_))
        ));
        // Trimming every cluster of an all-empty volume would leave an
        // entryless directory.
        assert!(matches!(
            vol.trim(16),
            Err(VolumeError::InvalidTrim(_))
        ));
        vol.trim(15).unwrap();
        assert_eq!(vol.snapshot().n_free_clusters, 1);
    }

    #[test]
    fn test_directory_full() {
        // One single-cluster segment: (512 - 12) / 14 = 35 slots.
        let mut vol = Volume::create(VolumeParams::v1(39, 1, 1).unwrap());
        assert_eq!(vol.params().n_max_entries(), 35);

        // 34 pushes leave 34 files + 1 shrinking free slot = 35 entries.
        for i in 0..34 {
            vol.push_raw(&format!("F{}.DAT", i), vec![i as u8]).unwrap();
        }
        assert_eq!(vol.snapshot().entries.len(), 35);
        assert!(matches!(
            vol.push_raw("LAST.DAT", vec![0]),
            Err(VolumeError::DirectoryFull)
        ));
    }

    #[test]
    fn test_squeeze_after_deletes() {
        let mut vol = fresh();
        for name in ["A.BAS", "B.BAS", "C.BAS"] {
            vol.push_text(name, &["10 END".to_string()]).unwrap();
        }
        vol.delete("A.BAS").unwrap();
        vol.delete("C.BAS").unwrap();

        // Two freed slots plus the original tail slot.
        assert_eq!(vol.snapshot().entries.len(), 4);
        assert_eq!(vol.squeeze(), 15);

        let snap = vol.snapshot();
        assert_eq!(snap.entries.len(), 2);
        assert_eq!(snap.entries[0].filename, "B.BAS");
        assert_eq!(snap.entries[1].status, "empty");
        assert_eq!(snap.entries[1].n_clusters, 15);
    }

    #[test]
    fn test_snapshot_serializes() {
        let vol = fresh();
        let json = serde_json::to_string(&vol.snapshot()).unwrap();
        assert!(json.contains("\"nFreeClusters\":16"));
    }
}
