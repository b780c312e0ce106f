//! Directory segment wire codec.
//!
//! A segment is a fixed-size block: 10-byte header, directory entries, one
//! 2-byte footer word, then space padding up to the segment boundary. The
//! optional per-entry extra word is not length-prefixed; its presence is
//! governed by the segment header's `n_extra_bytes_per_entry`, which is
//! threaded into entry parsing explicitly.

use super::Reader;
use crate::error::VolumeResult;
use crate::{
    CLUSTER_SIZE, EXTRA_WORD_V1, PAD_BYTE, STATUS_FOOTER,
};

/// Directory segment header, five little-endian words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Total number of segments in the directory.
    pub n_dir_segs: u16,
    /// 1-based index of the next segment; 0 marks the last one.
    pub i_next_seg: u16,
    /// Index of the highest segment in use. Reserved; carried verbatim.
    pub i_highest_seg_used: u16,
    /// Extra bytes appended to every entry of this segment (0 or 2).
    pub n_extra_bytes_per_entry: u16,
    /// Cluster number where the data of this segment's entries begins.
    pub data_offset: u16,
}

impl SegmentHeader {
    pub fn read(r: &mut Reader) -> VolumeResult<Self> {
        Ok(Self {
            n_dir_segs: r.u16()?,
            i_next_seg: r.u16()?,
            i_highest_seg_used: r.u16()?,
            n_extra_bytes_per_entry: r.u16()?,
            data_offset: r.u16()?,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        for word in [
            self.n_dir_segs,
            self.i_next_seg,
            self.i_highest_seg_used,
            self.n_extra_bytes_per_entry,
            self.data_offset,
        ] {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
}

/// A non-footer directory entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub status: u16,
    pub filename: [u16; 3],
    pub n_clusters: u16,
    pub ch_job: u16,
    pub date: u16,
    /// Present on disk only when the segment carries extra bytes per entry.
    pub extra_word: u16,
}

impl RawEntry {
    /// Read one entry. Returns `None` when the status word is the segment
    /// footer, which has no further fields.
    pub fn read(r: &mut Reader, has_extra_word: bool) -> VolumeResult<Option<Self>> {
        let status = r.u16()?;
        if status == STATUS_FOOTER {
            return Ok(None);
        }

        Ok(Some(Self {
            status,
            filename: [r.u16()?, r.u16()?, r.u16()?],
            n_clusters: r.u16()?,
            ch_job: r.u16()?,
            date: r.u16()?,
            extra_word: if has_extra_word { r.u16()? } else { EXTRA_WORD_V1 },
        }))
    }

    pub fn write(&self, out: &mut Vec<u8>, has_extra_word: bool) {
        out.extend_from_slice(&self.status.to_le_bytes());
        for word in self.filename {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&self.n_clusters.to_le_bytes());
        out.extend_from_slice(&self.ch_job.to_le_bytes());
        out.extend_from_slice(&self.date.to_le_bytes());
        if has_extra_word {
            out.extend_from_slice(&self.extra_word.to_le_bytes());
        }
    }
}

/// One directory segment: header plus its non-footer entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub header: SegmentHeader,
    pub entries: Vec<RawEntry>,
}

impl Segment {
    /// Parse a whole segment of `n_clusters * CLUSTER_SIZE` bytes,
    /// consuming the trailing padding.
    pub fn read(r: &mut Reader, n_clusters: u16) -> VolumeResult<Self> {
        let start = r.pos();
        let header = SegmentHeader::read(r)?;
        let has_extra_word = header.n_extra_bytes_per_entry > 0;

        let mut entries = Vec::new();
        while let Some(entry) = RawEntry::read(r, has_extra_word)? {
            entries.push(entry);
        }

        let seg_bytes = n_clusters as usize * CLUSTER_SIZE;
        let consumed = r.pos() - start;
        r.skip(seg_bytes.checked_sub(consumed).ok_or_else(|| {
            crate::VolumeError::MalformedImage(format!(
                "directory segment overruns its {} byte boundary",
                seg_bytes
            ))
        })?)?;

        Ok(Self { header, entries })
    }

    /// Serialize the segment, footer and space padding included.
    pub fn write(&self, out: &mut Vec<u8>, n_clusters: u16) {
        let start = out.len();
        let has_extra_word = self.header.n_extra_bytes_per_entry > 0;

        self.header.write(out);
        for entry in &self.entries {
            entry.write(out, has_extra_word);
        }
        out.extend_from_slice(&STATUS_FOOTER.to_le_bytes());

        let seg_bytes = n_clusters as usize * CLUSTER_SIZE;
        debug_assert!(out.len() - start <= seg_bytes);
        out.resize(start + seg_bytes, PAD_BYTE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{STATUS_EMPTY, STATUS_PERMANENT};

    fn sample_entry() -> RawEntry {
        RawEntry {
            status: STATUS_PERMANENT,
            filename: [0x1234, 0x5678, 0x9ABC],
            n_clusters: 3,
            ch_job: 0,
            date: 0,
            extra_word: 0x00A0,
        }
    }

    #[test]
    fn test_header_wire_layout() {
        let header = SegmentHeader {
            n_dir_segs: 1,
            i_next_seg: 0,
            i_highest_seg_used: 1,
            n_extra_bytes_per_entry: 0,
            data_offset: 4,
        };
        let mut out = Vec::new();
        header.write(&mut out);
        assert_eq!(out, [1, 0, 0, 0, 1, 0, 0, 0, 4, 0]);

        let mut r = Reader::new(&out);
        assert_eq!(SegmentHeader::read(&mut r).unwrap(), header);
    }

    #[test]
    fn test_entry_with_and_without_extra_word() {
        let entry = sample_entry();

        let mut v1 = Vec::new();
        entry.write(&mut v1, false);
        assert_eq!(v1.len(), 14);

        let mut v2 = Vec::new();
        entry.write(&mut v2, true);
        assert_eq!(v2.len(), 16);
        assert_eq!(&v2[14..], [0xA0, 0x00]);

        let mut r = Reader::new(&v2);
        let parsed = RawEntry::read(&mut r, true).unwrap().unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_footer_terminates_entry_list() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&STATUS_FOOTER.to_le_bytes());
        let mut r = Reader::new(&bytes);
        assert!(RawEntry::read(&mut r, false).unwrap().is_none());
    }

    #[test]
    fn test_segment_roundtrip_with_padding() {
        let seg = Segment {
            header: SegmentHeader {
                n_dir_segs: 1,
                i_next_seg: 0,
                i_highest_seg_used: 1,
                n_extra_bytes_per_entry: 0,
                data_offset: 4,
            },
            entries: vec![RawEntry {
                status: STATUS_EMPTY,
                filename: [0x2020; 3],
                n_clusters: 16,
                ch_job: 0,
                date: 0,
                extra_word: 0,
            }],
        };

        let mut out = Vec::new();
        seg.write(&mut out, 2);
        assert_eq!(out.len(), 1024);
        // Header + one entry + footer, then spaces.
        assert!(out[10 + 14 + 2..].iter().all(|&b| b == PAD_BYTE));

        let mut r = Reader::new(&out);
        assert_eq!(Segment::read(&mut r, 2).unwrap(), seg);
    }

    #[test]
    fn test_truncated_segment_is_an_error() {
        let bytes = [0u8; 4];
        let mut r = Reader::new(&bytes);
        assert!(Segment::read(&mut r, 2).is_err());
    }
}
