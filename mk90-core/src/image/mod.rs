//! Raw volume byte layout.
//!
//! Image regions, in order: bootloader (one cluster), home block (one
//! cluster), one or two directory segments, then one data blob per
//! non-footer directory entry. The data section carries no length metadata
//! of its own: blob count and sizes come from the already-parsed directory,
//! in traversal order.

mod segment;

pub use segment::{RawEntry, Segment, SegmentHeader};

use crate::error::{VolumeError, VolumeResult};
use crate::{CLUSTER_SIZE, N_SYS_CLUSTERS};

/// Little-endian slice reader used by the layout parsers.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    pub fn u16(&mut self) -> VolumeResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn take(&mut self, n: usize) -> VolumeResult<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(VolumeError::MalformedImage(format!(
                "truncated image: wanted {} byte(s) at offset {}, {} left",
                n,
                self.pos,
                self.buf.len() - self.pos
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> VolumeResult<()> {
        self.take(n).map(|_| ())
    }
}

/// The typed tree of a whole volume image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVolume {
    pub bootloader: Vec<u8>,
    pub home_block: Vec<u8>,
    pub segments: Vec<Segment>,
    /// One blob per non-footer entry, in directory traversal order.
    pub data: Vec<Vec<u8>>,
    /// Segment size in clusters, inferred from the first header.
    pub n_clusters_per_dir_seg: u16,
}

impl RawVolume {
    /// Parse a raw image. Truncation, segment/data inconsistencies and
    /// trailing bytes are all hard errors.
    pub fn parse(bytes: &[u8]) -> VolumeResult<Self> {
        let mut r = Reader::new(bytes);

        let bootloader = r.take(CLUSTER_SIZE)?.to_vec();
        let home_block = r.take(CLUSTER_SIZE)?.to_vec();

        let n_clusters_per_dir_seg = Self::infer_seg_clusters(bytes)?;

        // The chain is stored contiguously; i_next_seg only marks the end.
        let mut segments = Vec::new();
        loop {
            let seg = Segment::read(&mut r, n_clusters_per_dir_seg)?;
            let last = seg.header.i_next_seg == 0;
            segments.push(seg);
            if last {
                break;
            }
        }

        let mut data = Vec::new();
        for seg in &segments {
            for entry in &seg.entries {
                data.push(r.take(entry.n_clusters as usize * CLUSTER_SIZE)?.to_vec());
            }
        }

        if !r.is_at_end() {
            return Err(VolumeError::MalformedImage(format!(
                "{} trailing byte(s) after the data section",
                bytes.len() - r.pos()
            )));
        }

        Ok(Self {
            bootloader,
            home_block,
            segments,
            data,
            n_clusters_per_dir_seg,
        })
    }

    /// Serialize back to bytes. Inverse of [`RawVolume::parse`]; identical
    /// for any tree that came out of it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n_bytes = (N_SYS_CLUSTERS as usize
            + self.segments.len() * self.n_clusters_per_dir_seg as usize)
            * CLUSTER_SIZE
            + self.data.iter().map(Vec::len).sum::<usize>();
        let mut out = Vec::with_capacity(n_bytes);

        out.extend_from_slice(&self.bootloader);
        out.extend_from_slice(&self.home_block);
        for seg in &self.segments {
            seg.write(&mut out, self.n_clusters_per_dir_seg);
        }
        for blob in &self.data {
            out.extend_from_slice(blob);
        }

        out
    }

    /// Total volume size, in clusters. Errors when the count does not fit
    /// a cluster word; a wrapped value could masquerade as a valid size.
    pub fn n_clusters_allocated(&self) -> VolumeResult<u16> {
        let data_clusters: usize = self
            .data
            .iter()
            .map(|blob| blob.len() / CLUSTER_SIZE)
            .sum();
        let total = N_SYS_CLUSTERS as usize
            + self.segments.len() * self.n_clusters_per_dir_seg as usize
            + data_clusters;

        u16::try_from(total).map_err(|_| {
            VolumeError::MalformedImage(format!("volume spans {} clusters", total))
        })
    }

    /// All non-footer entries, in traversal order.
    pub fn entries(&self) -> impl Iterator<Item = &RawEntry> {
        self.segments.iter().flat_map(|seg| seg.entries.iter())
    }

    pub fn n_extra_bytes_per_entry(&self) -> u16 {
        self.segments
            .first()
            .map(|seg| seg.header.n_extra_bytes_per_entry)
            .unwrap_or(0)
    }

    /// The segment size is not stored directly: the first header's
    /// `data_offset` is the system area plus the whole directory, so
    /// `(data_offset - N_SYS_CLUSTERS) / n_dir_segs` recovers it.
    fn infer_seg_clusters(bytes: &[u8]) -> VolumeResult<u16> {
        let mut r = Reader::new(&bytes[N_SYS_CLUSTERS as usize * CLUSTER_SIZE..]);
        let first = SegmentHeader::read(&mut r)?;

        if first.n_dir_segs == 0 {
            return Err(VolumeError::MalformedImage(
                "first segment header claims zero directory segments".into(),
            ));
        }

        let dir_clusters = first
            .data_offset
            .checked_sub(N_SYS_CLUSTERS)
            .unwrap_or(0);
        let per_seg = dir_clusters / first.n_dir_segs;

        if per_seg == 0 || per_seg > 2 || per_seg * first.n_dir_segs != dir_clusters {
            return Err(VolumeError::MalformedImage(format!(
                "data offset {} inconsistent with {} directory segment(s)",
                first.data_offset, first.n_dir_segs
            )));
        }

        Ok(per_seg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PAD_BYTE, PAD_WORD, STATUS_EMPTY, STATUS_FOOTER};

    /// A fresh 20-cluster volume: 1 two-cluster segment, one empty entry
    /// spanning the 16 data clusters.
    fn fresh_image() -> Vec<u8> {
        let mut bytes = vec![0u8; 2 * CLUSTER_SIZE];

        // Segment header.
        for word in [1u16, 0, 1, 0, 4] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        // Single empty entry covering 16 clusters.
        for word in [STATUS_EMPTY, PAD_WORD, PAD_WORD, PAD_WORD, 16, 0, 0] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.extend_from_slice(&STATUS_FOOTER.to_le_bytes());
        bytes.resize(4 * CLUSTER_SIZE, PAD_BYTE);

        bytes.extend_from_slice(&vec![PAD_BYTE; 16 * CLUSTER_SIZE]);
        bytes
    }

    #[test]
    fn test_parse_fresh_image() {
        let bytes = fresh_image();
        let raw = RawVolume::parse(&bytes).unwrap();

        assert_eq!(raw.segments.len(), 1);
        assert_eq!(raw.n_clusters_per_dir_seg, 2);
        assert_eq!(raw.n_clusters_allocated().unwrap(), 20);

        let entries: Vec<_> = raw.entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, STATUS_EMPTY);
        assert_eq!(entries[0].n_clusters, 16);
        assert_eq!(raw.data.len(), 1);
        assert_eq!(raw.data[0].len(), 16 * CLUSTER_SIZE);
    }

    #[test]
    fn test_byte_exact_roundtrip() {
        let bytes = fresh_image();
        let raw = RawVolume::parse(&bytes).unwrap();
        assert_eq!(raw.to_bytes(), bytes);
    }

    #[test]
    fn test_truncated_data_section_is_fatal() {
        let bytes = fresh_image();
        assert!(matches!(
            RawVolume::parse(&bytes[..bytes.len() - 1]),
            Err(VolumeError::MalformedImage(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_are_fatal() {
        let mut bytes = fresh_image();
        bytes.push(0);
        assert!(matches!(
            RawVolume::parse(&bytes),
            Err(VolumeError::MalformedImage(_))
        ));
    }

    #[test]
    fn test_tiny_buffer_is_fatal() {
        assert!(RawVolume::parse(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_cluster_count_overflow_is_fatal() {
        let mut raw = RawVolume::parse(&fresh_image()).unwrap();
        // 65552 data clusters: the true total (65556) would wrap to a
        // plausible-looking 20 in a bare u16.
        raw.data = vec![vec![0u8; 65552 * CLUSTER_SIZE]];
        assert!(matches!(
            raw.n_clusters_allocated(),
            Err(VolumeError::MalformedImage(_))
        ));
    }

    #[test]
    fn test_inconsistent_data_offset_is_fatal() {
        let mut bytes = fresh_image();
        // data_offset = 9 can't be split between 1 segment of 1..=2 clusters.
        let off = 2 * CLUSTER_SIZE + 8;
        bytes[off..off + 2].copy_from_slice(&9u16.to_le_bytes());
        assert!(matches!(
            RawVolume::parse(&bytes),
            Err(VolumeError::MalformedImage(_))
        ));
    }
}
