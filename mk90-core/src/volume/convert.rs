//! Order-preserving converters between the raw layout and the virtual
//! volume. On valid input they are inverses of each other.

use crate::error::{VolumeError, VolumeResult};
use crate::image::{RawEntry, RawVolume, Segment, SegmentHeader};
use crate::N_SYS_CLUSTERS;

use super::data::VolumeData;
use super::entry::{DataEntry, DataEntryHeader};
use super::params::VolumeParams;
use super::Volume;

/// Zip the parsed directory entries with their data blobs into a virtual
/// volume. The dialect tag is inferred from `n_extra_bytes_per_entry`.
pub(super) fn from_raw(mut raw: RawVolume) -> VolumeResult<Volume> {
    let n_extra = raw.n_extra_bytes_per_entry();
    let extra_word = VolumeParams::extra_word_for(n_extra);

    let mut params = VolumeParams::new(
        raw.n_clusters_allocated()?,
        n_extra,
        raw.segments.len() as u16,
        raw.n_clusters_per_dir_seg,
        extra_word,
    )?;
    if let Some(first) = raw.segments.first() {
        params.set_i_highest_seg_used(first.header.i_highest_seg_used);
    }

    // Detach the blobs first; the entry references borrow the segments.
    let blobs = std::mem::take(&mut raw.data);
    let entries: Vec<&RawEntry> = raw.entries().collect();
    if entries.len() != blobs.len() {
        return Err(VolumeError::MalformedImage(format!(
            "{} directory entries but {} data blob(s)",
            entries.len(),
            blobs.len()
        )));
    }

    let data_entries = entries
        .into_iter()
        .zip(blobs)
        .map(|(e, blob)| {
            DataEntry::new(
                DataEntryHeader {
                    status: e.status,
                    filename: e.filename,
                    n_clusters: e.n_clusters,
                    ch_job: e.ch_job,
                    date: e.date,
                    extra_word: e.extra_word,
                },
                blob,
            )
        })
        .collect();

    Ok(Volume {
        bootloader: raw.bootloader,
        home_block: raw.home_block,
        params,
        data: VolumeData::new(data_entries, extra_word),
    })
}

/// Regroup the flat entry sequence into fixed-size segment buckets and
/// rebuild every header. `data_offset` accumulates the clusters of all
/// preceding segments, starting right after the system and directory area.
pub(super) fn to_raw(vol: &Volume) -> RawVolume {
    let params = &vol.params;
    let per_seg = params.n_max_entries_per_dir_seg() as usize;
    let n_dir_segs = params.n_dir_segs();

    let mut buckets: Vec<Vec<&DataEntry>> = Vec::with_capacity(n_dir_segs as usize);
    let entries: Vec<&DataEntry> = vol.data.iter().collect();
    for chunk in entries.chunks(per_seg) {
        buckets.push(chunk.to_vec());
    }
    while (buckets.len() as u16) < n_dir_segs {
        buckets.push(Vec::new());
    }

    let mut data_offset = N_SYS_CLUSTERS + n_dir_segs * params.n_clusters_per_dir_seg();
    let mut segments = Vec::with_capacity(buckets.len());

    for (i, bucket) in buckets.iter().enumerate() {
        let i_seg = i as u16 + 1;
        let header = SegmentHeader {
            n_dir_segs,
            i_next_seg: if i_seg == n_dir_segs { 0 } else { i_seg + 1 },
            i_highest_seg_used: params.i_highest_seg_used(),
            n_extra_bytes_per_entry: params.n_extra_bytes_per_entry(),
            data_offset,
        };
        data_offset += bucket.iter().map(|e| e.n_clusters()).sum::<u16>();

        segments.push(Segment {
            header,
            entries: bucket
                .iter()
                .map(|e| RawEntry {
                    status: e.header().status,
                    filename: e.header().filename,
                    n_clusters: e.header().n_clusters,
                    ch_job: e.header().ch_job,
                    date: e.header().date,
                    extra_word: e.header().extra_word,
                })
                .collect(),
        });
    }

    RawVolume {
        bootloader: vol.bootloader.clone(),
        home_block: vol.home_block.clone(),
        segments,
        data: vol.data.iter().map(|e| e.data().to_vec()).collect(),
        n_clusters_per_dir_seg: params.n_clusters_per_dir_seg(),
    }
}
