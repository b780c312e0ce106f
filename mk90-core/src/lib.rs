//! Elektronika MK-90 Volume Image Core
//!
//! This crate reads, edits and writes binary volume images for the
//! Elektronika MK-90, whose on-disk layout is a simplified derivative of
//! the RT-11 volume format:
//! - `image`: the raw byte layout (bootloader, home block, chained
//!   directory segments, data clusters)
//! - `volume`: the editable in-memory model, decoupled from segment framing
//! - `radix50`: RADIX-50 filename packing
//! - `koi7` / `text`: KOI-7 transcoding and CR/LF payload framing
//!
//! # Architecture
//!
//! The two representations are bridged by order-preserving converters:
//! raw bytes parse into a typed segment/entry tree, which zips into a flat
//! sequence of (header, payload) entries for editing. Serialization runs
//! the same path in reverse and reproduces valid images byte-exactly.
//!
//! Documentation source: RT-11 Volume and File Formats Manual (AA-PD6PA-TC).

pub mod error;
pub mod image;
pub mod koi7;
pub mod radix50;
pub mod text;
pub mod volume;

pub use error::{VolumeError, VolumeResult};
pub use radix50::Filename;
pub use text::{FileRecord, TextFile};
pub use volume::{Volume, VolumeParams, VolumeSnapshot};

/// Fixed allocation unit, in bytes. All sizes on a volume are whole clusters.
pub const CLUSTER_SIZE: usize = 512;

/// Clusters reserved at the start of every volume: bootloader + home block.
pub const N_SYS_CLUSTERS: u16 = 2;

/// Hard ceiling on the volume size, in clusters.
pub const N_CLUSTERS_MAX: u16 = 127;

/// Pad byte for segment tails and file payloads.
pub const PAD_BYTE: u8 = 0x20;

/// A filename word made of pad bytes; empty entries carry three of these.
pub const PAD_WORD: u16 = 0x2020;

/// Directory segment header size, in bytes.
pub const SEGMENT_HEADER_SIZE: usize = 10;

/// Segment footer (end-of-segment marker) size, in bytes.
pub const SEGMENT_FOOTER_SIZE: usize = 2;

/// Directory entry size without the optional extra word, in bytes.
pub const ENTRY_BASE_SIZE: usize = 14;

// Directory entry status words.
/// Empty (reusable) area.
pub const STATUS_EMPTY: u16 = 0x0200;
/// Permanent file.
pub const STATUS_PERMANENT: u16 = 0x0400;
/// End-of-segment footer.
pub const STATUS_FOOTER: u16 = 0x0800;

/// Job/channel word, reserved and never interpreted by the MK-90.
pub const DEF_CH_JOB: u16 = 0x0000;

/// Creation-date word, reserved and never interpreted by the MK-90.
pub const DEF_DATE: u16 = 0x0000;

/// Entry extra word used by BASIC v1.0 volumes (no extra bytes per entry).
pub const EXTRA_WORD_V1: u16 = 0x0000;

/// Entry extra word written by BASIC v2.0 volumes (two extra bytes per
/// entry). Its meaning is unknown, possibly a reserved checksum slot.
pub const EXTRA_WORD_V2: u16 = 0x00A0;
