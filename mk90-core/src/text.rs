//! Text payload framing.
//!
//! Payloads written by the MK-90 BASIC editor are CR/LF framed: `\r\n`,
//! then the lines joined by `\r\n`, then `\r\n` and a NUL terminator, the
//! whole thing space-padded up to a cluster boundary.

use crate::{koi7, CLUSTER_SIZE, PAD_BYTE};

/// A plain (filename, raw payload) exchange record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub filename: String,
    pub data: Vec<u8>,
}

/// A plain (filename, decoded lines) exchange record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub filename: String,
    pub lines: Vec<String>,
}

/// Frame host text lines into a cluster-padded payload.
pub fn encode_lines(lines: &[String]) -> Vec<u8> {
    let mut payload = Vec::new();

    payload.extend_from_slice(b"\r\n");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            payload.extend_from_slice(b"\r\n");
        }
        payload.extend_from_slice(&koi7::utf_to_koi(line));
    }
    payload.extend_from_slice(b"\r\n\x00");

    pad_to_cluster(payload)
}

/// Split a framed payload back into decoded lines. The payload ends at the
/// first NUL; blank lines (the framing itself) are dropped.
pub fn decode_payload(payload: &[u8]) -> Vec<String> {
    let end = payload
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(payload.len());

    split_crlf(&payload[..end])
        .into_iter()
        .filter(|chunk| !chunk.is_empty())
        .map(koi7::koi_to_utf)
        .collect()
}

/// Pad a payload with spaces up to a whole number of clusters (at least one:
/// a zero-cluster file would be unrepresentable free space).
pub fn pad_to_cluster(mut payload: Vec<u8>) -> Vec<u8> {
    let n_clusters = payload.len().div_ceil(CLUSTER_SIZE).max(1);
    payload.resize(n_clusters * CLUSTER_SIZE, PAD_BYTE);
    payload
}

fn split_crlf(bytes: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'\r' && bytes[i + 1] == b'\n' {
            chunks.push(&bytes[start..i]);
            i += 2;
            start = i;
        } else {
            i += 1;
        }
    }
    chunks.push(&bytes[start..]);

    chunks
}
