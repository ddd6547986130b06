//! # LZ4 Block Codec
//!
//! `lz4-block` is a safe, pure-Rust implementation of the LZ4 **block**
//! format: raw token/literal/match sequences with no frame header, magic, or
//! checksum. Callers are responsible for framing (e.g. length-prefixing)
//! block boundaries externally.
//!
//! Two encoders share the same output format:
//!
//! - [`compress`]: single-pass greedy matching over a small hash table, with
//!   an adaptive skip that stays fast on incompressible data.
//! - [`compress_hc`]: hash-chain search with lazy two-step lookahead, slower
//!   but with a better ratio.
//!
//! [`decompress`] replays either stream into an exactly-sized output buffer
//! and reports how many input bytes the block occupied.
//!
//! All three operate on caller-provided buffers and never allocate the
//! destination; size compression destinations with [`max_output_length`] to
//! guarantee success. [`compress_to_vec`] and [`compress_hc_to_vec`] wrap
//! that pattern when an owned result is more convenient.
//!
//! ## Example
//!
//! ```rust
//! extern crate alloc;
//! use alloc::vec;
//! use lz4_block::{compress_to_vec, decompress};
//!
//! let data = b"an LZ4 block: literals, then matches over earlier literals";
//! let compressed = compress_to_vec(data);
//!
//! let mut restored = vec![0u8; data.len()];
//! let consumed = decompress(&compressed, &mut restored).expect("valid block");
//! assert_eq!(&restored[..], &data[..]);
//! assert_eq!(consumed, compressed.len());
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod compress;
pub mod compress_hc;
pub mod decompress;
pub mod error;
mod format;

pub use compress::{compress, compress_to_vec};
pub use compress_hc::{compress_hc, compress_hc_to_vec};
pub use decompress::decompress;
pub use error::{CompressError, DecompressError};
pub use format::max_output_length;

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{compress, compress_hc, decompress, max_output_length};

    #[test]
    fn test_round_trip() {
        let original = b"Hello world repeated Hello world repeated Hello world repeated";
        let mut compressed = vec![0u8; max_output_length(original.len())];
        let written = compress(original, &mut compressed).unwrap();

        let mut decompressed = vec![0u8; original.len()];
        let consumed = decompress(&compressed[..written], &mut decompressed).unwrap();

        assert_eq!(original.to_vec(), decompressed);
        assert_eq!(consumed, written);
    }

    #[test]
    fn test_compress_rle() {
        let original = vec![b'A'; 100];
        let mut compressed = vec![0u8; max_output_length(original.len())];
        let written = compress(&original, &mut compressed).unwrap();

        // A single run should shrink to one match-heavy sequence.
        assert!(written < original.len() / 4);

        let mut decompressed = vec![0u8; original.len()];
        decompress(&compressed[..written], &mut decompressed).unwrap();
        assert_eq!(original, decompressed);
    }

    #[test]
    fn test_hc_round_trip() {
        let phrase = b"The quick brown fox jumps over the lazy dog. ";
        let mut original = Vec::new();
        for _ in 0..20 {
            original.extend_from_slice(phrase);
        }

        let mut compressed = vec![0u8; max_output_length(original.len())];
        let written = compress_hc(&original, &mut compressed).unwrap();
        assert!(written < original.len());

        let mut decompressed = vec![0u8; original.len()];
        let consumed = decompress(&compressed[..written], &mut decompressed).unwrap();
        assert_eq!(original, decompressed);
        assert_eq!(consumed, written);
    }
}
