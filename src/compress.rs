use alloc::vec;
use alloc::vec::Vec;

use crate::error::CompressError;
use crate::format::{
    LASTLITERALS, MAX_DISTANCE, MFLIMIT, MINLENGTH, MINMATCH, ML_BITS, ML_MASK, RUN_MASK,
    common_length, equal4, extension_bytes, max_output_length, read_u32_le, sequence_hash,
    write_final_literals, write_u16_le,
};

/// log2 of the fast-path hash table size.
const HASH_LOG: u32 = 12;
const HASH_TABLE_SIZE: usize = 1 << HASH_LOG;
const HASH_SHIFT: u32 = (MINMATCH as u32) * 8 - HASH_LOG;

/// Governs the adaptive skip: the search step grows by one every
/// `2^SKIPSTRENGTH` failed attempts, so incompressible regions are crossed
/// in amortized constant time at some cost in ratio.
const SKIPSTRENGTH: usize = 6;

#[inline]
fn hash(src: &[u8], pos: usize) -> usize {
    sequence_hash(read_u32_le(src, pos), HASH_SHIFT)
}

/// Compresses `src` into `dst` using the fast greedy match finder.
///
/// Returns the number of bytes written. `dst` must be pre-allocated by the
/// caller; sizing it with [`max_output_length`] guarantees success. On
/// [`CompressError::OutputTooSmall`] the contents of `dst` are unspecified.
pub fn compress(src: &[u8], dst: &mut [u8]) -> Result<usize, CompressError> {
    let mut dst_p = 0;
    let mut anchor = 0;

    if src.len() >= MINLENGTH {
        (dst_p, anchor) = compress_sequences(src, dst)?;
    }

    write_final_literals(src, anchor, dst, dst_p)
}

/// Compresses `src` into a freshly allocated worst-case buffer and trims it
/// to the actual compressed size.
#[must_use]
pub fn compress_to_vec(src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0u8; max_output_length(src.len())];
    let written = compress(src, &mut dst).expect("worst-case sized destination");
    dst.truncate(written);
    dst
}

/// Emits all match-bearing sequences, leaving the terminating literal run to
/// the caller. Returns `(write position, literal anchor)`.
///
/// The hash table maps a 4-byte prefix hash to the most recent position that
/// produced it; there is no chaining, so stale entries are filtered by a
/// direct 4-byte comparison. Entries default to position 0, which the same
/// comparison makes harmless.
fn compress_sequences(src: &[u8], dst: &mut [u8]) -> Result<(usize, usize), CompressError> {
    let src_len = src.len();
    let dst_end = dst.len();
    let src_mflimit = src_len - MFLIMIT;
    let last_literals = src_len - LASTLITERALS;

    let mut hash_table = vec![0u32; HASH_TABLE_SIZE];

    let mut anchor = 0;
    let mut dst_p = 0;

    hash_table[hash(src, 0)] = 0;
    let mut src_p = 1;
    let mut h_fwd = hash(src, src_p);

    'scan: loop {
        // Find a match, skipping faster and faster while none verifies.
        let mut attempts = (1 << SKIPSTRENGTH) + 3;
        let mut fwd = src_p;
        let mut src_ref;
        loop {
            let h = h_fwd;
            let step = attempts >> SKIPSTRENGTH;
            attempts += 1;
            src_p = fwd;
            fwd = src_p + step;

            if fwd > src_mflimit {
                break 'scan;
            }

            h_fwd = hash(src, fwd);
            src_ref = hash_table[h] as usize;
            hash_table[h] = src_p as u32;

            if src_ref + MAX_DISTANCE >= src_p && equal4(src, src_ref, src_p) {
                break;
            }
        }

        // Catch up: the match may extend left of the hashed position.
        while src_p > anchor && src_ref > 0 && src[src_p - 1] == src[src_ref - 1] {
            src_p -= 1;
            src_ref -= 1;
        }

        // Literal run since the previous anchor.
        let length = src_p - anchor;
        let mut token_idx = dst_p;
        dst_p += 1;

        // Reserve the run extension, the literals, the offset, and room for
        // the next token before writing any of them.
        if dst_p + length + extension_bytes(length, RUN_MASK) + 2 + 1 + LASTLITERALS > dst_end {
            return Err(CompressError::OutputTooSmall);
        }

        if length >= RUN_MASK {
            dst[token_idx] = (RUN_MASK << ML_BITS) as u8;
            let mut len = length - RUN_MASK;
            while len > 254 {
                dst[dst_p] = 255;
                dst_p += 1;
                len -= 255;
            }
            dst[dst_p] = len as u8;
            dst_p += 1;
        } else {
            dst[token_idx] = (length << ML_BITS) as u8;
        }

        dst[dst_p..dst_p + length].copy_from_slice(&src[anchor..anchor + length]);
        dst_p += length;

        loop {
            write_u16_le(dst, dst_p, (src_p - src_ref) as u16);
            dst_p += 2;

            // MINMATCH is already verified; count the extension.
            src_p += MINMATCH;
            src_ref += MINMATCH;
            anchor = src_p;
            src_p += common_length(src, src_p, src_ref, last_literals);

            let mut match_len = src_p - anchor;
            if dst_p + extension_bytes(match_len, ML_MASK) + 1 + LASTLITERALS > dst_end {
                return Err(CompressError::OutputTooSmall);
            }

            if match_len >= ML_MASK {
                dst[token_idx] += ML_MASK as u8;
                match_len -= ML_MASK;
                while match_len > 509 {
                    dst[dst_p] = 255;
                    dst[dst_p + 1] = 255;
                    dst_p += 2;
                    match_len -= 510;
                }
                if match_len > 254 {
                    match_len -= 255;
                    dst[dst_p] = 255;
                    dst_p += 1;
                }
                dst[dst_p] = match_len as u8;
                dst_p += 1;
            } else {
                dst[token_idx] += match_len as u8;
            }

            if src_p > src_mflimit {
                anchor = src_p;
                break 'scan;
            }

            // Backfill the position skipped by the match.
            hash_table[hash(src, src_p - 2)] = (src_p - 2) as u32;

            // If the position right after the match also matches, emit it
            // with an empty literal run instead of restarting the search.
            let h = hash(src, src_p);
            src_ref = hash_table[h] as usize;
            hash_table[h] = src_p as u32;

            if src_ref + MAX_DISTANCE + 1 > src_p && equal4(src, src_ref, src_p) {
                token_idx = dst_p;
                dst_p += 1;
                dst[token_idx] = 0;
                continue;
            }

            anchor = src_p;
            src_p += 1;
            h_fwd = hash(src, src_p);
            break;
        }
    }

    Ok((dst_p, anchor))
}
