//! Constants and byte-level primitives shared by the encoders and the decoder.
//!
//! The LZ4 block format is a sequence of
//! `[token][literal-length extension][literals][offset:2 LE][match-length extension]`
//! records, terminated by a literal-only run. The token packs the literal
//! length in its high nibble and `match length - 4` in its low nibble; a
//! nibble of 15 is extended by `0xFF` continuation bytes plus one final
//! remainder byte.

use crate::error::CompressError;

/// Minimum length of an encodable match.
pub(crate) const MINMATCH: usize = 4;

/// Decoder copy granularity; intermediate literal runs must leave this margin.
pub(crate) const COPYLENGTH: usize = 8;

/// The last bytes of a block are always literals, never match targets.
pub(crate) const LASTLITERALS: usize = 5;

/// No match may start within this distance of the input end.
pub(crate) const MFLIMIT: usize = COPYLENGTH + MINMATCH;

/// Inputs shorter than this are emitted as a single literal run.
pub(crate) const MINLENGTH: usize = MFLIMIT + 1;

pub(crate) const ML_BITS: usize = 4;
pub(crate) const ML_MASK: usize = (1 << ML_BITS) - 1;
pub(crate) const RUN_BITS: usize = 8 - ML_BITS;
pub(crate) const RUN_MASK: usize = (1 << RUN_BITS) - 1;

/// Maximum back-reference distance (16-bit offset field).
pub(crate) const MAX_DISTANCE: usize = 65535;

/// Knuth multiplicative hash constant; both hash tables derive their index
/// from the same 4-byte prefix multiply, differing only in shift width.
const HASH_MULTIPLIER: u32 = 2_654_435_761;

/// Worst-case compressed size for an input of `input_length` bytes.
///
/// Destinations sized with this bound never fail with
/// [`CompressError::OutputTooSmall`], even on incompressible input.
#[must_use]
pub const fn max_output_length(input_length: usize) -> usize {
    input_length + input_length / 255 + 16
}

/// Number of length-extension bytes a nibble value appends: none while it
/// fits below `mask`, otherwise one byte per full 255 plus the terminating
/// remainder byte. Used to reserve destination space before emitting.
#[inline]
pub(crate) const fn extension_bytes(value: usize, mask: usize) -> usize {
    if value < mask {
        0
    } else {
        (value - mask) / 255 + 1
    }
}

#[inline]
pub(crate) fn read_u32_le(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

#[inline]
pub(crate) fn read_u16_le(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

#[inline]
pub(crate) fn write_u16_le(buf: &mut [u8], pos: usize, value: u16) {
    let bytes = value.to_le_bytes();
    buf[pos] = bytes[0];
    buf[pos + 1] = bytes[1];
}

/// Hashes a 4-byte prefix into a table index; `shift` selects the table size.
#[inline]
pub(crate) fn sequence_hash(value: u32, shift: u32) -> usize {
    (value.wrapping_mul(HASH_MULTIPLIER) >> shift) as usize
}

#[inline]
pub(crate) fn equal4(buf: &[u8], a: usize, b: usize) -> bool {
    read_u32_le(buf, a) == read_u32_le(buf, b)
}

/// Counts how many bytes starting at `pos` match the run starting at
/// `match_pos`, with `pos` never scanned past `limit` (the last-literals
/// boundary). Compares four bytes at a time and resolves the first mismatch
/// from the XOR's trailing zeros.
pub(crate) fn common_length(src: &[u8], pos: usize, match_pos: usize, limit: usize) -> usize {
    let start = pos;
    let mut pos = pos;
    let mut match_pos = match_pos;

    while pos + MINMATCH <= limit {
        let diff = read_u32_le(src, match_pos) ^ read_u32_le(src, pos);
        if diff == 0 {
            pos += MINMATCH;
            match_pos += MINMATCH;
            continue;
        }
        return pos - start + (diff.trailing_zeros() >> 3) as usize;
    }
    if pos + 1 < limit && src[match_pos] == src[pos] && src[match_pos + 1] == src[pos + 1] {
        pos += 2;
        match_pos += 2;
    }
    if pos < limit && src[match_pos] == src[pos] {
        pos += 1;
    }
    pos - start
}

/// Emits the terminating literal-only run covering `src[anchor..]`.
///
/// Returns the updated write position. The bound check is exact: a
/// destination holding precisely the encoded run succeeds.
pub(crate) fn write_final_literals(
    src: &[u8],
    anchor: usize,
    dst: &mut [u8],
    mut dst_p: usize,
) -> Result<usize, CompressError> {
    let run = src.len() - anchor;

    if dst_p + run + 1 + extension_bytes(run, RUN_MASK) > dst.len() {
        return Err(CompressError::OutputTooSmall);
    }

    if run >= RUN_MASK {
        dst[dst_p] = (RUN_MASK << ML_BITS) as u8;
        dst_p += 1;
        let mut len = run - RUN_MASK;
        while len > 254 {
            dst[dst_p] = 255;
            dst_p += 1;
            len -= 255;
        }
        dst[dst_p] = len as u8;
        dst_p += 1;
    } else {
        dst[dst_p] = (run << ML_BITS) as u8;
        dst_p += 1;
    }

    dst[dst_p..dst_p + run].copy_from_slice(&src[anchor..]);
    Ok(dst_p + run)
}
