use crate::error::DecompressError;
use crate::format::{COPYLENGTH, LASTLITERALS, MINMATCH, ML_BITS, ML_MASK, RUN_MASK, read_u16_le};

type Result<T> = core::result::Result<T, DecompressError>;

/// Decompresses an LZ4 block from `src` into `dst`.
///
/// `dst` must be exactly the decompressed size: a stream is only accepted
/// when its terminating literal run lands precisely on the end of `dst`.
/// Returns the number of input bytes consumed; trailing input beyond the
/// block is left unread.
///
/// Any error leaves `dst` partially written and must be treated as corrupt
/// input; [`DecompressError::consumed`] reports where decoding stopped.
pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let src_len = src.len();
    let dst_end = dst.len();

    let mut src_p = 0;
    let mut dst_p = 0;

    loop {
        if src_p >= src_len {
            return Err(DecompressError::Truncated { consumed: src_p });
        }
        let token = src[src_p];
        src_p += 1;

        // Literal run length.
        let mut length = (token >> ML_BITS) as usize;
        if length == RUN_MASK {
            length += read_length_extension(src, &mut src_p)?;
        }

        // Copy literals. A run reaching into the last COPYLENGTH bytes of
        // the output is only valid as the terminating run, ending exactly
        // at the output end.
        let run_end = dst_p + length;
        if run_end + COPYLENGTH > dst_end {
            if run_end != dst_end {
                return Err(DecompressError::MalformedSequence { consumed: src_p });
            }
            if src_p + length > src_len {
                return Err(DecompressError::Truncated { consumed: src_p });
            }
            dst[dst_p..run_end].copy_from_slice(&src[src_p..src_p + length]);
            src_p += length;
            return Ok(src_p);
        }
        if src_p + length > src_len {
            return Err(DecompressError::Truncated { consumed: src_p });
        }
        dst[dst_p..run_end].copy_from_slice(&src[src_p..src_p + length]);
        src_p += length;
        dst_p = run_end;

        // Back-reference offset.
        if src_p + 2 > src_len {
            return Err(DecompressError::Truncated { consumed: src_p });
        }
        let offset = read_u16_le(src, src_p) as usize;
        src_p += 2;
        if offset == 0 || offset > dst_p {
            return Err(DecompressError::InvalidOffset { consumed: src_p });
        }

        // Match length.
        let mut match_len = (token & ML_MASK as u8) as usize;
        if match_len == ML_MASK {
            match_len += read_length_extension(src, &mut src_p)?;
        }
        match_len += MINMATCH;

        // The last LASTLITERALS output bytes must come from literals.
        let match_end = dst_p + match_len;
        if match_end + LASTLITERALS > dst_end {
            return Err(DecompressError::MalformedSequence { consumed: src_p });
        }

        copy_match(dst, dst_p, offset, match_len);
        dst_p = match_end;
    }
}

/// Reads the open-ended length extension: `0xFF` continuation bytes each add
/// 255, the first other byte terminates and adds its value.
#[inline]
fn read_length_extension(src: &[u8], src_p: &mut usize) -> Result<usize> {
    let mut extra = 0;
    loop {
        if *src_p >= src.len() {
            return Err(DecompressError::Truncated { consumed: *src_p });
        }
        let byte = src[*src_p];
        *src_p += 1;
        extra += byte as usize;
        if byte != 255 {
            return Ok(extra);
        }
    }
}

/// Replays `length` bytes from `offset` back in the already-decoded output.
///
/// When the offset is shorter than the run the source overlaps the
/// destination, and bytes written here are re-read as the copy proceeds;
/// the copy must therefore go forward one byte at a time (or, for the
/// offset-1 case, degenerate into a fill).
#[inline]
fn copy_match(dst: &mut [u8], dst_p: usize, offset: usize, length: usize) {
    let match_src = dst_p - offset;

    if offset == 1 {
        let byte = dst[dst_p - 1];
        dst[dst_p..dst_p + length].fill(byte);
    } else if offset >= length {
        dst.copy_within(match_src..match_src + length, dst_p);
    } else {
        for k in 0..length {
            dst[dst_p + k] = dst[match_src + k];
        }
    }
}
