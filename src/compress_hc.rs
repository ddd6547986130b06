//! High-compression encoder.
//!
//! Same output format as the fast path, but the match finder keeps a hash
//! chain so every position can be checked against up to [`MAX_ATTEMPTS`]
//! previous occurrences, and emission is lazy: before committing a match the
//! encoder looks for wider matches starting one and two steps further in,
//! shortening or dropping pending matches so the final sequences never
//! overlap. Tie-breaks and the [`OPTIMAL_ML`] overlap correction follow the
//! reference encoder exactly.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::CompressError;
use crate::format::{
    LASTLITERALS, MAX_DISTANCE, MFLIMIT, MINLENGTH, MINMATCH, ML_BITS, ML_MASK, RUN_MASK,
    common_length, equal4, extension_bytes, max_output_length, read_u32_le, sequence_hash,
    write_final_literals, write_u16_le,
};

/// log2 of the HC head table size.
const HASH_LOG: u32 = 15;
const HASH_TABLE_SIZE: usize = 1 << HASH_LOG;
const HASH_SHIFT: u32 = (MINMATCH as u32) * 8 - HASH_LOG;

const CHAIN_SIZE: usize = 1 << 16;
const CHAIN_MASK: usize = CHAIN_SIZE - 1;

/// Chain links walked per position before giving up.
const MAX_ATTEMPTS: usize = 256;

/// Match length above which shortening a pending match stops paying off.
const OPTIMAL_ML: usize = ML_MASK - 1 + MINMATCH;

#[inline]
fn hash(src: &[u8], pos: usize) -> usize {
    sequence_hash(read_u32_le(src, pos), HASH_SHIFT)
}

/// Lazy-match lookahead states; each pass either emits the pending
/// sequence(s) and returns to scanning, or defers again.
enum Search {
    Second,
    Third,
}

/// Compresses `src` into `dst`, trading encode time for ratio.
///
/// Same contract as [`crate::compress`]: returns bytes written, or
/// [`CompressError::OutputTooSmall`] if `dst` cannot hold the stream.
pub fn compress_hc(src: &[u8], dst: &mut [u8]) -> Result<usize, CompressError> {
    let mut dst_p = 0;
    let mut anchor = 0;

    if src.len() >= MINLENGTH {
        (dst_p, anchor) = compress_sequences(src, dst)?;
    }

    write_final_literals(src, anchor, dst, dst_p)
}

/// HC variant of [`crate::compress_to_vec`].
#[must_use]
pub fn compress_hc_to_vec(src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0u8; max_output_length(src.len())];
    let written = compress_hc(src, &mut dst).expect("worst-case sized destination");
    dst.truncate(written);
    dst
}

fn compress_sequences(src: &[u8], dst: &mut [u8]) -> Result<(usize, usize), CompressError> {
    let src_mflimit = src.len() - MFLIMIT;
    let mut finder = MatchFinder::new(src);

    let mut anchor = 0;
    let mut dst_p = 0;
    let mut src_p = 1;

    'main: while src_p < src_mflimit {
        let Some((mut ml, mut src_ref)) = finder.best_match(src_p) else {
            src_p += 1;
            continue;
        };

        // Saved in case the lookahead overshoots and we fall back.
        let mut start0 = src_p;
        let mut ref0 = src_ref;
        let mut ml0 = ml;

        let (mut start2, mut ref2, mut ml2) = (0, 0, 0);
        let mut state = Search::Second;

        loop {
            match state {
                Search::Second => {
                    let wider = if src_p + ml < src_mflimit {
                        finder.wider_match(src_p + ml - 2, src_p + 1, ml)
                    } else {
                        None
                    };
                    let Some((w_ml, w_ref, w_start)) = wider else {
                        // Nothing better ahead: commit the match.
                        encode_sequence(
                            src, dst, &mut src_p, &mut dst_p, &mut anchor, src_ref, ml,
                        )?;
                        continue 'main;
                    };
                    (start2, ref2, ml2) = (w_start, w_ref, w_ml);

                    if start0 < src_p && start2 < src_p + ml0 {
                        // The skip went too far; restart from the saved match.
                        src_p = start0;
                        src_ref = ref0;
                        ml = ml0;
                    }

                    if start2 - src_p < 3 {
                        // First match too small to keep: replace it.
                        ml = ml2;
                        src_p = start2;
                        src_ref = ref2;
                        continue;
                    }

                    state = Search::Third;
                }
                Search::Third => {
                    // Here ml2 > ml and src_p + 3 <= start2 (usually < src_p + ml).
                    if start2 - src_p < OPTIMAL_ML {
                        let mut new_ml = ml.min(OPTIMAL_ML);
                        if src_p + new_ml > start2 + ml2 - MINMATCH {
                            new_ml = start2 - src_p + ml2 - MINMATCH;
                        }
                        if new_ml > start2 - src_p {
                            let correction = new_ml - (start2 - src_p);
                            start2 += correction;
                            ref2 += correction;
                            ml2 -= correction;
                        }
                    }

                    let wider = if start2 + ml2 < src_mflimit {
                        finder.wider_match(start2 + ml2 - 3, start2, ml2)
                    } else {
                        None
                    };
                    let Some((ml3, ref3, start3)) = wider else {
                        // No better third match: emit the two pending ones.
                        if start2 < src_p + ml {
                            ml = start2 - src_p;
                        }
                        encode_sequence(
                            src, dst, &mut src_p, &mut dst_p, &mut anchor, src_ref, ml,
                        )?;
                        src_p = start2;
                        encode_sequence(src, dst, &mut src_p, &mut dst_p, &mut anchor, ref2, ml2)?;
                        continue 'main;
                    };

                    if start3 < src_p + ml + 3 {
                        // Not enough room for the second match: remove it.
                        if start3 >= src_p + ml {
                            // The first match can be written as-is; the third
                            // becomes the new first, the second its lookahead.
                            if start2 < src_p + ml {
                                let correction = src_p + ml - start2;
                                start2 += correction;
                                ref2 += correction;
                                ml2 -= correction;
                                if ml2 < MINMATCH {
                                    start2 = start3;
                                    ref2 = ref3;
                                    ml2 = ml3;
                                }
                            }

                            encode_sequence(
                                src, dst, &mut src_p, &mut dst_p, &mut anchor, src_ref, ml,
                            )?;
                            src_p = start3;
                            src_ref = ref3;
                            ml = ml3;

                            start0 = start2;
                            ref0 = ref2;
                            ml0 = ml2;

                            state = Search::Second;
                            continue;
                        }

                        start2 = start3;
                        ref2 = ref3;
                        ml2 = ml3;
                        continue;
                    }

                    // Three ascending matches; write at least the first,
                    // shortened so it cannot overlap the second.
                    if start2 < src_p + ml {
                        if start2 - src_p < ML_MASK {
                            if ml > OPTIMAL_ML {
                                ml = OPTIMAL_ML;
                            }
                            if src_p + ml > start2 + ml2 - MINMATCH {
                                ml = start2 - src_p + ml2 - MINMATCH;
                            }
                            if ml > start2 - src_p {
                                let correction = ml - (start2 - src_p);
                                start2 += correction;
                                ref2 += correction;
                                ml2 -= correction;
                            }
                        } else {
                            ml = start2 - src_p;
                        }
                    }
                    encode_sequence(src, dst, &mut src_p, &mut dst_p, &mut anchor, src_ref, ml)?;

                    src_p = start2;
                    src_ref = ref2;
                    ml = ml2;

                    (start2, ref2, ml2) = (start3, ref3, ml3);
                }
            }
        }
    }

    Ok((dst_p, anchor))
}

/// Writes one literal-run + match sequence and advances past the match.
fn encode_sequence(
    src: &[u8],
    dst: &mut [u8],
    src_p: &mut usize,
    dst_p: &mut usize,
    anchor: &mut usize,
    match_pos: usize,
    match_len: usize,
) -> Result<(), CompressError> {
    let dst_end = dst.len();

    let length = *src_p - *anchor;
    let token_idx = *dst_p;
    *dst_p += 1;

    if *dst_p + length + extension_bytes(length, RUN_MASK) + 2 + 1 + LASTLITERALS > dst_end {
        return Err(CompressError::OutputTooSmall);
    }

    if length >= RUN_MASK {
        dst[token_idx] = (RUN_MASK << ML_BITS) as u8;
        let mut len = length - RUN_MASK;
        while len > 254 {
            dst[*dst_p] = 255;
            *dst_p += 1;
            len -= 255;
        }
        dst[*dst_p] = len as u8;
        *dst_p += 1;
    } else {
        dst[token_idx] = (length << ML_BITS) as u8;
    }

    dst[*dst_p..*dst_p + length].copy_from_slice(&src[*anchor..*anchor + length]);
    *dst_p += length;

    write_u16_le(dst, *dst_p, (*src_p - match_pos) as u16);
    *dst_p += 2;

    let mut len = match_len - MINMATCH;
    if *dst_p + extension_bytes(len, ML_MASK) + 1 + LASTLITERALS > dst_end {
        return Err(CompressError::OutputTooSmall);
    }

    if len >= ML_MASK {
        dst[token_idx] += ML_MASK as u8;
        len -= ML_MASK;
        while len > 509 {
            dst[*dst_p] = 255;
            dst[*dst_p + 1] = 255;
            *dst_p += 2;
            len -= 510;
        }
        if len > 254 {
            len -= 255;
            dst[*dst_p] = 255;
            *dst_p += 1;
        }
        dst[*dst_p] = len as u8;
        *dst_p += 1;
    } else {
        dst[token_idx] += len as u8;
    }

    *src_p += match_len;
    *anchor = *src_p;

    Ok(())
}

/// Hash-chain match finder.
///
/// `head` maps a 4-byte prefix hash to the most recent position holding it;
/// `chain` stores, per position (mod 2^16), the distance back to the previous
/// position with the same hash, clamped to [`MAX_DISTANCE`]. The `u16::MAX`
/// fill doubles as the end-of-chain sentinel: a clamped maximal step is
/// indistinguishable from it and both walk out of the window, which
/// [`MatchFinder::chain_back`] surfaces as `None`.
struct MatchFinder<'a> {
    src: &'a [u8],
    /// `src.len() - LASTLITERALS`; matches never scan past it.
    match_limit: usize,
    head: Vec<u32>,
    chain: Vec<u16>,
    next_to_update: usize,
}

impl<'a> MatchFinder<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            match_limit: src.len() - LASTLITERALS,
            head: vec![0; HASH_TABLE_SIZE],
            chain: vec![u16::MAX; CHAIN_SIZE],
            next_to_update: 1,
        }
    }

    /// Registers every position up to (excluding) `pos` in the tables.
    fn insert(&mut self, pos: usize) {
        while self.next_to_update < pos {
            let p = self.next_to_update;
            let h = hash(self.src, p);
            let delta = (p - self.head[h] as usize).min(MAX_DISTANCE);
            self.chain[p & CHAIN_MASK] = delta as u16;
            self.head[h] = p as u32;
            self.next_to_update += 1;
        }
    }

    /// Steps one link back along the chain, or `None` once the walk leaves
    /// the addressable range.
    #[inline]
    fn chain_back(&self, pos: usize) -> Option<usize> {
        pos.checked_sub(self.chain[pos & CHAIN_MASK] as usize)
    }

    /// Returns the longest match for `pos` as `(length, match position)`.
    ///
    /// Repetitive sequences with a period of at most 4 are detected up front
    /// and their chain entries pre-filled with the period, so long runs do
    /// not degenerate into full chain walks at every position.
    fn best_match(&mut self, pos: usize) -> Option<(usize, usize)> {
        let src = self.src;
        let min_ref = pos.saturating_sub(MAX_DISTANCE);
        let mut attempts = MAX_ATTEMPTS;
        let mut best_len = 0;
        let mut best_pos = 0;
        let mut repl = 0;
        let mut repl_delta = 0u16;

        self.insert(pos);
        let head_pos = self.head[hash(src, pos)] as usize;
        let mut candidate = Some(head_pos);

        if head_pos + 4 >= pos && head_pos < pos {
            if equal4(src, head_pos, pos) {
                repl_delta = (pos - head_pos) as u16;
                repl = common_length(src, pos + MINMATCH, head_pos + MINMATCH, self.match_limit)
                    + MINMATCH;
                best_len = repl;
                best_pos = head_pos;
            }
            candidate = self.chain_back(head_pos);
        }

        while let Some(cur) = candidate {
            if cur < min_ref || attempts == 0 {
                break;
            }
            attempts -= 1;
            if cur < pos
                && src[cur + best_len] == src[pos + best_len]
                && equal4(src, cur, pos)
            {
                let mlt =
                    common_length(src, pos + MINMATCH, cur + MINMATCH, self.match_limit) + MINMATCH;
                if mlt > best_len {
                    best_len = mlt;
                    best_pos = cur;
                }
            }
            candidate = self.chain_back(cur);
        }

        if repl > 0 {
            // Pre-load the chain across the detected repetition.
            let step = usize::from(repl_delta);
            let mut ptr = pos;
            let end = pos + repl - (MINMATCH - 1);
            while ptr + step < end {
                self.chain[ptr & CHAIN_MASK] = repl_delta;
                ptr += 1;
            }
            loop {
                self.chain[ptr & CHAIN_MASK] = repl_delta;
                self.head[hash(src, ptr)] = ptr as u32;
                ptr += 1;
                if ptr >= end {
                    break;
                }
            }
            self.next_to_update = end;
        }

        if best_len == 0 { None } else { Some((best_len, best_pos)) }
    }

    /// Looks for a match longer than `longest` whose start may be pulled
    /// back as far as `start_limit`. Returns `(length, match position,
    /// start position)` only when a strictly longer match is found.
    fn wider_match(
        &mut self,
        pos: usize,
        start_limit: usize,
        longest: usize,
    ) -> Option<(usize, usize, usize)> {
        let src = self.src;
        let min_ref = pos.saturating_sub(MAX_DISTANCE);
        let delta = pos - start_limit;
        let mut attempts = MAX_ATTEMPTS;
        let mut longest = longest;
        let mut best = None;

        self.insert(pos);
        let mut candidate = Some(self.head[hash(src, pos)] as usize);

        while let Some(cur) = candidate {
            if cur < min_ref || attempts == 0 {
                break;
            }
            attempts -= 1;
            if cur < pos
                && src[start_limit + longest] == src[cur + longest - delta]
                && equal4(src, cur, pos)
            {
                let end =
                    pos + MINMATCH + common_length(src, pos + MINMATCH, cur + MINMATCH, self.match_limit);

                let mut start = pos;
                let mut match_start = cur;
                while start > start_limit && match_start > 0 && src[start - 1] == src[match_start - 1]
                {
                    start -= 1;
                    match_start -= 1;
                }

                if end - start > longest {
                    longest = end - start;
                    best = Some((longest, match_start, start));
                }
            }
            candidate = self.chain_back(cur);
        }

        best
    }
}
