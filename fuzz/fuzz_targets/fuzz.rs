#![no_main]

use libfuzzer_sys::fuzz_target;
use lz4_block::{compress_hc_to_vec, compress_to_vec, decompress};

/// Hands the raw fuzzer input to the decoder as if it were a compressed
/// block. Any `Ok`/`Err` outcome is fine; what must never happen is a panic
/// or an out-of-bounds access. Several destination sizes are tried so both
/// the terminating-run acceptance and the mid-stream margin checks see the
/// noise.
fn decode_noise(data: &[u8]) {
    for dst_len in [0, data.len(), data.len() * 4 + 8] {
        let mut output = vec![0u8; dst_len];
        let _ = decompress(data, &mut output);
    }
}

/// Treats the fuzzer input as plaintext: the stream an encoder produces for
/// it must decode back to the exact bytes with nothing left unconsumed.
/// Either assertion failing means an encoder emitted a stream the decoder
/// cannot replay, which is a reportable bug for any input whatsoever.
fn cycle(data: &[u8], compressed: Vec<u8>) {
    let mut restored = vec![0u8; data.len()];
    match decompress(&compressed, &mut restored) {
        Ok(consumed) => {
            assert_eq!(restored, data, "codec cycle altered the payload");
            assert_eq!(consumed, compressed.len(), "stream not fully consumed");
        }
        Err(e) => panic!(
            "decoder rejected encoder output: {e:?} (input {} bytes, stream {} bytes)",
            data.len(),
            compressed.len()
        ),
    }
}

fuzz_target!(|data: &[u8]| {
    decode_noise(data);
    cycle(data, compress_to_vec(data));
    cycle(data, compress_hc_to_vec(data));
});
