use lz4_block::{compress_hc_to_vec, compress_to_vec, decompress, max_output_length};
use proptest::prelude::*;

proptest! {
    /// Fast compression followed by decompression restores the input.
    #[test]
    fn prop_fast_round_trip(input in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let compressed = compress_to_vec(&input);
        prop_assert!(compressed.len() <= max_output_length(input.len()));

        let mut output = vec![0u8; input.len()];
        let consumed = decompress(&compressed, &mut output);
        prop_assert_eq!(consumed, Ok(compressed.len()));
        prop_assert_eq!(output, input);
    }

    /// Same for the high-compression encoder.
    #[test]
    fn prop_hc_round_trip(input in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let compressed = compress_hc_to_vec(&input);
        prop_assert!(compressed.len() <= max_output_length(input.len()));

        let mut output = vec![0u8; input.len()];
        let consumed = decompress(&compressed, &mut output);
        prop_assert_eq!(consumed, Ok(compressed.len()));
        prop_assert_eq!(output, input);
    }

    /// Low-entropy inputs (few distinct values, so matches are common) stress
    /// the lazy lookahead and still round-trip through both encoders.
    #[test]
    fn prop_low_entropy_round_trip(input in proptest::collection::vec(0u8..4, 0..2048)) {
        let fast = compress_to_vec(&input);
        let hc = compress_hc_to_vec(&input);

        let mut output = vec![0u8; input.len()];
        prop_assert_eq!(decompress(&fast, &mut output), Ok(fast.len()));
        prop_assert_eq!(&output, &input);

        output.fill(0);
        prop_assert_eq!(decompress(&hc, &mut output), Ok(hc.len()));
        prop_assert_eq!(&output, &input);
    }

    /// The decoder rejects or accepts arbitrary bytes without panicking, for
    /// any destination size.
    #[test]
    fn prop_decoder_total(
        stream in proptest::collection::vec(any::<u8>(), 0..512),
        dst_len in 0usize..1024,
    ) {
        let mut output = vec![0u8; dst_len];
        match decompress(&stream, &mut output) {
            Ok(consumed) => prop_assert!(consumed <= stream.len()),
            Err(e) => prop_assert!(e.consumed() <= stream.len()),
        }
    }
}
