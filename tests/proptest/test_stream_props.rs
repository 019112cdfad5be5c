//! Property-based tests for stream buffering and the input-request protocol

use ckernel::config::DEFAULT_SENTINEL;
use ckernel::supervisor::{SentinelScanner, StreamBuffer, Utf8Decoder};
use proptest::prelude::*;

/// Split `bytes` at the given (unsorted, possibly out of range) points
fn split_at_points(bytes: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = points
        .iter()
        .map(|p| if bytes.is_empty() { 0 } else { p % (bytes.len() + 1) })
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

proptest! {
    #[test]
    fn test_drain_all_twice_returns_empty(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..20),
    ) {
        let (tx, mut buffer) = StreamBuffer::channel();
        for chunk in &chunks {
            tx.send(chunk.clone()).unwrap();
        }

        let first = buffer.drain_all();
        prop_assert_eq!(first, chunks.concat());
        prop_assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn test_scanner_reconstructs_output_without_sentinels(
        segments in prop::collection::vec("[a-z <>]{0,20}", 1..8),
        points in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let stream = segments.join(DEFAULT_SENTINEL);
        let sentinels = segments.len() - 1;
        let expected = segments.concat();

        let mut scanner = SentinelScanner::new(DEFAULT_SENTINEL);
        let mut output = Vec::new();
        let mut requests = 0;

        // One step per drained chunk, as the supervisor does per cycle
        for chunk in split_at_points(stream.as_bytes(), &points) {
            scanner.push(&chunk);
            let step = scanner.step();
            output.extend_from_slice(&step.output);
            if step.input_requested {
                requests += 1;
            }
        }
        let (rest, stripped) = scanner.finish();
        output.extend_from_slice(&rest);

        prop_assert_eq!(String::from_utf8(output.clone()).unwrap(), expected);
        prop_assert_eq!(requests + stripped, sentinels);
        prop_assert!(!String::from_utf8(output).unwrap().contains(DEFAULT_SENTINEL));
    }

    #[test]
    fn test_scanner_never_releases_a_sentinel_prefix_early(
        text in "[a-z]{0,20}",
        cut in 1usize..14,
    ) {
        let prefix = &DEFAULT_SENTINEL[..cut];
        let mut scanner = SentinelScanner::new(DEFAULT_SENTINEL);

        scanner.push(format!("{}{}", text, prefix).as_bytes());
        let step = scanner.step();
        prop_assert_eq!(step.output, text.as_bytes().to_vec());
        prop_assert!(!step.input_requested);

        scanner.push(DEFAULT_SENTINEL[cut..].as_bytes());
        let step = scanner.step();
        prop_assert!(step.output.is_empty());
        prop_assert!(step.input_requested);
    }

    #[test]
    fn test_decoder_preserves_text_across_splits(
        text in "\\PC{0,80}",
        points in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let mut decoder = Utf8Decoder::new();
        let mut decoded = String::new();
        for chunk in split_at_points(text.as_bytes(), &points) {
            decoded.push_str(&decoder.decode(&chunk));
        }
        decoded.push_str(&decoder.finish());

        prop_assert_eq!(decoded, text);
    }

    #[test]
    fn test_decoder_handles_any_bytes(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
        let mut decoder = Utf8Decoder::new();
        let mut decoded = decoder.decode(&bytes);
        decoded.push_str(&decoder.finish());

        prop_assert_eq!(decoded, String::from_utf8_lossy(&bytes).into_owned());
    }
}
