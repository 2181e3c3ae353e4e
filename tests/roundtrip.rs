use std::fs;
use std::io::Cursor;

use proptest::prelude::*;
use tempfile::{tempdir, NamedTempFile};

use huffzip::{codec, BitChannel, HuffError, Mode};

fn compress_to_vec(data: &[u8]) -> Vec<u8> {
    let dst = NamedTempFile::new().unwrap();
    let channel = BitChannel::open(dst.path(), Mode::Write).unwrap();
    codec::compress(Cursor::new(data.to_vec()), channel).unwrap();
    fs::read(dst.path()).unwrap()
}

fn decompress_vec(compressed: Vec<u8>) -> Result<Vec<u8>, HuffError> {
    let mut out = Vec::new();
    codec::decompress(BitChannel::from_reader(Cursor::new(compressed)), &mut out)?;
    Ok(out)
}

#[test]
fn test_file_roundtrip() {
    let dir = tempdir().unwrap();
    let original_path = dir.path().join("original.txt");
    let compressed_path = dir.path().join("original.hz");
    let restored_path = dir.path().join("restored.txt");

    let original: Vec<u8> = b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(20_000)
        .collect();
    fs::write(&original_path, &original).unwrap();

    let packed = codec::compress_file(&original_path, &compressed_path).unwrap();
    assert_eq!(packed.symbols, original.len() as u64);
    assert_eq!(fs::metadata(&compressed_path).unwrap().len(), packed.compressed_bytes);
    assert!(packed.compressed_bytes < original.len() as u64);

    let unpacked = codec::decompress_file(&compressed_path, &restored_path).unwrap();
    assert_eq!(unpacked.symbols, packed.symbols);
    assert_eq!(unpacked.tree_bits, packed.tree_bits);
    assert_eq!(unpacked.compressed_bytes, packed.compressed_bytes);
    assert_eq!(fs::read(&restored_path).unwrap(), original);
}

#[test]
fn test_empty_file_roundtrip() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("empty");
    let packed_path = dir.path().join("empty.hz");
    let out = dir.path().join("empty.out");
    fs::write(&src, b"").unwrap();

    codec::compress_file(&src, &packed_path).unwrap();
    codec::decompress_file(&packed_path, &out).unwrap();
    assert!(fs::read(&out).unwrap().is_empty());
}

#[test]
fn test_length_header_position() {
    let compressed = compress_to_vec(b"mississippi");
    // 4 leaves, 3 internal nodes: 7 + 32 = 39 tree bits -> 5 bytes
    assert_eq!(&compressed[5..9], &[0, 0, 0, 11]);
}

#[test]
fn test_missing_input_is_open_failure() {
    let dir = tempdir().unwrap();
    let result = codec::compress_file(dir.path().join("nope"), dir.path().join("nope.hz"));
    assert!(matches!(result, Err(HuffError::Open { .. })));

    let result = codec::decompress_file(dir.path().join("nope.hz"), dir.path().join("nope.out"));
    assert!(matches!(result, Err(HuffError::Open { .. })));
}

#[test]
fn test_every_truncation_is_detected() {
    let original = b"she sells sea shells by the sea shore".to_vec();
    let compressed = compress_to_vec(&original);
    for cut in 0..compressed.len() {
        match decompress_vec(compressed[..cut].to_vec()) {
            Err(HuffError::TruncatedStream { .. }) | Err(HuffError::MalformedTree { .. }) => {}
            other => panic!("cut at {} gave {:?}", cut, other),
        }
    }
    assert_eq!(decompress_vec(compressed).unwrap(), original);
}

proptest! {
    #[test]
    fn test_roundtrip_property(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        let compressed = compress_to_vec(&data);
        prop_assert_eq!(decompress_vec(compressed).unwrap(), data);
    }

    #[test]
    fn test_skewed_roundtrip_property(
        symbol in any::<u8>(),
        repeats in 1usize..500,
        noise in prop::collection::vec(0u8..4, 0..50)
    ) {
        let mut data = vec![symbol; repeats];
        data.extend_from_slice(&noise);
        let compressed = compress_to_vec(&data);
        prop_assert_eq!(decompress_vec(compressed).unwrap(), data);
    }

    #[test]
    fn test_bit_count_property(bits in prop::collection::vec(any::<bool>(), 0..300)) {
        let dst = NamedTempFile::new().unwrap();
        let mut channel = BitChannel::open(dst.path(), Mode::Write).unwrap();
        for &bit in &bits {
            channel.write_bit(bit).unwrap();
        }
        let expected = ((bits.len() + 7) / 8) as u64;
        prop_assert_eq!(channel.close().unwrap(), expected);

        let mut reader = BitChannel::open(dst.path(), Mode::Read).unwrap();
        for &bit in &bits {
            prop_assert_eq!(reader.read_bit().unwrap(), Some(bit));
        }
        prop_assert_eq!(reader.bytes_transferred(), expected);
    }
}
