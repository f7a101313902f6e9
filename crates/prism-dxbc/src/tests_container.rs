use crate::test_utils::build_container;
use crate::{DxbcContainer, DxbcError, FourCC};

#[test]
fn parse_rejects_short_buffer() {
    let err = DxbcContainer::parse(b"DXBC").unwrap_err();
    assert!(matches!(err, DxbcError::MalformedHeader(_)), "{err:?}");
}

#[test]
fn parse_rejects_bad_magic() {
    let mut bytes = build_container(&[]);
    bytes[..4].copy_from_slice(b"NOPE");
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(matches!(err, DxbcError::MalformedHeader(_)), "{err:?}");
}

#[test]
fn parse_rejects_total_size_beyond_buffer() {
    let mut bytes = build_container(&[]);
    let len = bytes.len() as u32;
    bytes[24..28].copy_from_slice(&(len + 1).to_le_bytes());
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(matches!(err, DxbcError::OutOfBounds(_)), "{err:?}");
}

#[test]
fn parse_rejects_total_size_smaller_than_header() {
    let mut bytes = build_container(&[]);
    bytes[24..28].copy_from_slice(&4u32.to_le_bytes());
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(matches!(err, DxbcError::MalformedHeader(_)), "{err:?}");
}

#[test]
fn parse_rejects_excessive_chunk_count() {
    let mut bytes = build_container(&[]);
    bytes[28..32].copy_from_slice(&u32::MAX.to_le_bytes());
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(matches!(err, DxbcError::MalformedOffsets(_)), "{err:?}");
}

#[test]
fn parse_rejects_chunk_offset_outside_container() {
    let payload = [0u8; 8];
    let mut bytes = build_container(&[(FourCC(*b"ABCD"), &payload)]);
    // Point the single chunk offset past the end of the container.
    let len = bytes.len() as u32;
    bytes[32..36].copy_from_slice(&len.to_le_bytes());
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(matches!(err, DxbcError::OutOfBounds(_)), "{err:?}");
}

#[test]
fn parse_rejects_chunk_offset_into_offset_table() {
    let payload = [0u8; 8];
    let mut bytes = build_container(&[(FourCC(*b"ABCD"), &payload)]);
    bytes[32..36].copy_from_slice(&8u32.to_le_bytes());
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(matches!(err, DxbcError::MalformedOffsets(_)), "{err:?}");
}

#[test]
fn parse_rejects_chunk_size_overrunning_container() {
    let payload = [0u8; 8];
    let mut bytes = build_container(&[(FourCC(*b"ABCD"), &payload)]);
    // Inflate the declared chunk size; the offset table points at byte 36.
    let chunk_header = bytes.len() - payload.len() - 8;
    bytes[chunk_header + 4..chunk_header + 8].copy_from_slice(&u32::MAX.to_le_bytes());
    let err = DxbcContainer::parse(&bytes).unwrap_err();
    assert!(
        matches!(err, DxbcError::OutOfBounds(_) | DxbcError::MalformedOffsets(_)),
        "{err:?}"
    );
}

#[test]
fn chunks_iterates_in_file_order() {
    let a = [1u8, 2, 3];
    let b = [4u8, 5];
    let bytes = build_container(&[(FourCC(*b"AAAA"), &a), (FourCC(*b"BBBB"), &b)]);
    let container = DxbcContainer::parse(&bytes).unwrap();

    let chunks: Vec<_> = container.chunks().collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].fourcc, FourCC(*b"AAAA"));
    assert_eq!(chunks[0].data, &a);
    assert_eq!(chunks[1].fourcc, FourCC(*b"BBBB"));
    assert_eq!(chunks[1].data, &b);
}

#[test]
fn get_chunk_returns_first_match() {
    let first = [1u8];
    let second = [2u8];
    let bytes = build_container(&[(FourCC(*b"SAME"), &first), (FourCC(*b"SAME"), &second)]);
    let container = DxbcContainer::parse(&bytes).unwrap();

    let chunk = container.get_chunk(FourCC(*b"SAME")).unwrap();
    assert_eq!(chunk.data, &first);
}

#[test]
fn get_signature_accepts_alternate_spelling() {
    // Empty signature payload: zero params, table offset at header end.
    let mut payload = Vec::new();
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&8u32.to_le_bytes());

    let bytes = build_container(&[(FourCC::ISG1, &payload)]);
    let container = DxbcContainer::parse(&bytes).unwrap();

    let sig = container
        .get_signature(FourCC::ISGN)
        .expect("ISG1 should satisfy an ISGN lookup")
        .expect("empty signature should parse");
    assert!(sig.entries.is_empty());
}

#[test]
fn get_rdef_prefers_first_well_formed_chunk() {
    let bad = [0u8; 4]; // truncated header

    let mut good = Vec::new();
    for value in [0u32, 0, 0, 0, 0, 0, 0] {
        good.extend_from_slice(&value.to_le_bytes());
    }

    let bytes = build_container(&[(FourCC::RDEF, &bad), (FourCC::RDEF, &good)]);
    let container = DxbcContainer::parse(&bytes).unwrap();

    let rdef = container
        .get_rdef()
        .expect("expected a resource definition chunk")
        .expect("well-formed duplicate should win");
    assert!(rdef.constant_buffers.is_empty());
    assert!(rdef.bound_resources.is_empty());
}

#[test]
fn get_rdef_falls_back_to_rd11() {
    let mut payload = Vec::new();
    for value in [0u32, 0, 0, 0, 0, 0, 0] {
        payload.extend_from_slice(&value.to_le_bytes());
    }

    let bytes = build_container(&[(FourCC::RD11, &payload)]);
    let container = DxbcContainer::parse(&bytes).unwrap();

    assert!(container
        .get_rdef()
        .expect("RD11 should satisfy an RDEF lookup")
        .is_ok());
}

#[test]
fn get_rdef_returns_none_when_absent() {
    let bytes = build_container(&[]);
    let container = DxbcContainer::parse(&bytes).unwrap();
    assert!(container.get_rdef().is_none());
}
