use crate::FourCC;

/// Builds a minimal `DXBC` container holding the provided chunks.
///
/// The result has a valid header, a correct chunk offset table, and a correct
/// `total_size`. The checksum field is left zeroed; parsing does not validate
/// it, and tests only need a structurally valid container.
pub fn build_container(chunks: &[(FourCC, &[u8])]) -> Vec<u8> {
    // Layout:
    //   magic (4) + checksum (16) + reserved (4) + total_size (4) +
    //   chunk_count (4) + chunk offsets (4 each) +
    //   per chunk: fourcc (4) + size (4) + payload
    let mut out = Vec::new();
    out.extend_from_slice(&FourCC::DXBC.0);
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&1u32.to_le_bytes()); // reserved
    out.extend_from_slice(&0u32.to_le_bytes()); // total_size, patched below

    let chunk_count = u32::try_from(chunks.len()).expect("chunk count does not fit in u32");
    out.extend_from_slice(&chunk_count.to_le_bytes());

    let offset_table_pos = out.len();
    out.resize(out.len() + 4 * chunks.len(), 0);

    for (index, (fourcc, data)) in chunks.iter().enumerate() {
        let offset = u32::try_from(out.len()).expect("chunk offset does not fit in u32");
        let pos = offset_table_pos + index * 4;
        out[pos..pos + 4].copy_from_slice(&offset.to_le_bytes());

        let size = u32::try_from(data.len()).expect("chunk size does not fit in u32");
        out.extend_from_slice(&fourcc.0);
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(data);
    }

    let total_size = u32::try_from(out.len()).expect("total size does not fit in u32");
    out[24..28].copy_from_slice(&total_size.to_le_bytes());

    out
}
