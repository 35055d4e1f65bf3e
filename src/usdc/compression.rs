//! LZ4 block compression for Crate payloads.
//!
//! Each frame is `[original_size: u64 LE][compressed_size: u64 LE]` followed
//! by the LZ4 block. A frame whose compressed size equals its original size
//! carries the bytes raw. Multi-block payloads are consecutive frames.

use lz4_flex::block::{compress, decompress};

use crate::util::{Error, Result};

/// Size of the per-frame header.
pub const FRAME_HEADER_SIZE: usize = 16;

/// Compress `data` into a bare LZ4 block with no frame header. The caller
/// records the original and compressed sizes (the TOKENS section header
/// does this itself).
pub fn compress_block(data: &[u8]) -> Vec<u8> {
    compress(data)
}

/// Decompress a bare LZ4 block of known original size.
pub fn decompress_block(data: &[u8], original_size: usize) -> Result<Vec<u8>> {
    let out = decompress(data, original_size)
        .map_err(|e| Error::structural("LZ4", 0, format!("block decode failed: {e}")))?;
    if out.len() != original_size {
        return Err(Error::structural(
            "LZ4",
            0,
            format!("declared size {original_size} but decoded {} bytes", out.len()),
        ));
    }
    Ok(out)
}

/// Compress `data` into one frame. Falls back to a raw frame when LZ4
/// does not save space.
pub fn compress_frame(data: &[u8]) -> Vec<u8> {
    let compressed = compress(data);
    let (payload, compressed_size) = if compressed.len() >= data.len() {
        (data, data.len() as u64)
    } else {
        (compressed.as_slice(), compressed.len() as u64)
    };

    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(&compressed_size.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Decompress one frame from the start of `data`, enforcing `max_size` on
/// the declared original size before allocating. Returns the decompressed
/// bytes and the total number of input bytes consumed.
pub fn decompress_frame(data: &[u8], max_size: u64) -> Result<(Vec<u8>, usize)> {
    if data.len() < FRAME_HEADER_SIZE {
        return Err(Error::structural(
            "LZ4",
            0,
            "frame header truncated",
        ));
    }
    let original_size = u64::from_le_bytes(data[0..8].try_into().expect("fixed slice"));
    let compressed_size = u64::from_le_bytes(data[8..16].try_into().expect("fixed slice"));

    if original_size > max_size {
        return Err(Error::bounds(
            "LZ4",
            format!("declared size {original_size} exceeds cap {max_size}"),
        ));
    }
    let avail = (data.len() - FRAME_HEADER_SIZE) as u64;
    if compressed_size > avail {
        return Err(Error::structural(
            "LZ4",
            8,
            format!("compressed size {compressed_size} exceeds remaining {avail} bytes"),
        ));
    }

    let payload = &data[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + compressed_size as usize];
    let consumed = FRAME_HEADER_SIZE + compressed_size as usize;

    if compressed_size == original_size {
        return Ok((payload.to_vec(), consumed));
    }

    let out = decompress(payload, original_size as usize)
        .map_err(|e| Error::structural("LZ4", 16, format!("block decode failed: {e}")))?;
    if out.len() as u64 != original_size {
        return Err(Error::structural(
            "LZ4",
            0,
            format!(
                "declared size {original_size} but decoded {} bytes",
                out.len()
            ),
        ));
    }
    Ok((out, consumed))
}

/// Decompress consecutive frames until `expected_size` bytes have been
/// produced. Errors if the input runs dry or overshoots.
pub fn decompress_stream(mut data: &[u8], expected_size: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    while (out.len() as u64) < expected_size {
        let remaining = expected_size - out.len() as u64;
        let (block, consumed) = decompress_frame(data, remaining)?;
        if block.is_empty() {
            return Err(Error::structural("LZ4", 0, "empty frame in stream"));
        }
        out.extend_from_slice(&block);
        data = &data[consumed..];
    }
    if out.len() as u64 != expected_size {
        return Err(Error::structural(
            "LZ4",
            0,
            format!("stream produced {} bytes, expected {expected_size}", out.len()),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let original = b"the quick brown fox jumps over the lazy dog ".repeat(64);
        let frame = compress_frame(&original);
        assert!(frame.len() < original.len() + FRAME_HEADER_SIZE);

        let (out, consumed) = decompress_frame(&frame, original.len() as u64).unwrap();
        assert_eq!(out, original);
        assert_eq!(consumed, frame.len());
    }

    #[test]
    fn test_incompressible_stays_raw() {
        let original: Vec<u8> = (0u16..256).map(|i| (i * 7 % 251) as u8).collect();
        let frame = compress_frame(&original);
        let compressed_size = u64::from_le_bytes(frame[8..16].try_into().unwrap());
        assert_eq!(compressed_size, original.len() as u64);

        let (out, _) = decompress_frame(&frame, 1 << 20).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_cap_enforced_before_decode() {
        let original = vec![7u8; 1024];
        let frame = compress_frame(&original);
        assert!(matches!(
            decompress_frame(&frame, 16),
            Err(Error::Bounds { .. })
        ));
    }

    #[test]
    fn test_truncated_frame() {
        let original = vec![1u8; 64];
        let mut frame = compress_frame(&original);
        frame.truncate(frame.len() - 4);
        assert!(decompress_frame(&frame, 1 << 20).is_err());
    }

    #[test]
    fn test_multi_frame_stream() {
        let a = vec![1u8; 100];
        let b = vec![2u8; 50];
        let mut stream = compress_frame(&a);
        stream.extend_from_slice(&compress_frame(&b));

        let out = decompress_stream(&stream, 150).unwrap();
        assert_eq!(&out[..100], &a[..]);
        assert_eq!(&out[100..], &b[..]);
    }
}
