//! LZF wrapper for node payloads. Compression is best-effort: a payload
//! that is too small or barely shrinks stays raw.

/// Payloads smaller than this are never worth compressing.
const MIN_COMPRESS_BYTES: usize = 48;
/// Minimum byte saving for a compressed payload to be kept.
const MIN_COMPRESS_IMPROVE: usize = 8;

/// Try to compress `raw`. `None` means "not beneficial": caller keeps the
/// raw payload.
pub(crate) fn compress(raw: &[u8]) -> Option<Vec<u8>> {
    if raw.len() < MIN_COMPRESS_BYTES {
        return None;
    }
    match lzf::compress(raw) {
        Ok(out) if out.len() + MIN_COMPRESS_IMPROVE <= raw.len() => Some(out),
        _ => None,
    }
}

/// Decompress a payload produced by [`compress`]. `raw_len` is the known
/// uncompressed size.
///
/// # Panics
///
/// Panics on corrupt input: a node payload that no longer decompresses
/// means an internal invariant was broken, which is fatal by contract.
pub(crate) fn decompress(data: &[u8], raw_len: usize) -> Vec<u8> {
    match lzf::decompress(data, raw_len) {
        Ok(out) => out,
        Err(e) => panic!("corrupt compressed node payload: {e:?}"),
    }
}
