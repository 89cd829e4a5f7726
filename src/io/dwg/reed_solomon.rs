//! Reed-Solomon byte de-interleaving for AC1021 (R2007) files.
//!
//! The "Reed-Solomon" coding in DWG is byte interleaving without error
//! correction: encoded data distributes bytes across `factor` tracks of
//! 255 bytes, of which `block_size` carry data.

/// De-interleave a Reed-Solomon encoded byte array.
///
/// For the AC1021 file header: `factor = 3`, `block_size = 239`.
/// For section pages: `factor` from [`page_buffer_params`],
/// `block_size = 251`.
pub fn decode(encoded: &[u8], output_size: usize, factor: usize, block_size: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; output_size];
    let mut index = 0usize;
    let mut remaining = output_size;

    for track in 0..factor {
        let mut cindex = track;
        if track < encoded.len() {
            let size = remaining.min(block_size);
            remaining -= size;
            let stop = index + size;
            while index < stop {
                if cindex < encoded.len() {
                    buffer[index] = encoded[cindex];
                }
                index += 1;
                cindex += factor;
            }
        }
    }

    buffer
}

/// Compute the interleave factor and file read size for a section page.
///
/// `(compressed_size + 7) & !7`, scaled by the correction factor from the
/// header metadata, spread over `block_size`-byte tracks of 255 raw bytes.
pub fn page_buffer_params(
    compressed_size: u64,
    correction_factor: u64,
    block_size: usize,
) -> (usize, usize) {
    let aligned = (compressed_size + 7) & !7u64;
    let total_size = (aligned * correction_factor) as usize;
    let factor = total_size.div_ceil(block_size);
    let read_size = factor * 255;
    (factor, read_size)
}
