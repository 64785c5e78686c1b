//! C2: dimension decoder.
//!
//! Reconstructs the shape of a sample from a (possibly empty) dimensions
//! blob plus the size of the accompanying data blob. Two variants exist,
//! selected by the caller based on format version: [`read_dimensions`]
//! (legacy, 16-byte key prefix) and [`read_tdr_dimensions`] (tagged,
//! 8-byte `originDataSize` prefix used once payloads can be compressed).

use crate::error::Result;
use crate::reader::Reader;

/// An ordered shape: `numPoints` is the product of `dims`, or 0 for an
/// empty shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub dims: Vec<u64>,
}

impl Dimensions {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn num_points(&self) -> u64 {
        if self.dims.is_empty() {
            // The degenerate rank-0 shape has 0 points, not the empty
            // product's 1 — `Dimensions::empty()` is a real "no data"
            // shape (e.g. a data blob too small to carry a key/tag), and
            // callers use this to size a zero-length sample.
            return 0;
        }
        self.dims.iter().product()
    }

    fn rank1(num_items: u64) -> Self {
        Dimensions { dims: vec![num_items] }
    }

    fn empty() -> Self {
        Dimensions { dims: Vec::new() }
    }
}

fn inferred_num_items(payload_bytes: u64, type_bytes: u64) -> u64 {
    if type_bytes == 0 {
        return payload_bytes;
    }
    // "bump by one on non-exact division" — ceil-div so a partially
    // truncated payload still gets a large-enough inferred shape.
    (payload_bytes + type_bytes - 1) / type_bytes
}

fn read_dims_blob(dims_blob: &[u8]) -> Result<Vec<u64>> {
    let mut reader = Reader::new(dims_blob);
    let mut dims = Vec::with_capacity(dims_blob.len() / 8);
    while !reader.at_end() {
        dims.push(reader.read_u64()?);
    }
    Ok(dims)
}

/// Legacy variant (`ReadDimensions`). The data blob begins with a 16-byte
/// opaque key; `payload = dataSize - 16`.
pub fn read_dimensions(dims_blob: &[u8], data_size: u64, type_bytes: u64, is_string_like: bool) -> Result<Dimensions> {
    const KEY_SIZE: u64 = 16;
    if data_size < KEY_SIZE {
        return Ok(Dimensions::empty());
    }
    let payload = data_size - KEY_SIZE;

    if dims_blob.is_empty() {
        return Ok(Dimensions::rank1(inferred_num_items(payload, type_bytes)));
    }

    let dims = read_dims_blob(dims_blob)?;
    let num_points: u64 = dims.iter().product();
    if !is_string_like && num_points.saturating_mul(type_bytes) > payload {
        log::warn!(
            "declared dimensions ({num_points} points) exceed payload ({payload} bytes); \
             re-deriving shape from payload size"
        );
        return Ok(Dimensions::rank1(inferred_num_items(payload, type_bytes)));
    }
    Ok(Dimensions { dims })
}

/// Tagged/TDR variant (`ReadTDRDimensions`). The data blob begins with an
/// 8-byte little-endian `originDataSize`, the uncompressed payload size —
/// needed because the payload itself may be compressed.
pub fn read_tdr_dimensions(
    dims_blob: &[u8],
    data_size: u64,
    origin_data_size: u64,
    type_bytes: u64,
    is_string_like: bool,
) -> Result<Dimensions> {
    const TAG_SIZE: u64 = 8;
    if data_size < TAG_SIZE {
        return Ok(Dimensions::empty());
    }

    if dims_blob.is_empty() {
        return Ok(Dimensions::rank1(inferred_num_items(
            origin_data_size,
            type_bytes,
        )));
    }

    let dims = read_dims_blob(dims_blob)?;
    let num_points: u64 = dims.iter().product();
    if !is_string_like && num_points.saturating_mul(type_bytes) > origin_data_size {
        log::warn!(
            "declared dimensions ({num_points} points) exceed origin data size \
             ({origin_data_size} bytes); re-deriving shape from origin data size"
        );
        return Ok(Dimensions::rank1(inferred_num_items(
            origin_data_size,
            type_bytes,
        )));
    }
    Ok(Dimensions { dims })
}
