//! C3: array/scalar payload reader.
//!
//! Reads the data blob for a sample, decompressing it first when it's an
//! array payload, and funnels the result through the C1 conversion
//! kernel when the requested type differs from the stored type. Strings
//! and wstrings are handled entirely here rather than in C1, since their
//! payload has no fixed per-element width.

use crate::container::{Data, SampleAllocator};
use crate::dimensions::{read_tdr_dimensions, Dimensions};
use crate::error::{Error, Result};
use crate::pod::{convert, DataType, Pod};
use crate::reader::Reader;

/// Hard ceiling on a declared `decompressedDataSize`, independent of the
/// compressed payload size. Recommended improvement over the source,
/// which allocates the declared size unconditionally.
const MAX_DECOMPRESSED_ABSOLUTE: u64 = 1 << 30;
/// A declared decompressed size beyond this multiple of the compressed
/// size is treated as implausible rather than trusted outright.
const MAX_DECOMPRESSION_RATIO: u64 = 1024;
/// Floor under the ratio cap so very small compressed blobs aren't
/// rejected just for looking like an extreme ratio.
const MIN_RATIO_CAP: u64 = 4096;

/// The decoded contents of a sample's payload: a flat numeric/bool byte
/// buffer, or one string/wstring per point.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    Bytes(Vec<u8>),
    Strings(Vec<String>),
    WStrings(Vec<Vec<u32>>),
}

/// Scalar, uncompressed payload read (`ReadData`).
///
/// `data_size` must be the *stored* byte count (the narrower of the
/// stored/requested type when widening), not a destination-buffer size —
/// see the module-level open question in `DESIGN.md`. `num_slots` is the
/// number of points (string/wstring slots, or elements-per-point group
/// boundaries are irrelevant here since C1 works over a flat buffer).
pub fn read_data<D: Data>(
    data: &D,
    data_size: u64,
    thread_id: usize,
    from_pod: Pod,
    to_type: DataType,
    num_slots: usize,
) -> Result<SampleData> {
    guard_string_parity(from_pod, to_type.pod)?;
    if data_size == 0 {
        return Ok(empty_sample(to_type, num_slots));
    }
    let mut raw = vec![0u8; data_size as usize];
    data.read(data_size, &mut raw, 0, thread_id)?;
    finish_from_raw(raw, from_pod, to_type, num_slots)
}

/// Array, zstd-compressed payload read (`ReadArrayData`). The blob is
/// `decompressedSize[u64] || zstd(payload)`.
pub fn read_array_data<D: Data>(
    data: &D,
    data_size: u64,
    thread_id: usize,
    from_pod: Pod,
    to_type: DataType,
    num_slots: usize,
) -> Result<SampleData> {
    guard_string_parity(from_pod, to_type.pod)?;
    if data_size == 0 {
        return Ok(empty_sample(to_type, num_slots));
    }
    if data_size < 8 {
        return Err(Error::decode(
            "array data blob is smaller than the 8-byte decompressed-size header",
        ));
    }

    let mut header = [0u8; 8];
    data.read(8, &mut header, 0, thread_id)?;
    let decompressed_size = u64::from_le_bytes(header);
    let compressed_size = data_size - 8;
    check_decompression_bound(decompressed_size, compressed_size)?;

    let mut compressed = vec![0u8; compressed_size as usize];
    data.read(compressed_size, &mut compressed, 8, thread_id)?;

    let raw = zstd::bulk::decompress(&compressed, decompressed_size as usize)
        .map_err(|e| Error::decode(format!("zstd decompression failed: {e}")))?;
    if raw.len() as u64 != decompressed_size {
        return Err(Error::decode(format!(
            "decompressed {} bytes but header declared {decompressed_size}",
            raw.len()
        )));
    }

    finish_from_raw(raw, from_pod, to_type, num_slots)
}

/// `ReadArraySample`: composes C2's tagged dimension decoder, an
/// allocator-provided sample buffer, and this module's array reader.
/// Only covers numeric/bool PODs — the allocator contract is a flat sized
/// byte buffer, which has no natural meaning for variable-width
/// string/wstring slots. Callers reading a string array property should
/// call [`read_array_data`] directly instead.
pub fn read_array_sample<D: Data, A: SampleAllocator>(
    dims_data: &D,
    array_data: &D,
    thread_id: usize,
    stored_pod: Pod,
    extent: u8,
    allocator: &A,
) -> Result<A::Sample> {
    let data_size = array_data.size();
    let origin_data_size = if data_size >= 8 {
        let mut tag = [0u8; 8];
        array_data.read(8, &mut tag, 0, thread_id)?;
        u64::from_le_bytes(tag)
    } else {
        0
    };

    let dims_size = dims_data.size();
    let mut dims_blob = vec![0u8; dims_size as usize];
    if dims_size > 0 {
        dims_data.read(dims_size, &mut dims_blob, 0, thread_id)?;
    }

    let data_type = DataType::new(stored_pod, extent);
    let dims = read_tdr_dimensions(
        &dims_blob,
        data_size,
        origin_data_size,
        stored_pod.size_bytes() as u64,
        stored_pod.is_string_like(),
    )?;

    let mut sample = allocator.allocate_array_sample(data_type, &dims)?;
    let sample_data = read_array_data(
        array_data,
        data_size,
        thread_id,
        stored_pod,
        data_type,
        dims.num_points() as usize,
    )?;
    match sample_data {
        SampleData::Bytes(bytes) => {
            // Allocated and decompressed lengths may legitimately differ:
            // the round-up-by-one tolerance in C2 can over-count
            // `numPoints`, and an under-declared shape can under-count it.
            // Copy into whichever prefix is shorter and leave the rest, the
            // way the original decompresses straight into the sample
            // buffer rather than requiring equal lengths.
            let dst = sample.as_mut();
            let n = bytes.len().min(dst.len());
            dst[..n].copy_from_slice(&bytes[..n]);
            Ok(sample)
        }
        _ => Err(Error::assertion(
            "read_array_sample only supports numeric/bool PODs; \
             strings and wstrings must be read through read_array_data",
        )),
    }
}

fn guard_string_parity(from_pod: Pod, to_pod: Pod) -> Result<()> {
    if from_pod.is_string_like() != to_pod.is_string_like() {
        return Err(Error::assertion(
            "cannot convert data to or from a string, or wstring",
        ));
    }
    Ok(())
}

fn check_decompression_bound(decompressed_size: u64, compressed_size: u64) -> Result<()> {
    if decompressed_size > MAX_DECOMPRESSED_ABSOLUTE {
        return Err(Error::decode(format!(
            "declared decompressed size {decompressed_size} exceeds the \
             {MAX_DECOMPRESSED_ABSOLUTE}-byte hard cap"
        )));
    }
    let ratio_cap = compressed_size
        .saturating_mul(MAX_DECOMPRESSION_RATIO)
        .max(MIN_RATIO_CAP);
    if decompressed_size > ratio_cap {
        return Err(Error::decode(format!(
            "declared decompressed size {decompressed_size} is implausible for a \
             {compressed_size}-byte compressed payload"
        )));
    }
    Ok(())
}

fn empty_sample(to_type: DataType, num_slots: usize) -> SampleData {
    match to_type.pod {
        Pod::String => SampleData::Strings(vec![String::new(); num_slots]),
        Pod::Wstring => SampleData::WStrings(vec![Vec::new(); num_slots]),
        _ => SampleData::Bytes(vec![0u8; to_type.num_bytes() * num_slots]),
    }
}

fn finish_from_raw(
    raw: Vec<u8>,
    from_pod: Pod,
    to_type: DataType,
    num_slots: usize,
) -> Result<SampleData> {
    match from_pod {
        Pod::String => return Ok(SampleData::Strings(split_strings(&raw, num_slots)?)),
        Pod::Wstring => return Ok(SampleData::WStrings(split_wstrings(&raw, num_slots)?)),
        _ => {}
    }

    if from_pod == to_type.pod {
        return Ok(SampleData::Bytes(raw));
    }

    let from_bytes = from_pod.size_bytes();
    let elem_count = raw.len() / from_bytes;
    let mut dst = vec![0u8; to_type.pod.size_bytes() * elem_count];
    convert(from_pod, to_type.pod, &raw, &mut dst, raw.len())?;
    Ok(SampleData::Bytes(dst))
}

fn split_strings(raw: &[u8], num_slots: usize) -> Result<Vec<String>> {
    let mut slots = Vec::with_capacity(num_slots);
    let mut start = 0usize;
    for (i, &b) in raw.iter().enumerate() {
        if b != 0 {
            continue;
        }
        let s = std::str::from_utf8(&raw[start..i])
            .map_err(|e| Error::decode(format!("string slot is not valid UTF-8: {e}")))?
            .to_string();
        slots.push(s);
        start = i + 1;
        if slots.len() == num_slots {
            break;
        }
    }
    if slots.len() != num_slots {
        return Err(Error::decode(format!(
            "expected {num_slots} NUL-terminated string(s), found {}",
            slots.len()
        )));
    }
    Ok(slots)
}

fn split_wstrings(raw: &[u8], num_slots: usize) -> Result<Vec<Vec<u32>>> {
    let mut reader = Reader::new(raw);
    let mut slots = Vec::with_capacity(num_slots);
    let mut current = Vec::new();
    while !reader.at_end() {
        let cp = reader.read_u32()?;
        if cp == 0 {
            slots.push(std::mem::take(&mut current));
            if slots.len() == num_slots {
                break;
            }
        } else {
            current.push(cp);
        }
    }
    if slots.len() != num_slots {
        return Err(Error::decode(format!(
            "expected {num_slots} zero-terminated wstring slot(s), found {}",
            slots.len()
        )));
    }
    Ok(slots)
}
