//! The abstract container, allocator, and time-sampling-source collaborators
//! the decoder is built against. §6 of the format description treats these
//! as out-of-scope external interfaces; this module gives them concrete
//! Rust shape so the rest of the crate is compilable and testable without
//! a real archive backing it.

use crate::dimensions::Dimensions;
use crate::error::{Error, Result};
use crate::pod::DataType;
use crate::time_sampling::TimeSampling;

/// A random-access blob of bytes, read through a thread-id slot the
/// underlying container uses to pick an independent reader.
pub trait Data {
    fn size(&self) -> u64;

    /// Reads `nbytes` bytes starting at `offset` into `dst[..nbytes]`.
    /// `nbytes` is carried explicitly (rather than inferred from
    /// `dst.len()`) to mirror the container's own `read(nbytes, dst,
    /// offset, threadId)` signature, which lets a caller pass a buffer
    /// larger than the slice it's filling.
    fn read(&self, nbytes: u64, dst: &mut [u8], offset: u64, thread_id: usize) -> Result<()>;
}

/// A named collection of [`Data`] blobs, indexed positionally.
pub trait Group {
    type Data: Data;

    fn get_data(&self, index: usize, thread_id: usize) -> Result<Self::Data>;
}

/// Yields a mutable, appropriately sized buffer for an array sample, given
/// its element type and shape.
pub trait SampleAllocator {
    type Sample: AsMut<[u8]> + AsRef<[u8]>;

    fn allocate_array_sample(&self, data_type: DataType, dims: &Dimensions) -> Result<Self::Sample>;
}

/// The archive-level table of time samplings, keyed by index (index 0 is
/// always the canonical default sampling).
pub trait TimeSamplingSource {
    fn get_time_sampling(&self, index: usize) -> Option<TimeSampling>;
}

/// A plain in-memory blob, usable as [`Data`] directly. This is the
/// adapter tests use in place of a real container, and is a reasonable
/// choice for callers that have already materialized a whole archive
/// section in memory.
impl Data for &[u8] {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read(&self, nbytes: u64, dst: &mut [u8], offset: u64, _thread_id: usize) -> Result<()> {
        let offset = offset as usize;
        let n = nbytes as usize;
        if n > dst.len() {
            return Err(Error::assertion(format!(
                "read of {n} bytes doesn't fit in a {}-byte destination",
                dst.len()
            )));
        }
        if offset + n > self.len() {
            return Err(Error::decode(format!(
                "read of {n} bytes at offset {offset} exceeds blob of size {}",
                self.len()
            )));
        }
        dst[..n].copy_from_slice(&self[offset..offset + n]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_data_reads_in_bounds_range() {
        let blob: &[u8] = &[1, 2, 3, 4, 5];
        let mut dst = [0u8; 3];
        blob.read(3, &mut dst, 1, 0).unwrap();
        assert_eq!(dst, [2, 3, 4]);
    }

    #[test]
    fn slice_data_rejects_out_of_bounds_read() {
        let blob: &[u8] = &[1, 2, 3];
        let mut dst = [0u8; 2];
        assert!(blob.read(2, &mut dst, 2, 0).is_err());
    }

    #[test]
    fn slice_data_rejects_nbytes_larger_than_destination() {
        let blob: &[u8] = &[1, 2, 3, 4];
        let mut dst = [0u8; 2];
        assert!(blob.read(4, &mut dst, 0, 0).is_err());
    }
}
