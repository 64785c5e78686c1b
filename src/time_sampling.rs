//! C4: time-sampling table parser.
//!
//! Decodes the archive's table of `(maxSample, timePerCycle, times[])`
//! records into typed [`TimeSampling`] descriptors. The buffer is raw
//! little-endian bytes; every field goes through [`Reader`]'s
//! copy-to-local reads rather than a pointer cast.

use crate::error::Result;
use crate::reader::Reader;

/// The sentinel `timePerCycle` value that marks a record as acyclic
/// rather than carrying a real cycle period.
pub const ACYCLIC_SENTINEL: f64 = f64::MAX;

/// Whether a [`TimeSampling`] repeats on a fixed cycle or free-runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSamplingKind {
    Acyclic,
    Cyclic { num_samples_per_cycle: u32, time_per_cycle: f64 },
}

/// A decoded time-sampling record: the `(type, times)` pair the archive
/// stores per time-sampling slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSampling {
    pub kind: TimeSamplingKind,
    pub sample_times: Vec<f64>,
}

/// Parses the whole time-samplings buffer into a vector of descriptors,
/// one per concatenated record. Every record is
/// `u32 maxSample, f64 timePerCycle, u32 numSamples, f64 × numSamples times`.
pub fn read_time_samplings(buf: &[u8]) -> Result<Vec<TimeSampling>> {
    let mut reader = Reader::new(buf);
    let mut out = Vec::new();
    while !reader.at_end() {
        out.push(read_one(&mut reader)?);
    }
    log::debug!("parsed {} time sampling record(s)", out.len());
    Ok(out)
}

fn read_one(reader: &mut Reader) -> Result<TimeSampling> {
    // maxSample is part of the original's oMaxSamples out-param; this
    // descriptor has no sample-count field to fill, so it's read to stay
    // in sync with the record layout and dropped rather than surfaced.
    let _max_sample = reader.read_u32()?;
    let time_per_cycle = reader.read_f64()?;
    let num_samples = reader.read_u32()?;
    if num_samples < 1 {
        return Err(crate::error::Error::decode(
            "time sampling record declares zero samples",
        ));
    }
    let mut sample_times = Vec::with_capacity(num_samples as usize);
    for _ in 0..num_samples {
        sample_times.push(reader.read_f64()?);
    }

    let kind = if time_per_cycle == ACYCLIC_SENTINEL {
        TimeSamplingKind::Acyclic
    } else {
        TimeSamplingKind::Cyclic {
            num_samples_per_cycle: num_samples,
            time_per_cycle,
        }
    };
    Ok(TimeSampling { kind, sample_times })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(max_sample: u32, time_per_cycle: f64, times: &[f64]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&max_sample.to_le_bytes());
        buf.extend_from_slice(&time_per_cycle.to_le_bytes());
        buf.extend_from_slice(&(times.len() as u32).to_le_bytes());
        for t in times {
            buf.extend_from_slice(&t.to_le_bytes());
        }
        buf
    }

    #[test]
    fn s8_acyclic_record_preserves_times() {
        let buf = record(5, ACYCLIC_SENTINEL, &[0.0, 0.5, 1.25]);
        let out = read_time_samplings(&buf).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, TimeSamplingKind::Acyclic);
        assert_eq!(out[0].sample_times, vec![0.0, 0.5, 1.25]);
    }

    #[test]
    fn cyclic_record_carries_time_per_cycle() {
        let buf = record(10, 2.0, &[0.0, 1.0]);
        let out = read_time_samplings(&buf).unwrap();
        assert_eq!(
            out[0].kind,
            TimeSamplingKind::Cyclic {
                num_samples_per_cycle: 2,
                time_per_cycle: 2.0
            }
        );
    }

    #[test]
    fn multiple_records_concatenate() {
        let mut buf = record(1, ACYCLIC_SENTINEL, &[0.0]);
        buf.extend(record(2, ACYCLIC_SENTINEL, &[0.0, 1.0]));
        let out = read_time_samplings(&buf).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].sample_times.len(), 2);
    }

    #[test]
    fn zero_samples_is_a_decode_error() {
        let buf = record(1, ACYCLIC_SENTINEL, &[]);
        assert!(read_time_samplings(&buf).is_err());
    }

    #[test]
    fn truncated_record_is_a_decode_error() {
        let mut buf = record(1, ACYCLIC_SENTINEL, &[0.0, 1.0]);
        buf.truncate(buf.len() - 4);
        assert!(read_time_samplings(&buf).is_err());
    }
}
