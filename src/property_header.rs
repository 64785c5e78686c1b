//! C6: property header parser.
//!
//! The densest part of the format: each record begins with a 32-bit
//! bitfield ("info word") describing the property's shape, followed by a
//! variable number of size-hinted fields whose presence depends on bits
//! in that word.
//!
//! Info word layout (bit 0 = LSB):
//!
//! | Bits  | Field           | Meaning                                        |
//! |-------|-----------------|------------------------------------------------|
//! | 0–1   | `ptype`         | 0=Compound, 1=Scalar, 2/3=Array (low bit=isScalarLike) |
//! | 2–3   | `sizeHint`      | 0→u8, 1→u16, 2→u32 width for size-hinted fields |
//! | 4–7   | `pod`           | primitive kind, validated against the 14 known values |
//! | 8     | `hasTsi`        | time-sampling index present                     |
//! | 9     | `hasChangedIdx` | explicit `(firstChanged, lastChanged)` present   |
//! | 10    | `isHomogenous`  | mask `0x400`                                     |
//! | 11    | `allConstant`   | mask `0x800`, meaningful only when `!hasChangedIdx` |
//! | 12–19 | `extent`        | u8                                               |
//! | 20–27 | `metaDataIndex` | u8, `0xff` = inline                              |

use crate::error::{Error, Result};
use crate::metadata::MetaData;
use crate::pod::{DataType, Pod};
use crate::reader::{Reader, SizeHint};

const INLINE_METADATA_SENTINEL: u64 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Compound,
    Scalar,
    Array,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyHeader {
    pub name: String,
    pub property_type: PropertyType,
    pub is_scalar_like: bool,
    /// `None` for [`PropertyType::Compound`]; every other kind carries a
    /// concrete element type.
    pub data_type: Option<DataType>,
    pub meta_data: MetaData,
    pub time_sampling_index: u32,
    pub next_sample_index: u64,
    pub first_changed_index: u64,
    pub last_changed_index: u64,
    pub is_homogenous: bool,
    pub all_constant: bool,
}

struct InfoWord {
    property_type: PropertyType,
    is_scalar_like: bool,
    size_hint: SizeHint,
    pod: Pod,
    has_tsi: bool,
    has_changed_idx: bool,
    is_homogenous: bool,
    all_constant: bool,
    extent: u8,
    meta_data_index: u64,
}

impl InfoWord {
    fn parse(word: u32) -> Result<Self> {
        let ptype_bits = word & 0b11;
        let (property_type, is_scalar_like) = match ptype_bits {
            0 => (PropertyType::Compound, false),
            1 => (PropertyType::Scalar, true),
            2 => (PropertyType::Array, false),
            3 => (PropertyType::Array, true),
            _ => unreachable!("2-bit field"),
        };
        let size_hint = SizeHint::from_bits((word >> 2) & 0b11)?;
        let pod_bits = ((word >> 4) & 0b1111) as u8;
        let pod = if property_type == PropertyType::Compound {
            // Unused for compound properties; Boolean is an arbitrary
            // placeholder that's never read through `data_type`.
            Pod::Boolean
        } else {
            Pod::from_wire(pod_bits)
                .ok_or_else(|| Error::decode(format!("unknown property POD byte {pod_bits}")))?
        };
        let has_tsi = (word & 0x100) != 0;
        let has_changed_idx = (word & 0x200) != 0;
        let is_homogenous = (word & 0x400) != 0;
        let all_constant = (word & 0x800) != 0;
        let extent = ((word >> 12) & 0xff) as u8;
        let meta_data_index = ((word >> 20) & 0xff) as u64;

        Ok(InfoWord {
            property_type,
            is_scalar_like,
            size_hint,
            pod,
            has_tsi,
            has_changed_idx,
            is_homogenous,
            all_constant,
            extent,
            meta_data_index,
        })
    }
}

/// Parses every property header record in `buf`, resolving indexed
/// metadata references against `indexed_metadata` (the C7 table).
pub fn read_property_headers(
    buf: &[u8],
    indexed_metadata: &[MetaData],
) -> Result<Vec<PropertyHeader>> {
    let mut reader = Reader::new(buf);
    let mut out = Vec::new();
    while !reader.at_end() {
        out.push(read_one(&mut reader, indexed_metadata)?);
    }
    log::debug!("parsed {} property header(s)", out.len());
    Ok(out)
}

fn read_one(reader: &mut Reader, indexed_metadata: &[MetaData]) -> Result<PropertyHeader> {
    let info = InfoWord::parse(reader.read_u32()?)?;

    let (next_sample_index, first_changed_index, last_changed_index, time_sampling_index) =
        if info.property_type == PropertyType::Compound {
            (0, 0, 0, 0)
        } else {
            let next_sample_index = reader.read_sized_uint(info.size_hint)?;
            let (first, last) = if info.has_changed_idx {
                let first = reader.read_sized_uint(info.size_hint)?;
                let last = reader.read_sized_uint(info.size_hint)?;
                (first, last)
            } else if info.all_constant {
                (0, 0)
            } else {
                (1, next_sample_index.saturating_sub(1))
            };
            let tsi = if info.has_tsi {
                reader.read_sized_uint(info.size_hint)? as u32
            } else {
                0
            };
            (next_sample_index, first, last, tsi)
        };

    let name_size = reader.read_sized_uint(info.size_hint)? as usize;
    if name_size == 0 {
        return Err(Error::decode("property header name size must not be zero"));
    }
    let name_bytes = reader.read_bytes(name_size)?;
    let name = std::str::from_utf8(name_bytes)
        .map_err(|e| Error::decode(format!("property header name is not valid UTF-8: {e}")))?
        .to_string();

    let meta_data = if info.meta_data_index == INLINE_METADATA_SENTINEL {
        let meta_data_size = reader.read_sized_uint(info.size_hint)? as usize;
        let bytes = reader.read_bytes(meta_data_size)?;
        let s = std::str::from_utf8(bytes).map_err(|e| {
            Error::decode(format!("property header metadata is not valid UTF-8: {e}"))
        })?;
        MetaData::deserialize(s)
    } else {
        indexed_metadata
            .get(info.meta_data_index as usize)
            .cloned()
            .ok_or_else(|| {
                Error::decode(format!(
                    "property header metadata index {} out of range (table has {} entries)",
                    info.meta_data_index,
                    indexed_metadata.len()
                ))
            })?
    };

    let data_type = (info.property_type != PropertyType::Compound)
        .then(|| DataType::new(info.pod, info.extent));

    Ok(PropertyHeader {
        name,
        property_type: info.property_type,
        is_scalar_like: info.is_scalar_like,
        data_type,
        meta_data,
        time_sampling_index,
        next_sample_index,
        first_changed_index,
        last_changed_index,
        is_homogenous: info.is_homogenous,
        all_constant: info.all_constant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s7_info_word_decodes_scalar_float32() {
        // Built field-by-field from the bit table rather than a literal
        // constant: ptype=Scalar(1), sizeHint=u8(0), pod=F32(10),
        // hasTsi=1, extent=1, metaDataIndex=0.
        let word: u32 = 0x1 | (10 << 4) | (1 << 8) | (1 << 12);
        let info = InfoWord::parse(word).unwrap();
        assert_eq!(info.property_type, PropertyType::Scalar);
        assert!(info.is_scalar_like);
        assert_eq!(info.size_hint, SizeHint::U8);
        assert_eq!(info.pod, Pod::F32);
        assert!(info.has_tsi);
        assert_eq!(info.extent, 1);
        assert_eq!(info.meta_data_index, 0);
    }

    fn scalar_header_buf(name: &str) -> Vec<u8> {
        // ptype=Scalar(1), sizeHint=u8(0), pod=F32(10<<4=0xA0), hasTsi=1(0x100)
        let info: u32 = 0x1 | (10 << 4) | 0x100;
        let mut buf = Vec::new();
        buf.extend_from_slice(&info.to_le_bytes());
        buf.push(5); // nextSampleIndex
        buf.push(3); // timeSamplingIndex
        buf.push(name.len() as u8);
        buf.extend_from_slice(name.as_bytes());
        buf.push(0); // metaDataIndex = 0 (canonical empty)
        buf
    }

    #[test]
    fn scalar_property_header_round_trips_fields() {
        let buf = scalar_header_buf("P");
        let headers = read_property_headers(&buf, &[MetaData::empty()]).unwrap();
        assert_eq!(headers.len(), 1);
        let h = &headers[0];
        assert_eq!(h.name, "P");
        assert_eq!(h.property_type, PropertyType::Scalar);
        assert_eq!(h.data_type, Some(DataType::new(Pod::F32, 1)));
        assert_eq!(h.next_sample_index, 5);
        assert_eq!(h.time_sampling_index, 3);
        // no hasChangedIdx, no allConstant -> "no repeats" encoding
        assert_eq!(h.first_changed_index, 1);
        assert_eq!(h.last_changed_index, 4);
    }

    #[test]
    fn all_constant_encoding_zeros_both_changed_indices() {
        let info: u32 = 0x1 | (10 << 4) | 0x800; // Scalar, F32, allConstant
        let mut buf = Vec::new();
        buf.extend_from_slice(&info.to_le_bytes());
        buf.push(7); // nextSampleIndex
        buf.push(1); // nameSize
        buf.push(b'Q');
        buf.push(0); // metaDataIndex
        let headers = read_property_headers(&buf, &[MetaData::empty()]).unwrap();
        assert_eq!(headers[0].first_changed_index, 0);
        assert_eq!(headers[0].last_changed_index, 0);
    }

    #[test]
    fn explicit_changed_indices_are_read_when_flagged() {
        let info: u32 = 0x1 | (10 << 4) | 0x200; // Scalar, F32, hasChangedIdx
        let mut buf = Vec::new();
        buf.extend_from_slice(&info.to_le_bytes());
        buf.push(9); // nextSampleIndex
        buf.push(2); // firstChangedIndex
        buf.push(6); // lastChangedIndex
        buf.push(1); // nameSize
        buf.push(b'R');
        buf.push(0); // metaDataIndex
        let headers = read_property_headers(&buf, &[MetaData::empty()]).unwrap();
        assert_eq!(headers[0].first_changed_index, 2);
        assert_eq!(headers[0].last_changed_index, 6);
    }

    #[test]
    fn compound_property_skips_data_fields() {
        let info: u32 = 0x0; // Compound
        let mut buf = Vec::new();
        buf.extend_from_slice(&info.to_le_bytes());
        buf.push(1); // nameSize
        buf.push(b'C');
        buf.push(0); // metaDataIndex
        let headers = read_property_headers(&buf, &[MetaData::empty()]).unwrap();
        assert_eq!(headers[0].property_type, PropertyType::Compound);
        assert_eq!(headers[0].data_type, None);
    }

    #[test]
    fn unknown_pod_is_a_fatal_decode_error() {
        let info: u32 = 0x1 | (0xE << 4); // Scalar, pod=14 (invalid)
        let buf = info.to_le_bytes();
        assert!(read_property_headers(&buf, &[]).is_err());
    }

    #[test]
    fn inline_metadata_is_read_when_index_is_0xff() {
        let info: u32 = 0x1 | (10 << 4) | (0xff << 20); // Scalar, F32, inline meta
        let mut buf = Vec::new();
        buf.extend_from_slice(&info.to_le_bytes());
        buf.push(1); // nextSampleIndex
        buf.push(1); // nameSize
        buf.push(b'P');
        buf.push(5); // metaDataSize
        buf.extend_from_slice(b"k=v;;");
        let headers = read_property_headers(&buf, &[]).unwrap();
        assert_eq!(headers[0].meta_data.as_str(), "k=v;;");
    }
}
