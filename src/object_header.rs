//! C5: object header parser.
//!
//! Decodes a sequence of `(name, metaDataRef)` records into
//! [`ObjectHeader`]s, resolving each `metaDataRef` against either the
//! archive's indexed metadata table (C7) or an inline string.

use crate::error::{Error, Result};
use crate::metadata::MetaData;
use crate::reader::Reader;

/// `0xff` marks a header's metadata as inline rather than an index into
/// the archive's indexed metadata table.
const INLINE_METADATA_SENTINEL: u8 = 0xff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub name: String,
    pub full_name: String,
    pub meta_data: MetaData,
}

/// Parses every object header record in `buf`, resolving indexed metadata
/// references against `indexed_metadata` (the C7 table) and qualifying
/// each name under `parent_full_name`.
pub fn read_object_headers(
    buf: &[u8],
    parent_full_name: &str,
    indexed_metadata: &[MetaData],
) -> Result<Vec<ObjectHeader>> {
    let mut reader = Reader::new(buf);
    let mut out = Vec::new();
    while !reader.at_end() {
        out.push(read_one(&mut reader, parent_full_name, indexed_metadata)?);
    }
    log::debug!(
        "parsed {} object header(s) under '{parent_full_name}'",
        out.len()
    );
    Ok(out)
}

fn read_one(
    reader: &mut Reader,
    parent_full_name: &str,
    indexed_metadata: &[MetaData],
) -> Result<ObjectHeader> {
    let name_size = reader.read_u32()? as usize;
    if name_size == 0 {
        return Err(Error::decode("object header name size must not be zero"));
    }
    let name_bytes = reader.read_bytes(name_size)?;
    let name = std::str::from_utf8(name_bytes)
        .map_err(|e| Error::decode(format!("object header name is not valid UTF-8: {e}")))?
        .to_string();

    let meta_data_index = reader.read_u8()?;
    let meta_data = if meta_data_index == INLINE_METADATA_SENTINEL {
        let meta_data_size = reader.read_u32()? as usize;
        let bytes = reader.read_bytes(meta_data_size)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| Error::decode(format!("object header metadata is not valid UTF-8: {e}")))?;
        MetaData::deserialize(s)
    } else {
        indexed_metadata
            .get(meta_data_index as usize)
            .cloned()
            .ok_or_else(|| {
                Error::decode(format!(
                    "object header metadata index {meta_data_index} out of range (table has {} entries)",
                    indexed_metadata.len()
                ))
            })?
    };

    let full_name = format!("{parent_full_name}/{name}");
    Ok(ObjectHeader {
        name,
        full_name,
        meta_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_record(name: &str, meta: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(INLINE_METADATA_SENTINEL);
        buf.extend_from_slice(&(meta.len() as u32).to_le_bytes());
        buf.extend_from_slice(meta.as_bytes());
        buf
    }

    #[test]
    fn s9_inline_metadata_header() {
        let buf = inline_record("abc", "k=v;;");
        let headers = read_object_headers(&buf, "", &[]).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name, "abc");
        assert_eq!(headers[0].full_name, "/abc");
        assert_eq!(headers[0].meta_data.as_str(), "k=v;;");
    }

    #[test]
    fn indexed_metadata_is_resolved_by_index() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"obj");
        buf.push(1); // index into table

        let table = vec![MetaData::empty(), MetaData::deserialize("x=1")];
        let headers = read_object_headers(&buf, "/root", &table).unwrap();
        assert_eq!(headers[0].full_name, "/root/obj");
        assert_eq!(headers[0].meta_data.as_str(), "x=1");
    }

    #[test]
    fn out_of_range_metadata_index_is_a_decode_error() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(b"obj");
        buf.push(5);
        assert!(read_object_headers(&buf, "", &[MetaData::empty()]).is_err());
    }

    #[test]
    fn zero_name_size_is_a_decode_error() {
        let buf = 0u32.to_le_bytes();
        assert!(read_object_headers(&buf, "", &[]).is_err());
    }

    #[test]
    fn multiple_records_concatenate() {
        let mut buf = inline_record("a", "");
        buf.extend(inline_record("b", ""));
        let headers = read_object_headers(&buf, "", &[]).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[1].name, "b");
    }
}
