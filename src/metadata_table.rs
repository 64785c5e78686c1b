//! C7: indexed metadata parser.
//!
//! Decodes the archive-level dictionary of short reusable metadata
//! strings: index 0 is always the canonical empty entry, and the table
//! holds at most 256 entries total (index `0xff` is reserved by property
//! headers as the "inline, not indexed" sentinel rather than a real
//! table slot).

use crate::error::{Error, Result};
use crate::metadata::MetaData;
use crate::reader::Reader;

/// The total buffer size cap (256 entries × 256 bytes each) — exceeding
/// this is a fatal decode error, not a tolerated truncation.
const MAX_BUFFER_SIZE: usize = 65536;

/// Parses the indexed metadata buffer into a table seeded with the empty
/// entry at index 0, followed by one entry per `(u8 size, bytes[size])`
/// record in the buffer.
pub fn read_indexed_metadata(buf: &[u8]) -> Result<Vec<MetaData>> {
    if buf.len() > MAX_BUFFER_SIZE {
        return Err(Error::decode(format!(
            "indexed metadata buffer of {} bytes exceeds the {MAX_BUFFER_SIZE}-byte cap",
            buf.len()
        )));
    }

    let mut table = vec![MetaData::empty()];
    let mut reader = Reader::new(buf);
    while !reader.at_end() {
        let size = reader.read_u8()? as usize;
        if size == 0 {
            // An empty trailing record is admitted as an empty entry
            // rather than treated as a truncation.
            table.push(MetaData::empty());
            continue;
        }
        let bytes = reader.read_bytes(size)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| Error::decode(format!("indexed metadata entry is not valid UTF-8: {e}")))?;
        table.push(MetaData::deserialize(s));
    }

    log::debug!("parsed {} indexed metadata entr(y/ies)", table.len());
    Ok(table)
}
