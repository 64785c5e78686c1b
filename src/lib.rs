//! A decoder for a hierarchical, typed, binary sample-archive format.
#[deny(missing_docs)]
#[deny(rustdoc::broken_intra_doc_links)]
#[deny(clippy::missing_errors_doc)]
#[forbid(unsafe_code)]
mod container;
mod dimensions;
mod error;
mod metadata;
mod metadata_table;
mod object_header;
mod payload;
mod pod;
mod property_header;
mod reader;
mod time_sampling;

pub use crate::container::{Data, Group, SampleAllocator, TimeSamplingSource};
pub use crate::dimensions::{read_dimensions, read_tdr_dimensions, Dimensions};
pub use crate::error::{Error, Result};
pub use crate::metadata::MetaData;
pub use crate::metadata_table::read_indexed_metadata;
pub use crate::object_header::{read_object_headers, ObjectHeader};
pub use crate::payload::{read_array_data, read_array_sample, read_data, SampleData};
pub use crate::pod::{convert, DataType, Pod};
pub use crate::property_header::{read_property_headers, PropertyHeader, PropertyType};
pub use crate::time_sampling::{read_time_samplings, TimeSampling, TimeSamplingKind, ACYCLIC_SENTINEL};
