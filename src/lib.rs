//!
//! Firebird data marshaling
//!
//! Conversion of column values, blob segment streams and result set
//! fetching on top of a firebird client.
//!

#[macro_use]
extern crate log;

#[cfg(test)]
pub(crate) mod mock_client;

pub mod blob;
mod connection;
pub mod fetcher;
pub mod field;
mod handles;
mod result_set;

pub use crate::{
    blob::{BlobReader, BlobValue, BlobWriter, CachedBlob, FbBlob},
    connection::FbConnection,
    field::{is_compatible, BinaryStream, FbField, FieldKind, SemanticType},
    handles::BlobHandles,
    result_set::{ColumnIndex, CursorPosition, FbResultSet},
};
pub use rsfbdata_core::{FbError, FirebirdClient, SqlType, XSqlVar};

#[doc(hidden)]
pub use rsfbdata_core::{charset, Charset};
