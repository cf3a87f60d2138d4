//! `BLOB` columns, holding an id or the cached contents

use bytes::Bytes;
use rsfbdata_core::{FbError, FirebirdClient, SqlData, SqlType, XSqlVar};
use std::io::{self, Cursor, Read};

use super::FieldKind;
use crate::{
    blob::{BlobReader, BlobValue, CachedBlob, FbBlob},
    connection::FbConnection,
    handles::BlobHandles,
};

/// Reader over the bytes of a column
pub enum BinaryStream<C: FirebirdClient> {
    /// Read session of a live blob
    Blob(BlobReader<C>),
    /// Contents already in memory
    Memory(Cursor<Bytes>),
}

impl<C: FirebirdClient> BinaryStream<C> {
    /// Releases the blob handle, if any
    pub fn close(&mut self) -> Result<(), FbError> {
        match self {
            BinaryStream::Blob(reader) => reader.close(),
            BinaryStream::Memory(_) => Ok(()),
        }
    }
}

impl<C: FirebirdClient> Read for BinaryStream<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BinaryStream::Blob(reader) => reader.read(buf),
            BinaryStream::Memory(cursor) => cursor.read(buf),
        }
    }
}

pub(super) fn get_blob<C: FirebirdClient>(
    var: &XSqlVar,
    conn: &FbConnection<C>,
) -> Result<BlobValue<C>, FbError> {
    match var.data() {
        Some(SqlData::Quad(id)) => Ok(BlobValue::Live(FbBlob::with_id(conn.clone(), *id))),
        Some(SqlData::Cached(data)) => Ok(BlobValue::Cached(CachedBlob::new(data.clone()))),
        other => Err(FbError::illegal_state(format!(
            "Expected a blob value, found {:?}",
            other
        ))),
    }
}

pub(super) fn read_bytes<C: FirebirdClient>(
    var: &XSqlVar,
    conn: &FbConnection<C>,
) -> Result<Bytes, FbError> {
    get_blob(var, conn)?.bytes()
}

/// Opens a reader over the column. Live blobs are registered in `blobs`,
/// when given, so they are closed with the cursor.
pub(super) fn stream<C: FirebirdClient>(
    var: &XSqlVar,
    conn: &FbConnection<C>,
    blobs: Option<&BlobHandles<C>>,
) -> Result<BinaryStream<C>, FbError> {
    match get_blob(var, conn)? {
        BlobValue::Live(blob) => {
            let reader = match blobs {
                Some(handles) => blob.registered_reader(handles)?,
                None => blob.reader()?,
            };

            Ok(BinaryStream::Blob(reader))
        }
        BlobValue::Cached(blob) => Ok(BinaryStream::Memory(blob.reader())),
    }
}

/// Stores the bytes in a new blob
pub(super) fn write_bytes<C: FirebirdClient>(
    conn: &FbConnection<C>,
    data: &[u8],
) -> Result<SqlData, FbError> {
    let blob = FbBlob::new(conn.clone());
    blob.copy_bytes(data)?;

    Ok(SqlData::Quad(blob.id()))
}

/// Stores `length` bytes of the reader in a new blob
pub(super) fn write_stream<C: FirebirdClient, R: Read>(
    conn: &FbConnection<C>,
    input: R,
    length: usize,
) -> Result<SqlData, FbError> {
    let blob = FbBlob::new(conn.clone());
    blob.copy_stream(input, length)?;

    Ok(SqlData::Quad(blob.id()))
}

/// Id of the blob to store in the column
pub(super) fn bound_id<C: FirebirdClient>(value: &BlobValue<C>) -> Result<SqlData, FbError> {
    match value {
        BlobValue::Live(blob) if blob.is_bound() => Ok(SqlData::Quad(blob.id())),
        BlobValue::Live(_) => Err(FbError::illegal_state(
            "The blob has no value, write it before using it",
        )),
        BlobValue::Cached(cached) => Err(FbError::illegal_state(format!(
            "Cached blob of {} bytes has no id",
            cached.len()
        ))),
    }
}

pub(super) fn object<C: FirebirdClient>(
    kind: FieldKind,
    var: &XSqlVar,
    conn: &FbConnection<C>,
) -> Result<SqlType, FbError> {
    match (kind, var.data()) {
        (FieldKind::Blob, Some(SqlData::Quad(id))) => Ok(SqlType::Blob(*id)),
        (FieldKind::LongText, _) => {
            let bytes = read_bytes(var, conn)?;
            Ok(SqlType::Text(conn.charset().decode(&bytes)?.into_owned()))
        }
        _ => Ok(SqlType::Binary(read_bytes(var, conn)?.to_vec())),
    }
}
