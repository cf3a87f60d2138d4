//! Traits to abstract over the database access layer used by the
//! marshaling engine

use bytes::Bytes;

use crate::*;

/// Everything the cursors and blob streams need from a client
pub trait FirebirdClient
where
    Self: FirebirdClientDbOps,
    Self: FirebirdClientSqlOps,
    Self: FirebirdClientBlobOps,
{
}

impl<A> FirebirdClient for A where A: FirebirdClientDbOps + FirebirdClientSqlOps + FirebirdClientBlobOps
{}

/// Properties negotiated with the database attachment
pub trait FirebirdClientDbOps {
    /// Firebird character set of the attachment (`WIN1252`, `UTF8`...).
    /// `None` uses the default utf-8 rules.
    fn isc_encoding(&self) -> Option<&str>;

    /// Max length of a blob segment, used for reads and writes
    fn blob_buffer_len(&self) -> usize;
}

/// Row retrieval of executed statements
pub trait FirebirdClientSqlOps {
    /// A statement handle
    type StmtHandle: Clone + Copy;

    /// Fetch the next row of the executed statement.
    ///
    /// Returns `None` when there are no more rows
    fn fetch(&mut self, stmt_handle: Self::StmtHandle) -> Result<Option<RawRow>, FbError>;

    /// Closes or drops a statement
    fn free_statement(
        &mut self,
        stmt_handle: Self::StmtHandle,
        op: FreeStmtOp,
    ) -> Result<(), FbError>;

    /// Called when a streaming cursor starts to use the statement, so a
    /// managed connection knows which statements are still open
    fn register_statement(&mut self, _stmt_handle: Self::StmtHandle) -> Result<(), FbError> {
        Ok(())
    }
}

/// Segmented blob transfer
pub trait FirebirdClientBlobOps {
    /// A blob handle
    type BlobHandle: Clone + Copy;

    /// Open an existing blob for reading
    fn open_blob(&mut self, blob_id: u64) -> Result<Self::BlobHandle, FbError>;

    /// Read a segment of at most `max_len` bytes.
    ///
    /// Returns the bytes and `true` if the end of the blob was reached
    fn get_segment(
        &mut self,
        blob_handle: Self::BlobHandle,
        max_len: usize,
    ) -> Result<(Bytes, bool), FbError>;

    /// Create a new blob for writing. Returns the handle and the id the
    /// blob will have once closed
    fn create_blob(&mut self) -> Result<(Self::BlobHandle, u64), FbError>;

    /// Write one segment
    fn put_segment(&mut self, blob_handle: Self::BlobHandle, data: &[u8]) -> Result<(), FbError>;

    /// Release the server side handle
    fn close_blob(&mut self, blob_handle: Self::BlobHandle) -> Result<(), FbError>;
}

#[repr(u8)]
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
/// Drop / Close statement
pub enum FreeStmtOp {
    Close = ibase::DSQL_close as u8,
    Drop = ibase::DSQL_drop as u8,
}
