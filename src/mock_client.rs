//! Scripted in memory client, to exercise the cursors and blob
//! streams without a database

use bytes::Bytes;
use rand::Rng;
use rsfbdata_core::*;
use std::collections::{HashMap, HashSet, VecDeque};

pub enum ResponseStrategy {
    FailRandomly,
    AlwaysSucceed,
    AlwaysFail,
}

enum OpenBlob {
    Read { id: u64, pos: usize },
    Write { id: u64, data: Vec<u8> },
}

pub struct MockFbClient {
    pub strategy: ResponseStrategy,
    pub encoding: Option<String>,
    pub blob_buffer_len: usize,
    /// Max length served by each `get_segment`, even if more was asked
    pub segment_len: usize,

    rows: HashMap<u32, VecDeque<RawRow>>,
    closed_stmts: HashSet<u32>,
    pub fetch_calls: usize,
    pub registered: Vec<u32>,
    pub freed: Vec<(u32, FreeStmtOp)>,

    blobs: HashMap<u64, Vec<u8>>,
    open: HashMap<u32, OpenBlob>,
    next_blob_id: u64,
    next_handle: u32,
    pub segments_written: Vec<usize>,
    pub blob_closes: usize,
}

impl MockFbClient {
    pub fn new() -> Self {
        MockFbClient {
            strategy: ResponseStrategy::AlwaysSucceed,
            encoding: None,
            blob_buffer_len: 16,
            segment_len: usize::MAX,
            rows: HashMap::new(),
            closed_stmts: HashSet::new(),
            fetch_calls: 0,
            registered: Vec::new(),
            freed: Vec::new(),
            blobs: HashMap::new(),
            open: HashMap::new(),
            next_blob_id: 1,
            next_handle: 1,
            segments_written: Vec::new(),
            blob_closes: 0,
        }
    }

    /// Queue the rows returned by the statement
    pub fn add_rows(&mut self, stmt: u32, rows: Vec<RawRow>) {
        self.rows.entry(stmt).or_default().extend(rows);
    }

    /// Rows of the statement not fetched yet
    pub fn pending_rows(&self, stmt: u32) -> usize {
        self.rows.get(&stmt).map(VecDeque::len).unwrap_or(0)
    }

    /// Stores a blob, returning its id
    pub fn add_blob(&mut self, data: Vec<u8>) -> u64 {
        let id = self.next_blob_id;
        self.next_blob_id += 1;
        self.blobs.insert(id, data);
        id
    }

    pub fn blob(&self, id: u64) -> Option<&[u8]> {
        self.blobs.get(&id).map(Vec::as_slice)
    }

    /// Forget every stored blob, like the end of the transaction that owned them
    pub fn drop_all_blobs(&mut self) {
        self.blobs.clear();
    }

    /// Blob handles not closed yet
    pub fn open_handles(&self) -> usize {
        self.open.len()
    }

    fn respond(&self) -> Result<(), FbError> {
        let fail = match self.strategy {
            ResponseStrategy::AlwaysSucceed => false,
            ResponseStrategy::AlwaysFail => true,
            ResponseStrategy::FailRandomly => rand::thread_rng().gen_bool(0.5),
        };

        if fail {
            Err(FbError::Sql {
                msg: "mock failure".to_string(),
                code: -902,
            })
        } else {
            Ok(())
        }
    }

    fn new_handle(&mut self, blob: OpenBlob) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.open.insert(handle, blob);
        handle
    }
}

fn invalid_handle() -> FbError {
    FbError::Sql {
        msg: "invalid BLOB handle".to_string(),
        code: -901,
    }
}

impl FirebirdClientDbOps for MockFbClient {
    fn isc_encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    fn blob_buffer_len(&self) -> usize {
        self.blob_buffer_len
    }
}

impl FirebirdClientSqlOps for MockFbClient {
    type StmtHandle = u32;

    fn fetch(&mut self, stmt_handle: Self::StmtHandle) -> Result<Option<RawRow>, FbError> {
        self.respond()?;
        self.fetch_calls += 1;

        if self.closed_stmts.contains(&stmt_handle) {
            return Err(FbError::Sql {
                msg: "Attempt to fetch from a closed cursor".to_string(),
                code: -504,
            });
        }

        Ok(self
            .rows
            .get_mut(&stmt_handle)
            .and_then(VecDeque::pop_front))
    }

    fn free_statement(
        &mut self,
        stmt_handle: Self::StmtHandle,
        op: FreeStmtOp,
    ) -> Result<(), FbError> {
        self.respond()?;

        self.closed_stmts.insert(stmt_handle);
        self.freed.push((stmt_handle, op));
        Ok(())
    }

    fn register_statement(&mut self, stmt_handle: Self::StmtHandle) -> Result<(), FbError> {
        self.registered.push(stmt_handle);
        Ok(())
    }
}

impl FirebirdClientBlobOps for MockFbClient {
    type BlobHandle = u32;

    fn open_blob(&mut self, blob_id: u64) -> Result<Self::BlobHandle, FbError> {
        self.respond()?;

        if !self.blobs.contains_key(&blob_id) {
            return Err(FbError::Sql {
                msg: format!("invalid BLOB ID {}", blob_id),
                code: -904,
            });
        }

        Ok(self.new_handle(OpenBlob::Read { id: blob_id, pos: 0 }))
    }

    fn get_segment(
        &mut self,
        blob_handle: Self::BlobHandle,
        max_len: usize,
    ) -> Result<(Bytes, bool), FbError> {
        self.respond()?;

        let max_len = max_len.min(self.segment_len);
        let blobs = &self.blobs;

        match self.open.get_mut(&blob_handle) {
            Some(OpenBlob::Read { id, pos }) => {
                let data = blobs.get(id).ok_or_else(invalid_handle)?;
                let end = (*pos + max_len).min(data.len());
                let segment = Bytes::copy_from_slice(&data[*pos..end]);
                *pos = end;

                Ok((segment, end == data.len()))
            }
            _ => Err(invalid_handle()),
        }
    }

    fn create_blob(&mut self) -> Result<(Self::BlobHandle, u64), FbError> {
        self.respond()?;

        let id = self.next_blob_id;
        self.next_blob_id += 1;

        let handle = self.new_handle(OpenBlob::Write {
            id,
            data: Vec::new(),
        });

        Ok((handle, id))
    }

    fn put_segment(&mut self, blob_handle: Self::BlobHandle, data: &[u8]) -> Result<(), FbError> {
        self.respond()?;

        if data.len() > self.blob_buffer_len {
            return Err(FbError::Sql {
                msg: format!("segment of {} bytes is too long", data.len()),
                code: -802,
            });
        }

        match self.open.get_mut(&blob_handle) {
            Some(OpenBlob::Write { data: buf, .. }) => {
                buf.extend_from_slice(data);
                self.segments_written.push(data.len());
                Ok(())
            }
            _ => Err(invalid_handle()),
        }
    }

    fn close_blob(&mut self, blob_handle: Self::BlobHandle) -> Result<(), FbError> {
        self.respond()?;

        match self.open.remove(&blob_handle) {
            Some(OpenBlob::Write { id, data }) => {
                self.blobs.insert(id, data);
            }
            Some(OpenBlob::Read { .. }) => {}
            None => return Err(invalid_handle()),
        }

        self.blob_closes += 1;
        Ok(())
    }
}
