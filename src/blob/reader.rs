use bytes::Bytes;
use rsfbdata_core::{FbError, FirebirdClient};
use std::{cell::Cell, io, rc::Rc};

use crate::{connection::FbConnection, handles::HandleSlot};

/// Read session over an existing blob.
///
/// Segments are requested from the client only when the current one
/// is exhausted.
pub struct BlobReader<C: FirebirdClient> {
    conn: FbConnection<C>,
    blob_id: u64,
    handle: HandleSlot<C::BlobHandle>,
    segment: Bytes,
    pos: usize,
    eof: bool,
}

impl<C: FirebirdClient> BlobReader<C> {
    pub(crate) fn open(conn: FbConnection<C>, blob_id: u64) -> Result<Self, FbError> {
        if blob_id == 0 {
            return Err(FbError::illegal_state("You can't read a new blob"));
        }

        let handle = conn.with_client(|c| c.open_blob(blob_id))?;
        debug!("Opened blob {} for reading", blob_id);

        Ok(BlobReader {
            conn,
            blob_id,
            handle: Rc::new(Cell::new(Some(handle))),
            segment: Bytes::new(),
            pos: 0,
            eof: false,
        })
    }

    pub(crate) fn slot(&self) -> &HandleSlot<C::BlobHandle> {
        &self.handle
    }

    pub fn blob_id(&self) -> u64 {
        self.blob_id
    }

    pub fn is_closed(&self) -> bool {
        self.handle.get().is_none()
    }

    /// Reads the next byte, `None` at the end of the blob
    pub fn read_byte(&mut self) -> Result<Option<u8>, FbError> {
        if !self.ensure_segment()? {
            return Ok(None);
        }

        let byte = self.segment[self.pos];
        self.pos += 1;

        Ok(Some(byte))
    }

    /// Copies the buffered segment into `buf`, fetching a new one if needed.
    /// Returns 0 at the end of the blob
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, FbError> {
        if buf.is_empty() || !self.ensure_segment()? {
            return Ok(0);
        }

        let available = &self.segment[self.pos..];
        let len = available.len().min(buf.len());
        buf[..len].copy_from_slice(&available[..len]);
        self.pos += len;

        Ok(len)
    }

    /// `true` if there are bytes to serve
    fn ensure_segment(&mut self) -> Result<bool, FbError> {
        let handle = self
            .handle
            .get()
            .ok_or_else(|| FbError::illegal_state("The blob stream is closed"))?;

        while self.pos >= self.segment.len() {
            if self.eof {
                return Ok(false);
            }

            let max_len = self.conn.blob_buffer_len();
            let (segment, eof) = self.conn.with_client(|c| c.get_segment(handle, max_len))?;
            trace!(
                "Read segment of {} bytes from blob {} (eof: {})",
                segment.len(),
                self.blob_id,
                eof
            );

            // An empty segment also ends the blob
            self.eof = eof || segment.is_empty();
            self.segment = segment;
            self.pos = 0;
        }

        Ok(true)
    }

    /// Releases the server handle. Closing twice does nothing.
    pub fn close(&mut self) -> Result<(), FbError> {
        self.segment = Bytes::new();
        self.pos = 0;

        match self.handle.take() {
            Some(handle) => {
                debug!("Closing blob {} read session", self.blob_id);
                self.conn.with_client(|c| c.close_blob(handle))
            }
            None => Ok(()),
        }
    }
}

impl<C: FirebirdClient> io::Read for BlobReader<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl<C: FirebirdClient> Drop for BlobReader<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close blob {} read session: {}", self.blob_id, e);
        }
    }
}
