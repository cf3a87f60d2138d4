use rsfbdata_core::{FbError, FirebirdClient};
use std::io;

use super::FbBlob;

/// Write session of a blob.
///
/// Each write is sent as one or more segments of at most the negotiated
/// length. The blob receives its id when the first session closes.
pub struct BlobWriter<'b, C: FirebirdClient> {
    blob: &'b FbBlob<C>,
    handle: Option<C::BlobHandle>,
    pending_id: u64,
}

impl<'b, C: FirebirdClient> BlobWriter<'b, C> {
    pub(super) fn open(blob: &'b FbBlob<C>) -> Result<Self, FbError> {
        let (handle, pending_id) = blob.conn.with_client(|c| c.create_blob())?;
        blob.writer_open.set(true);

        debug!("Created blob {} for writing", pending_id);

        Ok(BlobWriter {
            blob,
            handle: Some(handle),
            pending_id,
        })
    }

    /// Sends the data, splitting it in segments
    pub fn write_segmented(&mut self, data: &[u8]) -> Result<(), FbError> {
        let handle = self
            .handle
            .ok_or_else(|| FbError::illegal_state("The blob stream is closed"))?;
        let conn = &self.blob.conn;

        for segment in data.chunks(conn.blob_buffer_len()) {
            conn.with_client(|c| c.put_segment(handle, segment))?;
            trace!(
                "Wrote segment of {} bytes to blob {}",
                segment.len(),
                self.pending_id
            );
        }

        Ok(())
    }

    /// Single byte writes are not supported, buffer the bytes and
    /// use `write_segmented`
    pub fn write_byte(&mut self, _byte: u8) -> Result<(), FbError> {
        Err(FbError::UnsupportedOperation("Single byte blob write"))
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Releases the server handle. If the blob had no id yet, it is bound
    /// to the one of the written data.
    pub fn close(&mut self) -> Result<(), FbError> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        self.blob.writer_open.set(false);
        self.blob.conn.with_client(|c| c.close_blob(handle))?;

        if !self.blob.is_bound() {
            self.blob.blob_id.set(self.pending_id);
        }
        debug!("Closed blob {} write session", self.pending_id);

        Ok(())
    }

    /// Releases the server handle without binding the blob
    pub(super) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.blob.writer_open.set(false);

            if let Err(e) = self.blob.conn.with_client(|c| c.close_blob(handle)) {
                warn!("Failed to close blob {} write session: {}", self.pending_id, e);
            }
        }
    }
}

impl<C: FirebirdClient> io::Write for BlobWriter<'_, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_segmented(buf)
            .map(|_| buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: FirebirdClient> Drop for BlobWriter<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close blob {} write session: {}", self.pending_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connection::FbConnection, mock_client::MockFbClient};
    use std::io::Write;

    #[test]
    fn single_byte_write_is_unsupported() {
        let conn = FbConnection::new(MockFbClient::new());
        let blob = FbBlob::new(conn);
        let mut writer = blob.writer(0).unwrap();

        assert!(matches!(
            writer.write_byte(1),
            Err(FbError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn id_is_bound_on_close() {
        let conn = FbConnection::new(MockFbClient::new());
        let blob = FbBlob::new(conn.clone());

        let mut writer = blob.writer(0).unwrap();
        writer.write_all(b"data").unwrap();
        assert!(!blob.is_bound());

        writer.close().unwrap();
        assert!(writer.is_closed());
        assert!(blob.is_bound());

        let stored = conn
            .with_client(|c| Ok(c.blob(blob.id()).map(|b| b.to_vec())))
            .unwrap();
        assert_eq!(stored, Some(b"data".to_vec()));
    }

    #[test]
    fn drop_closes_and_binds() {
        let conn = FbConnection::new(MockFbClient::new());
        let blob = FbBlob::new(conn.clone());

        {
            let mut writer = blob.writer(0).unwrap();
            writer.write_all(b"xyz").unwrap();
        }

        assert!(blob.is_bound());
        assert_eq!(conn.with_client(|c| Ok(c.open_handles())).unwrap(), 0);
        assert_eq!(blob.bytes().unwrap(), &b"xyz"[..]);
    }

    #[test]
    fn write_after_close_fails() {
        let conn = FbConnection::new(MockFbClient::new());
        let blob = FbBlob::new(conn);

        let mut writer = blob.writer(0).unwrap();
        writer.close().unwrap();

        assert!(matches!(
            writer.write_segmented(b"a"),
            Err(FbError::IllegalState(_))
        ));
    }
}
