//! Blob values and their segment streams
//!
//! A blob is referenced by a 64 bit id, `0` while it has no value. Reads
//! and writes are done in segments of at most the length negotiated with
//! the attachment.

mod cached;
mod reader;
mod writer;

pub use cached::CachedBlob;
pub use reader::BlobReader;
pub use writer::BlobWriter;

use bytes::Bytes;
use rsfbdata_core::{FbError, FirebirdClient};
use std::{
    cell::Cell,
    io::{self, Read, Write},
};

use crate::{connection::FbConnection, handles::BlobHandles};

/// Blob stored in the database, read and written through the client
pub struct FbBlob<C: FirebirdClient> {
    conn: FbConnection<C>,
    blob_id: Cell<u64>,
    writer_open: Cell<bool>,
}

impl<C: FirebirdClient> FbBlob<C> {
    /// New blob, without a value
    pub fn new(conn: FbConnection<C>) -> Self {
        Self::with_id(conn, 0)
    }

    /// Existing blob
    pub fn with_id(conn: FbConnection<C>, blob_id: u64) -> Self {
        FbBlob {
            conn,
            blob_id: Cell::new(blob_id),
            writer_open: Cell::new(false),
        }
    }

    /// Id of the blob, `0` if it has no value yet
    pub fn id(&self) -> u64 {
        self.blob_id.get()
    }

    /// `true` once the blob has an id
    pub fn is_bound(&self) -> bool {
        self.blob_id.get() != 0
    }

    pub fn connection(&self) -> &FbConnection<C> {
        &self.conn
    }

    /// Opens a read session
    pub fn reader(&self) -> Result<BlobReader<C>, FbError> {
        BlobReader::open(self.conn.clone(), self.blob_id.get())
    }

    /// Opens a read session closed together with the cursor owning `handles`
    pub fn registered_reader(&self, handles: &BlobHandles<C>) -> Result<BlobReader<C>, FbError> {
        let reader = self.reader()?;
        handles.register(reader.slot());
        Ok(reader)
    }

    /// Opens a write session starting at `pos`.
    ///
    /// Only one write session may be open at a time, and only `pos == 0`
    /// is supported
    pub fn writer(&self, pos: u64) -> Result<BlobWriter<'_, C>, FbError> {
        if self.writer_open.get() {
            return Err(FbError::illegal_state(
                "Only one blob output stream can be open at a time",
            ));
        }

        if pos > 0 {
            return Err(if self.is_bound() {
                FbError::illegal_state("Offset start positions are not yet implemented")
            } else {
                FbError::illegal_state("Previous value was null, you must start at position 0")
            });
        }

        BlobWriter::open(self)
    }

    /// Reads the whole contents
    pub fn bytes(&self) -> Result<Bytes, FbError> {
        let mut reader = self.reader()?;
        let mut data = Vec::new();

        let res = reader
            .read_to_end(&mut data)
            .map_err(|e| FbError::Streaming {
                op: "Blob read",
                source: e,
            });

        reader.close()?;
        res?;

        Ok(data.into())
    }

    /// Writes `length` bytes from the reader as the blob contents
    pub fn copy_stream<R: Read>(&self, mut input: R, length: usize) -> Result<(), FbError> {
        let mut writer = self.writer(0)?;
        let mut buffer = vec![0; self.conn.blob_buffer_len().min(length)];
        let mut remaining = length;

        let copied: io::Result<()> = (|| {
            while remaining > 0 {
                let chunk = remaining.min(buffer.len());
                let read = input.read(&mut buffer[..chunk])?;
                if read == 0 {
                    break;
                }

                writer.write_all(&buffer[..read])?;
                remaining -= read;
            }
            writer.flush()
        })();

        if let Err(e) = copied {
            writer.cancel();

            return Err(FbError::Streaming {
                op: "Blob copy_stream",
                source: e,
            });
        }

        writer.close()
    }

    /// Writes the bytes as the blob contents
    pub fn copy_bytes(&self, data: &[u8]) -> Result<(), FbError> {
        let mut writer = self.writer(0)?;

        if let Err(e) = writer.write_segmented(data) {
            writer.cancel();
            return Err(e);
        }

        writer.close()
    }

    /// Not supported on a live blob
    pub fn length(&self) -> Result<u64, FbError> {
        Err(FbError::UnsupportedOperation("Blob length"))
    }

    /// Searching inside a blob is not supported
    pub fn position(&self, _pattern: &[u8], _start: u64) -> Result<u64, FbError> {
        Err(FbError::UnsupportedOperation("Blob position"))
    }
}

/// Blob as returned by a cursor
pub enum BlobValue<C: FirebirdClient> {
    /// Read through the client on demand
    Live(FbBlob<C>),
    /// Contents already read
    Cached(CachedBlob),
}

impl<C: FirebirdClient> BlobValue<C> {
    /// Reads the whole contents
    pub fn bytes(&self) -> Result<Bytes, FbError> {
        match self {
            BlobValue::Live(blob) => blob.bytes(),
            BlobValue::Cached(blob) => Ok(blob.as_bytes().clone()),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, BlobValue::Cached(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::MockFbClient;
    use rand::{Rng, RngCore};

    fn connection(buffer_len: usize) -> FbConnection<MockFbClient> {
        let mut cli = MockFbClient::new();
        cli.blob_buffer_len = buffer_len;
        FbConnection::new(cli)
    }

    fn write_then_read(conn: &FbConnection<MockFbClient>, data: &[u8], chunk: usize) -> Vec<u8> {
        let blob = FbBlob::new(conn.clone());
        blob.copy_bytes(data).unwrap();
        assert!(blob.is_bound());

        let mut reader = blob.reader().unwrap();
        let mut out = Vec::new();
        let mut buf = vec![0; chunk];
        loop {
            let read = reader.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            out.extend_from_slice(&buf[..read]);
        }
        reader.close().unwrap();

        out
    }

    #[test]
    fn segment_reassembly() {
        let conn = connection(16);
        let mut rng = rand::thread_rng();

        for len in [0usize, 1, 15, 16, 17, 32, 48, 100].iter() {
            let mut data = vec![0; *len];
            rng.fill_bytes(&mut data);

            for chunk in [1usize, 7, 16, 64].iter() {
                assert_eq!(write_then_read(&conn, &data, *chunk), data);
            }
        }

        let random_len = rng.gen_range(1..500);
        let mut data = vec![0; random_len];
        rng.fill_bytes(&mut data);
        assert_eq!(write_then_read(&conn, &data, 5), data);

        assert_eq!(conn.with_client(|c| Ok(c.open_handles())).unwrap(), 0);
    }

    #[test]
    fn writes_are_split_in_segments() {
        let conn = connection(4);

        let blob = FbBlob::new(conn.clone());
        blob.copy_bytes(&[1; 10]).unwrap();

        let segments = conn
            .with_client(|c| Ok(c.segments_written.clone()))
            .unwrap();
        assert_eq!(segments, vec![4, 4, 2]);
    }

    #[test]
    fn only_one_writer() {
        let conn = connection(16);
        let blob = FbBlob::new(conn);

        let mut writer = blob.writer(0).unwrap();
        assert!(matches!(blob.writer(0), Err(FbError::IllegalState(_))));

        writer.write_all(b"abc").unwrap();
        writer.close().unwrap();

        assert!(blob.writer(0).is_ok());
    }

    #[test]
    fn writer_offsets() {
        let conn = connection(16);

        let unbound = FbBlob::new(conn.clone());
        let opened = unbound.writer(3);
        match opened {
            Err(FbError::IllegalState(msg)) => assert!(msg.contains("position 0")),
            _ => panic!("expected an error"),
        }

        let bound = FbBlob::with_id(conn, 10);
        let opened = bound.writer(3);
        match opened {
            Err(FbError::IllegalState(msg)) => assert!(msg.contains("not yet implemented")),
            _ => panic!("expected an error"),
        };
    }

    #[test]
    fn id_bound_only_once() {
        let conn = connection(16);
        let blob = FbBlob::new(conn.clone());
        assert!(!blob.is_bound());

        blob.copy_bytes(b"first").unwrap();
        let id = blob.id();
        assert_ne!(id, 0);

        blob.copy_bytes(b"second").unwrap();
        assert_eq!(blob.id(), id);
        assert_eq!(blob.bytes().unwrap(), &b"first"[..]);
    }

    #[test]
    fn reading_a_new_blob_fails() {
        let conn = connection(16);
        let blob = FbBlob::new(conn);

        assert!(matches!(blob.reader(), Err(FbError::IllegalState(_))));
    }

    #[test]
    fn copy_stream_reads_only_the_length() {
        let conn = connection(4);
        let blob = FbBlob::new(conn);

        blob.copy_stream(&b"0123456789"[..], 6).unwrap();
        assert_eq!(blob.bytes().unwrap(), &b"012345"[..]);

        let short = FbBlob::new(blob.connection().clone());
        short.copy_stream(&b"01"[..], 6).unwrap();
        assert_eq!(short.bytes().unwrap(), &b"01"[..]);
    }

    #[test]
    fn copy_stream_failure_names_the_operation() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "boom"))
            }
        }

        let conn = connection(4);
        let blob = FbBlob::new(conn.clone());

        match blob.copy_stream(Failing, 10) {
            Err(FbError::Streaming { op, .. }) => assert_eq!(op, "Blob copy_stream"),
            _ => panic!("expected a streaming error"),
        }

        assert!(!blob.is_bound());
        assert!(blob.writer(0).is_ok());
        assert_eq!(conn.with_client(|c| Ok(c.open_handles())).unwrap(), 0);
    }

    #[test]
    fn unsupported_on_live_blob() {
        let conn = connection(16);
        let blob = FbBlob::with_id(conn, 1);

        assert!(matches!(
            blob.length(),
            Err(FbError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            blob.position(b"a", 0),
            Err(FbError::UnsupportedOperation(_))
        ));
    }
}
