use bytes::Bytes;
use rsfbdata_core::FbError;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
/// Blob contents read before the transaction ended. Read only.
pub struct CachedBlob(Bytes);

impl CachedBlob {
    pub fn new<B: Into<Bytes>>(data: B) -> Self {
        CachedBlob(data.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// `len` bytes starting at `pos` (0 based), cut at the end of the contents
    pub fn bytes(&self, pos: usize, len: usize) -> Result<Bytes, FbError> {
        if pos > self.0.len() {
            return Err(FbError::illegal_state(format!(
                "Position {} is after the end of the blob ({} bytes)",
                pos,
                self.0.len()
            )));
        }

        let end = pos.saturating_add(len).min(self.0.len());
        Ok(self.0.slice(pos..end))
    }

    /// Reader over the contents
    pub fn reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.0.clone())
    }

    pub fn set_bytes(&self, _pos: usize, _data: &[u8]) -> Result<usize, FbError> {
        Err(read_only())
    }

    pub fn truncate(&self, _len: usize) -> Result<(), FbError> {
        Err(read_only())
    }

    /// Searching inside a blob is not supported
    pub fn position(&self, _pattern: &[u8], _start: usize) -> Result<usize, FbError> {
        Err(FbError::UnsupportedOperation("Blob position"))
    }
}

fn read_only() -> FbError {
    FbError::illegal_state("Cached blob is read-only")
}
