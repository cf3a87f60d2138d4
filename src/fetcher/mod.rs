//! Strategies to get the rows of a result set

mod cached;
mod streaming;

pub use cached::CachedFetcher;
pub use streaming::StreamingFetcher;

use rsfbdata_core::{FbError, FirebirdClient, RawRow};

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    pub values: RawRow,
    /// No row will follow this one
    pub is_last: bool,
}

/// Rows streamed from the server or read in advance
pub enum FbFetcher<C: FirebirdClient> {
    Streaming(StreamingFetcher<C>),
    Cached(CachedFetcher),
}

impl<C: FirebirdClient> FbFetcher<C> {
    pub fn next(&mut self) -> Result<Option<FetchedRow>, FbError> {
        match self {
            FbFetcher::Streaming(f) => f.next(),
            FbFetcher::Cached(f) => Ok(f.next()),
        }
    }

    /// Statement the rows come from, `None` for cached rows
    pub fn statement(&self) -> Option<C::StmtHandle> {
        match self {
            FbFetcher::Streaming(f) => Some(f.statement()),
            FbFetcher::Cached(_) => None,
        }
    }

    pub fn row_num(&self) -> usize {
        match self {
            FbFetcher::Streaming(f) => f.row_num(),
            FbFetcher::Cached(f) => f.row_num(),
        }
    }

    /// `true` if there were no rows at all
    pub fn is_empty(&self) -> bool {
        match self {
            FbFetcher::Streaming(f) => f.is_empty(),
            FbFetcher::Cached(f) => f.row_num() == 0 && f.remaining() == 0,
        }
    }

    /// Releases the server cursor. Cached rows hold none.
    pub fn close(&mut self) -> Result<(), FbError> {
        match self {
            FbFetcher::Streaming(f) => f.close(),
            FbFetcher::Cached(_) => Ok(()),
        }
    }
}
