//! Shared access to the database access layer
//!
//! A cursor, the blobs read from it and their streams all talk to the
//! same client. They share it through this single threaded handle.

use rsfbdata_core::{Charset, FbError, FirebirdClient};
use std::{cell::RefCell, rc::Rc};

pub struct FbConnection<C: FirebirdClient> {
    cli: Rc<RefCell<C>>,
    charset: Charset,
    blob_buffer_len: usize,
}

impl<C: FirebirdClient> Clone for FbConnection<C> {
    fn clone(&self) -> Self {
        FbConnection {
            cli: self.cli.clone(),
            charset: self.charset.clone(),
            blob_buffer_len: self.blob_buffer_len,
        }
    }
}

impl<C: FirebirdClient> FbConnection<C> {
    /// Wraps a client, reading the charset and blob segment size negotiated
    /// with the attachment
    pub fn new(cli: C) -> Self {
        let charset = Charset::from_isc_encoding(cli.isc_encoding());
        // A zero length segment would never make progress
        let blob_buffer_len = cli.blob_buffer_len().max(1);

        debug!(
            "Connection using charset {} and blob segments of {} bytes",
            charset.on_firebird, blob_buffer_len
        );

        FbConnection {
            cli: Rc::new(RefCell::new(cli)),
            charset,
            blob_buffer_len,
        }
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Max length of the blob segments read and written
    pub fn blob_buffer_len(&self) -> usize {
        self.blob_buffer_len
    }

    /// Runs a call on the client.
    ///
    /// Fails with `IllegalState` if the client is already in use by an
    /// outer call
    pub fn with_client<R, F>(&self, f: F) -> Result<R, FbError>
    where
        F: FnOnce(&mut C) -> Result<R, FbError>,
    {
        let mut cli = self
            .cli
            .try_borrow_mut()
            .map_err(|_| FbError::illegal_state("The connection is already in use"))?;

        f(&mut cli)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::MockFbClient;

    #[test]
    fn reentrant_call_is_an_error() {
        let conn = FbConnection::new(MockFbClient::new());
        let inner = conn.clone();

        let res = conn.with_client(|_| inner.with_client(|_| Ok(())));

        assert!(matches!(res, Err(FbError::IllegalState(_))));
        assert!(conn.with_client(|_| Ok(())).is_ok());
    }

    #[test]
    fn negotiated_properties() {
        let mut cli = MockFbClient::new();
        cli.encoding = Some("WIN1252".to_string());
        cli.blob_buffer_len = 0;

        let conn = FbConnection::new(cli);

        assert_eq!(conn.charset().on_firebird, "WIN1252");
        assert!(conn.charset().on_rust.is_some());
        assert_eq!(conn.blob_buffer_len(), 1);
    }
}
