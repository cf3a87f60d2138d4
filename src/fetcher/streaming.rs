use rsfbdata_core::{FbError, FirebirdClient, FreeStmtOp, RawRow};
use std::mem;

use super::FetchedRow;
use crate::connection::FbConnection;

/// Fetches the rows from the server one at a time, keeping one row of
/// lookahead to know when the current one is the last
pub struct StreamingFetcher<C: FirebirdClient> {
    conn: FbConnection<C>,
    stmt: C::StmtHandle,
    next_row: Option<RawRow>,
    max_rows: usize,
    row_num: usize,
    closed: bool,
}

impl<C: FirebirdClient> StreamingFetcher<C> {
    /// Starts fetching from an executed statement. `max_rows == 0` means
    /// no limit
    pub fn new(conn: FbConnection<C>, stmt: C::StmtHandle, max_rows: usize) -> Result<Self, FbError> {
        let next_row = conn.with_client(|c| {
            c.register_statement(stmt)?;
            c.fetch(stmt)
        })?;

        debug!(
            "Streaming fetcher opened (empty: {}, max rows: {})",
            next_row.is_none(),
            max_rows
        );

        Ok(StreamingFetcher {
            conn,
            stmt,
            next_row,
            max_rows,
            row_num: 0,
            closed: false,
        })
    }

    pub fn statement(&self) -> C::StmtHandle {
        self.stmt
    }

    /// Rows returned so far
    pub fn row_num(&self) -> usize {
        self.row_num
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// `true` if the statement returned no rows at all
    pub fn is_empty(&self) -> bool {
        self.row_num == 0 && self.next_row.is_none()
    }

    /// Next row, `None` when there are no more rows or the limit was reached
    pub fn next(&mut self) -> Result<Option<FetchedRow>, FbError> {
        if self.closed {
            return Err(FbError::illegal_state("The result set is closed"));
        }

        if self.next_row.is_none() {
            return Ok(None);
        }

        // The lookahead is not refilled past the limit. If the refill
        // fails the pending row stays for the next call.
        let at_limit = self.max_rows != 0 && self.row_num + 1 >= self.max_rows;
        let refill = if at_limit {
            None
        } else {
            let stmt = self.stmt;
            self.conn.with_client(|c| c.fetch(stmt))?
        };

        let values = match mem::replace(&mut self.next_row, refill) {
            Some(row) => row,
            None => return Ok(None),
        };
        self.row_num += 1;

        let is_last = at_limit || self.next_row.is_none();
        if is_last {
            debug!("Streaming fetcher reached the last row ({})", self.row_num);
        }

        Ok(Some(FetchedRow { values, is_last }))
    }

    /// Closes the server cursor. Closing twice does nothing.
    pub fn close(&mut self) -> Result<(), FbError> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        self.next_row = None;

        let stmt = self.stmt;
        debug!("Closing streaming fetcher after {} rows", self.row_num);
        self.conn
            .with_client(|c| c.free_statement(stmt, FreeStmtOp::Close))
    }
}

impl<C: FirebirdClient> Drop for StreamingFetcher<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close the statement cursor: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_client::{MockFbClient, ResponseStrategy};
    use rsfbdata_core::SqlData;

    fn rows(n: i32) -> Vec<RawRow> {
        (1..=n).map(|i| vec![Some(SqlData::Long(i))]).collect()
    }

    fn connection(n: i32) -> FbConnection<MockFbClient> {
        let mut cli = MockFbClient::new();
        cli.add_rows(1, rows(n));
        FbConnection::new(cli)
    }

    #[test]
    fn lookahead_marks_the_last_row() {
        let conn = connection(2);
        let mut fetcher = StreamingFetcher::new(conn.clone(), 1, 0).unwrap();

        assert_eq!(conn.with_client(|c| Ok(c.registered.clone())).unwrap(), vec![1]);

        let first = fetcher.next().unwrap().unwrap();
        assert_eq!(first.values, vec![Some(SqlData::Long(1))]);
        assert!(!first.is_last);

        let second = fetcher.next().unwrap().unwrap();
        assert!(second.is_last);

        assert!(fetcher.next().unwrap().is_none());
        assert!(fetcher.next().unwrap().is_none());
        assert_eq!(fetcher.row_num(), 2);
    }

    #[test]
    fn row_limit_is_never_exceeded() {
        let conn = connection(5);
        let mut fetcher = StreamingFetcher::new(conn.clone(), 1, 3).unwrap();

        for i in 1..=3 {
            let row = fetcher.next().unwrap().unwrap();
            assert_eq!(row.values, vec![Some(SqlData::Long(i))]);
            assert_eq!(row.is_last, i == 3);
        }

        assert!(fetcher.next().unwrap().is_none());
        assert_eq!(conn.with_client(|c| Ok(c.pending_rows(1))).unwrap(), 2);
        // The first fetch and two refills, none past the limit
        assert_eq!(conn.with_client(|c| Ok(c.fetch_calls)).unwrap(), 3);
    }

    #[test]
    fn failed_fetch_keeps_the_pending_row() {
        let conn = connection(4);
        let mut fetcher = StreamingFetcher::new(conn.clone(), 1, 0).unwrap();

        assert_eq!(fetcher.next().unwrap().unwrap().values, vec![Some(SqlData::Long(1))]);

        conn.with_client(|c| {
            c.strategy = ResponseStrategy::AlwaysFail;
            Ok(())
        })
        .unwrap();
        assert!(matches!(fetcher.next(), Err(FbError::Sql { .. })));
        assert!(fetcher.next().is_err());
        assert_eq!(fetcher.row_num(), 1);

        conn.with_client(|c| {
            c.strategy = ResponseStrategy::AlwaysSucceed;
            Ok(())
        })
        .unwrap();
        for i in 2..=4 {
            let row = fetcher.next().unwrap().unwrap();
            assert_eq!(row.values, vec![Some(SqlData::Long(i))]);
            assert_eq!(row.is_last, i == 4);
        }
        assert!(fetcher.next().unwrap().is_none());
    }

    #[test]
    fn unreliable_server_loses_no_rows() {
        let conn = connection(20);
        let mut fetcher = StreamingFetcher::new(conn.clone(), 1, 0).unwrap();
        conn.with_client(|c| {
            c.strategy = ResponseStrategy::FailRandomly;
            Ok(())
        })
        .unwrap();

        let mut seen = Vec::new();
        loop {
            match fetcher.next() {
                Ok(Some(row)) => seen.push(row.values),
                Ok(None) => break,
                // Retried until the server answers
                Err(_) => continue,
            }
        }

        assert_eq!(seen, rows(20));
    }

    #[test]
    fn empty_result() {
        let conn = connection(0);
        let mut fetcher = StreamingFetcher::new(conn, 1, 0).unwrap();

        assert!(fetcher.next().unwrap().is_none());
        assert!(fetcher.next().unwrap().is_none());
    }

    #[test]
    fn close_frees_the_statement_once() {
        let conn = connection(3);

        {
            let mut fetcher = StreamingFetcher::new(conn.clone(), 1, 0).unwrap();
            fetcher.next().unwrap();
            fetcher.close().unwrap();
            fetcher.close().unwrap();

            assert!(matches!(fetcher.next(), Err(FbError::IllegalState(_))));
        }

        assert_eq!(
            conn.with_client(|c| Ok(c.freed.clone())).unwrap(),
            vec![(1, FreeStmtOp::Close)]
        );
    }

    #[test]
    fn drop_closes() {
        let conn = connection(3);
        drop(StreamingFetcher::new(conn.clone(), 1, 0).unwrap());

        assert_eq!(conn.with_client(|c| Ok(c.freed.len())).unwrap(), 1);
    }
}
