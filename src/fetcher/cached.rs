use rsfbdata_core::{FbError, FirebirdClient, FreeStmtOp, RawRow, SqlData, XSqlVar};
use std::collections::VecDeque;

use super::FetchedRow;
use crate::{blob::FbBlob, connection::FbConnection};

/// Rows read to the end on creation. Blob values are read as well, so the
/// rows don't depend on the transaction anymore.
pub struct CachedFetcher {
    rows: VecDeque<RawRow>,
    row_num: usize,
}

impl CachedFetcher {
    /// Fetches every row of the executed statement, up to `max_rows` if
    /// not 0, and closes its cursor
    pub fn fetch_all<C: FirebirdClient>(
        conn: &FbConnection<C>,
        stmt: C::StmtHandle,
        xsqlvars: &[XSqlVar],
        max_rows: usize,
    ) -> Result<Self, FbError> {
        let fetched = fetch_rows(conn, stmt, xsqlvars, max_rows);
        let closed = conn.with_client(|c| c.free_statement(stmt, FreeStmtOp::Close));

        let rows = fetched?;
        closed?;

        debug!("Cached fetcher read {} rows", rows.len());

        Ok(CachedFetcher { rows, row_num: 0 })
    }

    /// Rows built in memory
    pub fn from_rows(rows: Vec<RawRow>, max_rows: usize) -> Self {
        let mut rows: VecDeque<RawRow> = rows.into();
        if max_rows != 0 {
            rows.truncate(max_rows);
        }

        CachedFetcher { rows, row_num: 0 }
    }

    pub fn row_num(&self) -> usize {
        self.row_num
    }

    /// Rows not returned yet
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn next(&mut self) -> Option<FetchedRow> {
        let values = self.rows.pop_front()?;
        self.row_num += 1;

        Some(FetchedRow {
            values,
            is_last: self.rows.is_empty(),
        })
    }
}

fn fetch_rows<C: FirebirdClient>(
    conn: &FbConnection<C>,
    stmt: C::StmtHandle,
    xsqlvars: &[XSqlVar],
    max_rows: usize,
) -> Result<VecDeque<RawRow>, FbError> {
    let mut rows = VecDeque::new();

    while max_rows == 0 || rows.len() < max_rows {
        let mut row = match conn.with_client(|c| c.fetch(stmt))? {
            Some(row) => row,
            None => break,
        };

        for (value, var) in row.iter_mut().zip(xsqlvars) {
            let is_blob = var.wire_type().map(|w| w.is_blob()).unwrap_or(false);

            let id = match value {
                Some(SqlData::Quad(id)) if is_blob => *id,
                _ => continue,
            };

            let data = FbBlob::with_id(conn.clone(), id).bytes()?;
            trace!("Cached blob {} ({} bytes)", id, data.len());

            *value = Some(SqlData::Cached(data));
        }

        rows.push_back(row);
    }

    Ok(rows)
}
