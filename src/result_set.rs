//! Cursor over the rows of an executed statement
//!
//! The column descriptors are reused for every row: values read from a
//! column must be copied out before moving to the next row.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rsfbdata_core::{FbError, FirebirdClient, RawRow, SqlType, XSqlVar};

use crate::{
    blob::BlobValue,
    connection::FbConnection,
    fetcher::{CachedFetcher, FbFetcher, StreamingFetcher},
    field::{BinaryStream, FbField},
    handles::BlobHandles,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    BeforeFirst,
    /// On a row. A single row is both the first and the last.
    Row {
        first: bool,
        last: bool,
    },
    AfterLast,
    /// The statement returned no rows
    Empty,
}

/// Reference to a column: 1 based index or name
pub trait ColumnIndex {
    /// 0 based position of the column
    fn position(&self, columns: &[XSqlVar]) -> Result<usize, FbError>;
}

impl ColumnIndex for usize {
    fn position(&self, columns: &[XSqlVar]) -> Result<usize, FbError> {
        if *self == 0 || *self > columns.len() {
            return Err(FbError::illegal_state(format!(
                "Invalid column index {}, the result set has {} columns",
                self,
                columns.len()
            )));
        }

        Ok(self - 1)
    }
}

impl ColumnIndex for i32 {
    fn position(&self, columns: &[XSqlVar]) -> Result<usize, FbError> {
        if *self < 1 {
            return Err(FbError::illegal_state(format!(
                "Invalid column index {}",
                self
            )));
        }

        (*self as usize).position(columns)
    }
}

/// Alias first, then the column name, ignoring the case (unicode aware)
impl ColumnIndex for &str {
    fn position(&self, columns: &[XSqlVar]) -> Result<usize, FbError> {
        if self.is_empty() {
            return Err(FbError::ColumnNotFound(String::new()));
        }

        let wanted = self.to_lowercase();
        let same = |name: &str| name.to_lowercase() == wanted;

        columns
            .iter()
            .position(|c| same(&c.aliasname))
            .or_else(|| columns.iter().position(|c| same(&c.sqlname)))
            .ok_or_else(|| FbError::ColumnNotFound(self.to_string()))
    }
}

macro_rules! getters {
    ($($name:ident -> $ty:ty),* $(,)?) => {
        $(
            pub fn $name<I: ColumnIndex>(&mut self, col: I) -> Result<$ty, FbError> {
                self.field(col)?.$name()
            }
        )*
    };
}

pub struct FbResultSet<C: FirebirdClient> {
    conn: FbConnection<C>,
    fetcher: FbFetcher<C>,
    xsqlvars: Vec<XSqlVar>,
    blobs: BlobHandles<C>,
    position: CursorPosition,
    row_num: usize,
    last_column: Option<usize>,
    max_rows: usize,
    fetch_size: usize,
    trim_strings: bool,
    closed: bool,
}

impl<C: FirebirdClient> FbResultSet<C> {
    /// Cursor fetching the rows of the executed statement as they are read.
    /// `max_rows == 0` means no limit
    pub fn streaming(
        conn: FbConnection<C>,
        stmt: C::StmtHandle,
        xsqlvars: Vec<XSqlVar>,
        max_rows: usize,
    ) -> Result<Self, FbError> {
        let fetcher = StreamingFetcher::new(conn.clone(), stmt, max_rows)?;

        Ok(Self::with_fetcher(
            conn,
            FbFetcher::Streaming(fetcher),
            xsqlvars,
            max_rows,
        ))
    }

    /// Cursor over the rows of the executed statement, all read now
    /// together with their blobs, so it outlives the transaction
    pub fn cached(
        conn: FbConnection<C>,
        stmt: C::StmtHandle,
        xsqlvars: Vec<XSqlVar>,
        max_rows: usize,
    ) -> Result<Self, FbError> {
        let fetcher = CachedFetcher::fetch_all(&conn, stmt, &xsqlvars, max_rows)?;

        Ok(Self::with_fetcher(
            conn,
            FbFetcher::Cached(fetcher),
            xsqlvars,
            max_rows,
        ))
    }

    /// Cursor over rows built in memory
    pub fn from_rows(conn: FbConnection<C>, xsqlvars: Vec<XSqlVar>, rows: Vec<RawRow>) -> Self {
        let fetcher = CachedFetcher::from_rows(rows, 0);

        Self::with_fetcher(conn, FbFetcher::Cached(fetcher), xsqlvars, 0)
    }

    fn with_fetcher(
        conn: FbConnection<C>,
        fetcher: FbFetcher<C>,
        xsqlvars: Vec<XSqlVar>,
        max_rows: usize,
    ) -> Self {
        let position = if fetcher.is_empty() {
            CursorPosition::Empty
        } else {
            CursorPosition::BeforeFirst
        };

        debug!(
            "Result set with {} columns opened ({:?})",
            xsqlvars.len(),
            position
        );

        FbResultSet {
            blobs: BlobHandles::new(conn.clone()),
            conn,
            fetcher,
            xsqlvars,
            position,
            row_num: 0,
            last_column: None,
            max_rows,
            fetch_size: 0,
            trim_strings: false,
            closed: false,
        }
    }

    /// Remove the trailing blanks of `CHAR` values
    pub fn trim_strings(mut self, trim: bool) -> Self {
        self.trim_strings = trim;
        self
    }

    fn check_open(&self) -> Result<(), FbError> {
        if self.closed {
            Err(FbError::illegal_state("The result set is closed"))
        } else {
            Ok(())
        }
    }

    /// Moves to the next row. Returns `false` when there are no more rows.
    pub fn next(&mut self) -> Result<bool, FbError> {
        self.check_open()?;
        self.last_column = None;

        let row = match self.fetcher.next()? {
            Some(row) => row,
            None => {
                self.row_num = 0;
                if self.position != CursorPosition::Empty {
                    self.position = CursorPosition::AfterLast;
                }
                return Ok(false);
            }
        };

        if row.values.len() != self.xsqlvars.len() {
            return Err(FbError::illegal_state(format!(
                "Fetched {} values for {} columns",
                row.values.len(),
                self.xsqlvars.len()
            )));
        }

        // Every value is checked before loading, so a bad one can't
        // leave the descriptors with parts of two rows
        for (var, value) in self.xsqlvars.iter().zip(&row.values) {
            if let Some(data) = value {
                var.check_data(data)?;
            }
        }

        for (var, value) in self.xsqlvars.iter_mut().zip(row.values) {
            var.load(value)?;
        }

        self.row_num += 1;
        self.position = CursorPosition::Row {
            first: self.row_num == 1,
            last: row.is_last,
        };

        Ok(true)
    }

    /// Converter for a column of the current row
    pub fn field<I: ColumnIndex>(&mut self, col: I) -> Result<FbField<'_, C>, FbError> {
        self.check_open()?;
        let idx = col.position(&self.xsqlvars)?;

        if !matches!(self.position, CursorPosition::Row { .. }) {
            return Err(FbError::illegal_state("There is no current row"));
        }
        self.last_column = Some(idx);

        FbField::for_cursor(
            &mut self.xsqlvars[idx],
            &self.conn,
            Some(&self.blobs),
            self.trim_strings,
        )
    }

    getters! {
        get_byte -> i8,
        get_short -> i16,
        get_int -> i32,
        get_long -> i64,
        get_float -> f32,
        get_double -> f64,
        get_big_decimal -> Option<BigDecimal>,
        get_boolean -> bool,
        get_string -> Option<String>,
        get_bytes -> Option<Vec<u8>>,
        get_date -> Option<NaiveDate>,
        get_time -> Option<NaiveTime>,
        get_timestamp -> Option<NaiveDateTime>,
        get_blob -> Option<BlobValue<C>>,
        get_binary_stream -> Option<BinaryStream<C>>,
        get_object -> SqlType,
    }

    /// `true` if the last column read was `NULL`
    pub fn was_null(&self) -> Result<bool, FbError> {
        self.check_open()?;

        if !matches!(self.position, CursorPosition::Row { .. }) {
            return Err(FbError::illegal_state("There is no current row"));
        }

        match self.last_column {
            Some(idx) => Ok(self.xsqlvars[idx].is_null()),
            None => Err(FbError::illegal_state("No column was read yet")),
        }
    }

    /// 1 based position of the column with the name
    pub fn find_column(&self, name: &str) -> Result<usize, FbError> {
        name.position(&self.xsqlvars).map(|idx| idx + 1)
    }

    pub fn columns(&self) -> &[XSqlVar] {
        &self.xsqlvars
    }

    pub fn column_count(&self) -> usize {
        self.xsqlvars.len()
    }

    /// Statement of a streaming cursor
    pub fn statement(&self) -> Option<C::StmtHandle> {
        self.fetcher.statement()
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    /// 1 based number of the current row, 0 if not on a row
    pub fn row(&self) -> usize {
        self.row_num
    }

    pub fn is_before_first(&self) -> bool {
        self.position == CursorPosition::BeforeFirst
    }

    pub fn is_first(&self) -> bool {
        matches!(self.position, CursorPosition::Row { first: true, .. })
    }

    pub fn is_last(&self) -> bool {
        matches!(self.position, CursorPosition::Row { last: true, .. })
    }

    pub fn is_after_last(&self) -> bool {
        self.position == CursorPosition::AfterLast
    }

    pub fn is_empty(&self) -> bool {
        self.position == CursorPosition::Empty
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn fetch_size(&self) -> usize {
        self.fetch_size
    }

    /// Hint of the rows to fetch at a time, at most `max_rows` when limited
    pub fn set_fetch_size(&mut self, rows: usize) -> Result<(), FbError> {
        if self.max_rows != 0 && rows > self.max_rows {
            return Err(FbError::illegal_state(format!(
                "Fetch size {} is greater than the max rows {}",
                rows, self.max_rows
            )));
        }

        self.fetch_size = rows;
        Ok(())
    }

    /// Closes the blob streams opened through the cursor and the server
    /// cursor. Closing twice does nothing.
    pub fn close(&mut self) -> Result<(), FbError> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        self.last_column = None;
        self.row_num = 0;

        let blobs = self.blobs.close_all();
        let fetcher = self.fetcher.close();
        self.xsqlvars.clear();

        debug!("Result set closed");

        blobs.and(fetcher)
    }
}

impl<C: FirebirdClient> Drop for FbResultSet<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close the result set: {}", e);
        }
    }
}
