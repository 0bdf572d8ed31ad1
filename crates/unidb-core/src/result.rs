//! Normalized result sets.
//!
//! Every statement execution produces a [`ResultSet`], whether or not
//! the native call returned rows. Row-producing statements yield a
//! query result (buffered or streamed); INSERT/UPDATE/DDL yield a
//! result whose iteration is empty but whose affected-row count and
//! generated value are populated.
//!
//! Streamed results borrow their producer mutably, so the shared-cursor
//! hazard of forward-only native cursors is a compile error here: the
//! connection cannot issue another statement while a stream is open.
//! Call [`ResultSet::buffer`] to detach.

use crate::error::{Error, Result, StateErrorKind};
use crate::row::{ColumnInfo, Row};
use std::fmt;
use std::sync::Arc;

/// A forward-only source of rows backed by a live native cursor.
pub trait RowStream {
    /// Fetch the next row, `None` when exhausted.
    fn next_row(&mut self) -> Option<Result<Row>>;

    /// Column metadata for the rows this stream produces.
    fn columns(&self) -> Arc<ColumnInfo>;
}

enum Rows<'a> {
    Buffered { rows: Vec<Row>, pos: usize },
    Streamed(Box<dyn RowStream + 'a>),
}

/// A normalized result set.
pub struct ResultSet<'a> {
    columns: Option<Arc<ColumnInfo>>,
    rows: Rows<'a>,
    is_query: bool,
    affected: u64,
    generated: Option<String>,
}

impl<'a> ResultSet<'a> {
    /// A fully materialized query result: restartable and seekable.
    pub fn buffered(columns: Arc<ColumnInfo>, rows: Vec<Row>) -> ResultSet<'static> {
        ResultSet {
            columns: Some(columns),
            rows: Rows::Buffered { rows, pos: 0 },
            is_query: true,
            affected: 0,
            generated: None,
        }
    }

    /// A forward-only query result over a live native cursor.
    pub fn streamed(stream: Box<dyn RowStream + 'a>) -> ResultSet<'a> {
        let columns = stream.columns();
        ResultSet {
            columns: Some(columns),
            rows: Rows::Streamed(stream),
            is_query: true,
            affected: 0,
            generated: None,
        }
    }

    /// A rowless result carrying only the affected count and the
    /// generated value, for statements that produce no row data.
    pub fn affected(count: u64, generated: Option<String>) -> ResultSet<'static> {
        ResultSet {
            columns: None,
            rows: Rows::Buffered {
                rows: Vec::new(),
                pos: 0,
            },
            is_query: false,
            affected: count,
            generated,
        }
    }

    /// True if rows are retrievable from this result.
    pub fn is_query_result(&self) -> bool {
        self.is_query
    }

    /// Rows affected by the statement (0 for plain queries).
    pub fn affected_rows(&self) -> u64 {
        self.affected
    }

    /// The auto-generated identifier from the statement, if any.
    pub fn generated_value(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    /// Column metadata, present for query results.
    pub fn columns(&self) -> Option<&Arc<ColumnInfo>> {
        self.columns.as_ref()
    }

    /// True when all rows are materialized client-side.
    pub fn is_buffered(&self) -> bool {
        matches!(self.rows, Rows::Buffered { .. })
    }

    /// Number of rows, known only for buffered results.
    pub fn len(&self) -> Option<usize> {
        match &self.rows {
            Rows::Buffered { rows, .. } => Some(rows.len()),
            Rows::Streamed(_) => None,
        }
    }

    /// True when a buffered result holds no rows. Streamed results
    /// report `false`: emptiness is unknown until iterated.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Random access into a buffered result. `None` for streamed
    /// results or out-of-range indexes.
    pub fn get(&self, index: usize) -> Option<&Row> {
        match &self.rows {
            Rows::Buffered { rows, .. } => rows.get(index),
            Rows::Streamed(_) => None,
        }
    }

    /// Restart iteration from the first row.
    ///
    /// Fails with `IllegalState` on a streamed result: a forward-only
    /// cursor cannot seek.
    pub fn rewind(&mut self) -> Result<()> {
        match &mut self.rows {
            Rows::Buffered { pos, .. } => {
                *pos = 0;
                Ok(())
            }
            Rows::Streamed(_) => Err(Error::illegal_state(
                StateErrorKind::ForwardOnlyResult,
                "cannot rewind an unbuffered result",
            )),
        }
    }

    /// Drain a streamed result into the buffered, detached form.
    ///
    /// Buffered results pass through unchanged (remaining rows and
    /// iteration position are preserved as a fresh buffer).
    pub fn buffer(self) -> Result<ResultSet<'static>> {
        let ResultSet {
            columns,
            rows,
            is_query,
            affected,
            generated,
        } = self;
        let buffered = match rows {
            Rows::Buffered { rows, pos } => Rows::Buffered { rows, pos },
            Rows::Streamed(mut stream) => {
                let mut collected = Vec::new();
                while let Some(row) = stream.next_row() {
                    collected.push(row?);
                }
                Rows::Buffered {
                    rows: collected,
                    pos: 0,
                }
            }
        };
        Ok(ResultSet {
            columns,
            rows: buffered,
            is_query,
            affected,
            generated,
        })
    }
}

impl Iterator for ResultSet<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.rows {
            Rows::Buffered { rows, pos } => {
                let row = rows.get(*pos)?.clone();
                *pos += 1;
                Some(Ok(row))
            }
            Rows::Streamed(stream) => stream.next_row(),
        }
    }
}

impl fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("is_query", &self.is_query)
            .field("buffered", &self.is_buffered())
            .field("len", &self.len())
            .field("affected", &self.affected)
            .field("generated", &self.generated)
            .finish()
    }
}
