//! A raw sheet grid with a known header row.
//!
//! Close workbooks put a title in the first physical row and the real header
//! in the second, so the table is built with an explicit header offset.

use crate::model::HeaderMap;
use crate::Result;
use anyhow::bail;

/// The header row sits on the second physical row of both source sheets.
pub const HEADER_OFFSET: usize = 1;

/// Rows of cell text from one sheet, with the header row parsed into a
/// [`HeaderMap`] and the preceding title rows discarded.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct SheetTable {
    headers: HeaderMap,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Parses a raw grid. `header_offset` is the zero-based index of the
    /// physical row holding the column headers; everything above it is
    /// ignored and everything below it becomes data rows.
    pub fn parse<S, R, I>(grid: I, header_offset: usize) -> Result<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let mut rows = grid
            .into_iter()
            .map(|row| row.into_iter().map(|s| s.into()).collect::<Vec<String>>())
            .skip(header_offset);

        let headers = match rows.next() {
            Some(header_row) => HeaderMap::new(header_row),
            None => bail!("The sheet has no header row at offset {header_offset}"),
        };
        if headers.is_empty() {
            bail!("The sheet's header row is empty");
        }

        Ok(Self {
            headers,
            rows: rows.collect(),
        })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the trimmed cell text at `(row, col)`, or `""` when the row is
    /// ragged and the column does not exist.
    pub fn cell<'a>(&'a self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(|s| s.trim()).unwrap_or("")
    }
}
