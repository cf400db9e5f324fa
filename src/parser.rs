//! CSV parser producing an indexed [`Table`].

use std::str::FromStr;

use csv::ReaderBuilder;

use crate::error::ParseError;

/// Selects the column whose values identify each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexColumn {
    Name(String),
    Position(usize),
}

/// Per-column type hints applied while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnHint {
    /// Treat the column as a fixed-width code, left-padded with zeros.
    ZeroPad { column: String, width: usize },
}

/// A parsed CSV body: header row, index column and string cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    index: usize,
    rows: Vec<Vec<String>>,
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    position: usize,
    cells: &'a [String],
}

impl Table {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn index_column(&self) -> &str {
        &self.headers[self.index]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header row.
    pub fn column(&self, name: &str) -> Result<usize, ParseError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(move |(position, cells)| Row {
            table: self,
            position,
            cells,
        })
    }

    /// Returns the first row whose index value equals `key`.
    pub fn get(&self, key: &str) -> Option<Row<'_>> {
        self.rows().find(|row| row.index() == key)
    }
}

impl<'a> Row<'a> {
    pub fn index(&self) -> &'a str {
        &self.cells[self.table.index]
    }

    /// Raw cell value for `column`.
    pub fn get(&self, column: &str) -> Result<&'a str, ParseError> {
        let i = self.table.column(column)?;
        Ok(self.cells[i].as_str())
    }

    /// Parses the cell for `column` with [`FromStr`].
    pub fn parse<T: FromStr>(&self, column: &str) -> Result<T, ParseError> {
        let value = self.get(column)?;
        value.trim().parse().map_err(|_| self.invalid(column, value))
    }

    /// Parses a count column. Empty cells count as zero and whole-valued
    /// decimals such as `"12.0"` are accepted.
    pub fn count(&self, column: &str) -> Result<i64, ParseError> {
        let value = self.get(column)?.trim();
        if value.is_empty() {
            return Ok(0);
        }
        if let Ok(n) = value.parse::<i64>() {
            return Ok(n);
        }
        match value.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
            _ => Err(self.invalid(column, value)),
        }
    }

    pub(crate) fn invalid(&self, column: &str, value: &str) -> ParseError {
        ParseError::InvalidValue {
            row: self.position + 1,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Parses a CSV body into a [`Table`] indexed by `index`, applying `hints`.
///
/// # Errors
///
/// Returns [`ParseError::Csv`] on ragged or undecodable rows and
/// [`ParseError::MissingColumn`] if the index or a hinted column is absent.
pub fn parse_table(
    bytes: &[u8],
    index: &IndexColumn,
    hints: &[ColumnHint],
) -> Result<Table, ParseError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let index = match index {
        IndexColumn::Name(name) => headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ParseError::MissingColumn(name.clone()))?,
        IndexColumn::Position(p) if *p < headers.len() => *p,
        IndexColumn::Position(p) => return Err(ParseError::MissingColumn(format!("#{p}"))),
    };

    let mut padded = Vec::new();
    for hint in hints {
        match hint {
            ColumnHint::ZeroPad { column, width } => {
                let i = headers
                    .iter()
                    .position(|h| h == column)
                    .ok_or_else(|| ParseError::MissingColumn(column.clone()))?;
                padded.push((i, *width));
            }
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        for &(i, width) in &padded {
            let code = cells[i].trim();
            if !code.is_empty() {
                cells[i] = format!("{code:0>width$}");
            }
        }
        rows.push(cells);
    }

    Ok(Table {
        headers,
        index,
        rows,
    })
}
