use crate::Error;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{fs::File, io::Read, path::Path};

/// A delimited text table with a header row.
///
/// Cells are kept as raw text; interpretation happens when a
/// [`crate::TimeSeries`] is built from the table.
#[derive(Clone, Debug, Default)]
pub struct Table {
    header: Vec<String>,
    records: Vec<StringRecord>,
}

impl Table {
    /// Builds a table from in-memory rows.
    ///
    /// ```
    /// use fenster::Table;
    ///
    /// let table = Table::from_rows(["t", "v"], [["0", "2"], ["60", "4"]]);
    /// assert_eq!(2, table.len());
    /// ```
    pub fn from_rows<H, R, C>(header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let header = header.into_iter().map(Into::into).collect();
        let records = rows
            .into_iter()
            .map(|row| row.into_iter().collect::<StringRecord>())
            .collect();

        Self { header, records }
    }

    /// Reads a table from a delimited text source.
    ///
    /// The first line is the header; every row must have as many fields as
    /// the header.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurred or a row is ragged.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> crate::Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                // NOTE: Excel likes to prepend a BOM
                if idx == 0 {
                    name.trim_start_matches('\u{feff}').to_owned()
                } else {
                    name.to_owned()
                }
            })
            .collect::<Vec<_>>();

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        log::trace!("read table with {} columns, {} rows", header.len(), records.len());

        Ok(Self { header, records })
    }

    /// Reads a table from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> crate::Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file), delimiter)
    }

    /// Column names, in file order.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of data rows (header excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column in the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if no header cell has that name.
    pub fn column(&self, name: &str) -> crate::Result<usize> {
        self.header
            .iter()
            .position(|x| x == name)
            .ok_or_else(|| Error::ColumnNotFound {
                column: name.to_owned(),
            })
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &StringRecord> {
        self.records.iter()
    }
}
