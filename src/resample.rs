use crate::{
    agg::Cell,
    series::SkippedValues,
    time::Timestamp,
    window::{Anchor, EmptyWindowPolicy},
    Reducer, Table, TimeFormat, TimeSeries, Value, Window,
};
use std::{io::Write, path::Path};

/// One output row: the window start plus one aggregate per value column.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedRow {
    /// Inclusive start of the window
    pub start: Timestamp,

    /// Aggregates in column order, `None` if the window had no value
    /// for that column
    pub values: Vec<Option<Value>>,
}

/// Options for writing an [`AggregatedSeries`] as delimited text.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Text written for empty aggregates
    pub marker: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            marker: String::new(),
        }
    }
}

/// A regular time series produced by [`Resampler`].
#[derive(Clone, Debug)]
pub struct AggregatedSeries {
    time_column: String,
    columns: Vec<String>,
    format: TimeFormat,
    rows: Vec<AggregatedRow>,
    skipped: SkippedValues,
    input_rows: usize,
}

impl AggregatedSeries {
    /// Rows in ascending window order.
    #[must_use]
    pub fn rows(&self) -> &[AggregatedRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Name of the time column.
    #[must_use]
    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Names of the aggregated columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Representation used for window starts.
    #[must_use]
    pub fn format(&self) -> TimeFormat {
        self.format
    }

    /// Value cells skipped because they were not numeric.
    #[must_use]
    pub fn skipped(&self) -> &SkippedValues {
        &self.skipped
    }

    /// Number of observations that went into the series.
    #[must_use]
    pub fn input_rows(&self) -> usize {
        self.input_rows
    }

    /// Writes the series as a delimited text table with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurred.
    pub fn write_csv<W: Write>(&self, writer: W, options: &WriteOptions) -> crate::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(writer);

        writer.write_record(std::iter::once(&self.time_column).chain(&self.columns))?;

        for row in &self.rows {
            writer.write_field(self.format.format(row.start))?;

            for value in &row.values {
                match value {
                    Some(v) => writer.write_field(v.to_string())?,
                    None => writer.write_field(&options.marker)?,
                }
            }

            writer.write_record(None::<&[u8]>)?;
        }

        writer.flush()?;

        Ok(())
    }

    /// Writes the series to a file, replacing it if it exists.
    ///
    /// The table is written to a temporary file next to `path` and renamed
    /// into place once complete, so a failed write never leaves a partial
    /// output behind.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurred.
    pub fn write_path<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> crate::Result<()> {
        let path = path.as_ref();

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        self.write_csv(std::io::BufWriter::new(&mut file), options)?;

        file.as_file().sync_all()?;
        file.persist(path).map_err(std::io::Error::from)?;

        log::trace!("wrote {} rows to {}", self.rows.len(), path.display());

        Ok(())
    }
}

/// Builder for a resampling run.
///
/// ```
/// use fenster::{EmptyWindowPolicy, Reducer, Resampler, Table, Window};
///
/// let table = Table::from_rows(
///     ["Time_s[s]", "RMS[A]"],
///     [["0", "2"], ["100", "4"], ["200", "6"], ["720", "1"]],
/// );
///
/// let series = Resampler::new("Time_s[s]", Window::parse("5T")?)
///     .column("RMS[A]")
///     .reducer(Reducer::Mean)
///     .empty_windows(EmptyWindowPolicy::Omit)
///     .run(&table)?;
///
/// assert_eq!(2, series.len());
/// assert_eq!(Some(4.0), series.rows()[0].values[0]);
///
/// # Ok::<(), fenster::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Resampler {
    time_column: String,
    value_columns: Vec<String>,
    window: Window,
    reducer: Reducer,
    empty: EmptyWindowPolicy,
}

impl Resampler {
    /// Resamples `time_column` into the given windows, reducing with the
    /// mean and emitting empty windows.
    #[must_use]
    pub fn new<S: Into<String>>(time_column: S, window: Window) -> Self {
        Self {
            time_column: time_column.into(),
            value_columns: Vec::new(),
            window,
            reducer: Reducer::default(),
            empty: EmptyWindowPolicy::default(),
        }
    }

    /// Adds a value column to aggregate.
    ///
    /// Without any column, every column except the time column is aggregated.
    #[must_use]
    pub fn column<S: Into<String>>(mut self, column: S) -> Self {
        self.value_columns.push(column.into());
        self
    }

    /// Adds several value columns to aggregate.
    #[must_use]
    pub fn columns<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.value_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Sets the reduction (default: mean).
    #[must_use]
    pub fn reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    /// Sets the window anchor (default: epoch).
    #[must_use]
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.window = self.window.anchor(anchor);
        self
    }

    /// Sets what happens to windows without observations (default: emit).
    #[must_use]
    pub fn empty_windows(mut self, policy: EmptyWindowPolicy) -> Self {
        self.empty = policy;
        self
    }

    /// Parses the table and resamples it.
    ///
    /// # Errors
    ///
    /// Fails if a column is missing, the table is empty, or a timestamp
    /// cannot be parsed. Non-numeric value cells do not fail the run.
    pub fn run(&self, table: &Table) -> crate::Result<AggregatedSeries> {
        let series = TimeSeries::from_table(table, &self.time_column, &self.value_columns)?;
        Ok(self.aggregate(&series))
    }

    /// Resamples an already normalized time series.
    #[must_use]
    pub fn aggregate(&self, series: &TimeSeries) -> AggregatedSeries {
        let observations = series.observations();
        let column_count = series.columns().len();

        let mut rows = Vec::new();

        if let Some(first) = observations.first() {
            let origin = self.window.origin(first.ts);

            let mut current = self.window.index(origin, first.ts);
            let mut cells: Vec<Option<Cell>> = vec![None; column_count];

            for observation in observations {
                let index = self.window.index(origin, observation.ts);

                if index != current {
                    rows.push(self.flush(self.window.start(origin, current), &mut cells));

                    if self.empty == EmptyWindowPolicy::Emit {
                        for gap in (current + 1)..index {
                            rows.push(self.flush(self.window.start(origin, gap), &mut cells));
                        }
                    }

                    current = index;
                }

                for (cell, value) in cells.iter_mut().zip(&observation.values) {
                    if let Some(x) = value {
                        self.reducer.push(cell, *x);
                    }
                }
            }

            rows.push(self.flush(self.window.start(origin, current), &mut cells));
        }

        log::debug!(
            "resampled {} observations into {} windows of {}ns ({})",
            observations.len(),
            rows.len(),
            self.window.width(),
            self.reducer,
        );

        AggregatedSeries {
            time_column: series.time_column().to_owned(),
            columns: series.columns().to_vec(),
            format: series.format(),
            rows,
            skipped: series.skipped().clone(),
            input_rows: observations.len(),
        }
    }

    fn flush(&self, start: Timestamp, cells: &mut [Option<Cell>]) -> AggregatedRow {
        let values = cells
            .iter_mut()
            .map(|cell| self.reducer.finish(cell.take().as_ref()))
            .collect();

        AggregatedRow { start, values }
    }
}

/// Resamples a table into regular windows.
///
/// Shorthand for [`Resampler`] with the default anchor (epoch) and empty
/// window policy (emit).
///
/// ```
/// use fenster::{resample, Duration, Reducer, Table};
///
/// let table = Table::from_rows(["t", "v"], [["0", "1"], ["720", "3"]]);
/// let series = resample(&table, "t", &["v"], Duration::minutes(5.0), Reducer::Mean)?;
///
/// // windows at minute 0, 5 and 10
/// assert_eq!(3, series.len());
/// assert_eq!(None, series.rows()[1].values[0]);
///
/// # Ok::<(), fenster::Error>(())
/// ```
///
/// # Errors
///
/// - [`crate::Error::InvalidWindow`] if `window_duration` is zero, before the table is read
/// - [`crate::Error::ColumnNotFound`] if a column is missing
/// - [`crate::Error::MalformedInput`] if a timestamp cannot be parsed
pub fn resample<S: AsRef<str>>(
    table: &Table,
    time_column: &str,
    value_columns: &[S],
    window_duration: u128,
    reducer: Reducer,
) -> crate::Result<AggregatedSeries> {
    Resampler::new(time_column, Window::new(window_duration)?)
        .columns(value_columns.iter().map(|c| c.as_ref().to_owned()))
        .reducer(reducer)
        .run(table)
}
