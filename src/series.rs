use crate::{time::Timestamp, Error, Table, TimeFormat};

/// A single time-stamped row of the selected value columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// Timestamp in nanoseconds
    pub ts: Timestamp,

    /// 1-based data row the observation was read from
    pub row: usize,

    /// One entry per selected value column, `None` if the cell was empty
    /// or not numeric
    pub values: Vec<Option<f64>>,
}

/// Number of value cells that were skipped because they were not numeric.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SkippedValues(Vec<(String, usize)>);

impl SkippedValues {
    fn new(columns: &[String]) -> Self {
        Self(columns.iter().map(|c| (c.clone(), 0)).collect())
    }

    /// Total number of skipped cells over all columns.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, n)| n).sum()
    }

    /// Skipped cells of one column.
    #[must_use]
    pub fn get(&self, column: &str) -> usize {
        self.0
            .iter()
            .find(|(c, _)| c == column)
            .map_or(0, |(_, n)| *n)
    }

    /// Iterates over `(column, skipped cells)`, including columns without skips.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(c, n)| (c.as_str(), *n))
    }
}

/// A time series normalized for resampling.
///
/// Observations are sorted ascending by timestamp. The sort is stable, so
/// rows sharing a timestamp keep their input order.
#[derive(Clone, Debug)]
pub struct TimeSeries {
    time_column: String,
    columns: Vec<String>,
    format: TimeFormat,
    observations: Vec<Observation>,
    skipped: SkippedValues,
}

impl TimeSeries {
    /// Extracts a time series from a table.
    ///
    /// If `value_columns` is empty, every column except the time column is
    /// selected.
    ///
    /// # Errors
    ///
    /// - [`Error::ColumnNotFound`] if a requested column is not in the header
    /// - [`Error::EmptySeries`] if the table has no data rows
    /// - [`Error::MalformedInput`] if a timestamp cannot be parsed
    pub fn from_table<S: AsRef<str>>(
        table: &Table,
        time_column: &str,
        value_columns: &[S],
    ) -> crate::Result<Self> {
        let time_idx = table.column(time_column)?;

        let columns: Vec<String> = if value_columns.is_empty() {
            table
                .header()
                .iter()
                .enumerate()
                .filter(|&(idx, _)| idx != time_idx)
                .map(|(_, name)| name.clone())
                .collect()
        } else {
            value_columns
                .iter()
                .map(|c| c.as_ref().to_owned())
                .collect()
        };

        let mut lookup: crate::HashMap<&str, usize> = crate::HashMap::default();
        for (idx, name) in table.header().iter().enumerate() {
            lookup.entry(name.as_str()).or_insert(idx);
        }

        let value_idx = columns
            .iter()
            .map(|name| {
                lookup
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| Error::ColumnNotFound {
                        column: name.clone(),
                    })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        if table.is_empty() {
            return Err(Error::EmptySeries);
        }

        let mut format = None;
        let mut skipped = SkippedValues::new(&columns);
        let mut observations = Vec::with_capacity(table.len());

        for (idx, record) in table.records().enumerate() {
            let row = idx + 1;
            let raw_ts = record.get(time_idx).unwrap_or_default();

            let malformed = || Error::MalformedInput {
                row,
                column: time_column.to_owned(),
                value: raw_ts.to_owned(),
            };

            let fmt = match format {
                Some(fmt) => fmt,
                None => {
                    let fmt = TimeFormat::detect(raw_ts).ok_or_else(malformed)?;
                    log::debug!("time column {time_column:?} detected as {fmt:?}");
                    *format.insert(fmt)
                }
            };

            let ts = fmt.parse(raw_ts).ok_or_else(malformed)?;

            let values = value_idx
                .iter()
                .zip(&mut skipped.0)
                .map(|(&col, (name, skip_count))| {
                    let cell = record.get(col).unwrap_or_default().trim();

                    if cell.is_empty() {
                        return None;
                    }

                    let value = cell.parse::<f64>().ok().filter(|x| x.is_finite());

                    if value.is_none() {
                        log::trace!("row {row}: skipping {cell:?} in column {name:?}");
                        *skip_count += 1;
                    }

                    value
                })
                .collect();

            observations.push(Observation { ts, row, values });
        }

        if !observations
            .windows(2)
            .all(|w| matches!(w, [a, b] if a.ts <= b.ts))
        {
            log::debug!("sorting {} observations by timestamp", observations.len());
            observations.sort_by_key(|x| x.ts);
        }

        for (column, count) in skipped.iter().filter(|(_, n)| *n > 0) {
            log::warn!("skipped {count} unparsable value(s) in column {column:?}");
        }

        Ok(Self {
            time_column: time_column.to_owned(),
            columns,
            format: format.unwrap_or(TimeFormat::Seconds),
            observations,
            skipped,
        })
    }

    /// Name of the time column.
    #[must_use]
    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Names of the selected value columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Representation of the time column.
    #[must_use]
    pub fn format(&self) -> TimeFormat {
        self.format
    }

    /// Observations in ascending time order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns `true` if there are no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Skipped value cells per column.
    #[must_use]
    pub fn skipped(&self) -> &SkippedValues {
        &self.skipped
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn series_sorted_stable() {
        let table = Table::from_rows(
            ["t", "v"],
            [["60", "1"], ["0", "2"], ["60", "3"], ["30", "4"]],
        );

        let series = TimeSeries::from_table(&table, "t", &["v"]).unwrap();

        let rows = series
            .observations()
            .iter()
            .map(|x| x.row)
            .collect::<Vec<_>>();
        assert_eq!(vec![2, 4, 1, 3], rows);
        assert_eq!(TimeFormat::Seconds, series.format());
    }

    #[test]
    fn series_skips_unparsable_values() {
        let table = Table::from_rows(
            ["t", "a", "b"],
            [["0", "x", "1"], ["1", "", "2"], ["2", "NaN", "n/a"]],
        );

        let series = TimeSeries::from_table(&table, "t", &["a", "b"]).unwrap();

        assert_eq!(2, series.skipped().get("a"));
        assert_eq!(1, series.skipped().get("b"));
        assert_eq!(3, series.skipped().total());
        assert_eq!(vec![None, Some(2.0)], series.observations()[1].values);
    }

    #[test]
    fn series_selects_all_columns() {
        let table = Table::from_rows(["a", "t", "b"], [["1", "0", "2"]]);
        let series = TimeSeries::from_table::<&str>(&table, "t", &[]).unwrap();
        assert_eq!(["a", "b"], series.columns());
        assert_eq!(vec![Some(1.0), Some(2.0)], series.observations()[0].values);
    }

    #[test]
    fn series_missing_columns() {
        let table = Table::from_rows(["t", "v"], [["0", "1"]]);

        assert!(matches!(
            TimeSeries::from_table(&table, "time", &["v"]),
            Err(Error::ColumnNotFound { column }) if column == "time"
        ));
        assert!(matches!(
            TimeSeries::from_table(&table, "t", &["v", "w"]),
            Err(Error::ColumnNotFound { column }) if column == "w"
        ));
    }

    #[test]
    fn series_malformed_timestamp() {
        let table = Table::from_rows(["t", "v"], [["0", "1"], ["soon", "2"]]);

        let Err(Error::MalformedInput { row, column, value }) =
            TimeSeries::from_table(&table, "t", &["v"])
        else {
            panic!("expected malformed input");
        };

        assert_eq!(2, row);
        assert_eq!("t", column);
        assert_eq!("soon", value);
    }

    #[test]
    fn series_mixed_time_formats() {
        let table = Table::from_rows(
            ["t", "v"],
            [["2024-01-01 00:00:00", "1"], ["60", "2"]],
        );

        assert!(matches!(
            TimeSeries::from_table(&table, "t", &["v"]),
            Err(Error::MalformedInput { row: 2, .. })
        ));
    }

    #[test]
    fn series_empty() {
        let table = Table::from_rows(["t", "v"], Vec::<Vec<&str>>::new());
        assert!(matches!(
            TimeSeries::from_table(&table, "t", &["v"]),
            Err(Error::EmptySeries)
        ));
    }
}
