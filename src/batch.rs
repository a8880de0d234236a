use crate::{Error, Resampler, Table, WriteOptions};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One dataset to resample: an input table and where to write the result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    /// Delimited text file to read
    pub input: PathBuf,

    /// Delimited text file to write
    pub output: PathBuf,
}

impl Job {
    /// Creates a job.
    pub fn new<I: Into<PathBuf>, O: Into<PathBuf>>(input: I, output: O) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Row counts of a finished job.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Report {
    /// Data rows read (header excluded)
    pub input_rows: usize,

    /// Data rows written (header excluded)
    pub output_rows: usize,

    /// Value cells skipped because they were not numeric
    pub skipped_values: usize,
}

impl Report {
    /// Percentage of rows removed by resampling.
    ///
    /// Negative if resampling added rows, e.g. when filling many empty windows.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_percent(&self) -> f64 {
        if self.input_rows == 0 {
            return 0.0;
        }

        let input = self.input_rows as f64;
        (input - self.output_rows as f64) * 100.0 / input
    }
}

/// Result of a single job; failures never abort the other jobs.
#[derive(Debug)]
pub enum Outcome {
    /// The output was written
    Done(Report),

    /// The input file does not exist
    Skipped,

    /// Reading, resampling or writing failed
    Failed(Error),
}

/// Runs a [`Resampler`] over many independent files.
///
/// Jobs are spread over a bounded worker pool; each job reads its own input
/// and writes its own output, nothing is shared between them.
///
/// ```
/// # let dir = tempfile::tempdir()?;
/// # std::fs::write(dir.path().join("press1.csv"), "t,v\n0,1\n60,3\n")?;
/// use fenster::{Batch, Job, Outcome, Resampler, Window};
///
/// let resampler = Resampler::new("t", Window::parse("5T")?).column("v");
///
/// let outcomes = Batch::new(resampler).concurrency(2).run(&[
///     Job::new(dir.path().join("press1.csv"), dir.path().join("out/press1_5min.csv")),
///     Job::new(dir.path().join("press2.csv"), dir.path().join("out/press2_5min.csv")),
/// ])?;
///
/// assert!(matches!(outcomes[0], Outcome::Done(report) if report.output_rows == 1));
/// assert!(matches!(outcomes[1], Outcome::Skipped));
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Batch {
    resampler: Resampler,
    delimiter: u8,
    write_options: WriteOptions,
    concurrency: Option<usize>,
}

impl Batch {
    /// Creates a batch that applies `resampler` to every job.
    #[must_use]
    pub fn new(resampler: Resampler) -> Self {
        Self {
            resampler,
            delimiter: b',',
            write_options: WriteOptions::default(),
            concurrency: None,
        }
    }

    /// Sets the field delimiter for reading and writing.
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self.write_options.delimiter = delimiter;
        self
    }

    /// Sets the text written for empty aggregates.
    #[must_use]
    pub fn marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.write_options.marker = marker.into();
        self
    }

    /// Maximum number of files processed at the same time.
    ///
    /// Default = available parallelism
    #[must_use]
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n.max(1));
        self
    }

    /// Runs all jobs, returning one outcome per job in job order.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started. Errors of
    /// individual jobs are reported as [`Outcome::Failed`].
    pub fn run(&self, jobs: &[Job]) -> crate::Result<Vec<Outcome>> {
        let workers = self
            .concurrency
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from))
            .min(jobs.len());

        if workers <= 1 {
            return Ok(jobs.iter().map(|job| self.run_job(job)).collect());
        }

        log::debug!("running {} jobs on {workers} workers", jobs.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("fenster-{idx}"))
            .build()
            .map_err(std::io::Error::other)?;

        Ok(pool.install(|| jobs.par_iter().map(|job| self.run_job(job)).collect()))
    }

    fn run_job(&self, job: &Job) -> Outcome {
        if !job.input.exists() {
            log::warn!("{}: input not found, skipping", job.input.display());
            return Outcome::Skipped;
        }

        match self.process(&job.input, &job.output) {
            Ok(report) => {
                log::info!(
                    "{}: {} -> {} rows",
                    job.input.display(),
                    report.input_rows,
                    report.output_rows,
                );
                Outcome::Done(report)
            }
            Err(e) => {
                log::error!("{}: {e}", job.input.display());
                Outcome::Failed(e)
            }
        }
    }

    fn process(&self, input: &Path, output: &Path) -> crate::Result<Report> {
        let table = Table::from_path(input, self.delimiter)?;
        let series = self.resampler.run(&table)?;

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        series.write_path(output, &self.write_options)?;

        Ok(Report {
            input_rows: series.input_rows(),
            output_rows: series.len(),
            skipped_values: series.skipped().total(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::Window;
    use test_log::test;

    fn resampler() -> Resampler {
        Resampler::new("Time_s[s]", Window::parse("5T").unwrap()).column("RMS[A]")
    }

    #[test]
    fn report_reduction() {
        let report = Report {
            input_rows: 1_000,
            output_rows: 45,
            skipped_values: 0,
        };
        assert!((report.reduction_percent() - 95.5).abs() < f64::EPSILON);

        let empty = Report {
            input_rows: 0,
            output_rows: 0,
            skipped_values: 0,
        };
        assert!(empty.reduction_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn batch_isolates_failures() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;

        let mut readings = String::from("Time_s[s],RMS[A]\n");
        for idx in 0..600 {
            readings.push_str(&format!("{}.5,{}\n", idx, idx % 10));
        }
        std::fs::write(dir.path().join("press1.csv"), &readings)?;
        std::fs::write(dir.path().join("press2.csv"), "Time,RMS[A]\n0,1\n")?;
        std::fs::write(dir.path().join("press4.csv"), "Time_s[s],RMS[A]\n0,x\n1,2\n")?;

        let jobs = (1..=4)
            .map(|n| {
                Job::new(
                    dir.path().join(format!("press{n}.csv")),
                    dir.path().join("processed").join(format!("press{n}_5min.csv")),
                )
            })
            .collect::<Vec<_>>();

        let outcomes = Batch::new(resampler()).concurrency(4).run(&jobs)?;

        assert_eq!(4, outcomes.len());

        let Outcome::Done(report) = &outcomes[0] else {
            panic!("press1 should succeed");
        };
        assert_eq!(600, report.input_rows);
        assert_eq!(2, report.output_rows);

        assert!(matches!(
            &outcomes[1],
            Outcome::Failed(Error::ColumnNotFound { column }) if column == "Time_s[s]"
        ));
        assert!(matches!(outcomes[2], Outcome::Skipped));
        assert!(matches!(
            outcomes[3],
            Outcome::Done(Report {
                skipped_values: 1,
                ..
            })
        ));

        let written = std::fs::read_to_string(dir.path().join("processed/press1_5min.csv"))?;
        assert_eq!("Time_s[s],RMS[A]\n0,4.5\n300,4.5\n", written);

        assert!(!dir.path().join("processed/press2_5min.csv").exists());

        Ok(())
    }

    #[test]
    fn batch_sequential_delimiter() -> crate::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("in.csv"), "Time_s[s];RMS[A]\n0;1\n700;2\n")?;

        let job = Job::new(dir.path().join("in.csv"), dir.path().join("out.csv"));
        let outcomes = Batch::new(resampler())
            .delimiter(b';')
            .marker("NA")
            .concurrency(1)
            .run(&[job])?;

        assert!(matches!(outcomes[0], Outcome::Done(_)));
        assert_eq!(
            "Time_s[s];RMS[A]\n0;1\n300;NA\n600;2\n",
            std::fs::read_to_string(dir.path().join("out.csv"))?
        );

        Ok(())
    }
}
