use crate::{Anchor, Batch, EmptyWindowPolicy, Error, Job, Reducer, Resampler, Window};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const NUMBER_PLACEHOLDER: &str = "{n}";

/// Batch manifest, usually read from a TOML file.
///
/// ```toml
/// time_column = "Time_s[s]"
/// columns = ["RMS[A]"]
/// window = "5T"
/// method = "mean"
/// input_dir = "data"
/// output_dir = "processed"
///
/// [numbered]
/// input = "press {n}.csv"
/// output = "press{n}_5min.csv"
/// from = 1
/// to = 4
///
/// [[jobs]]
/// input = "hydraulics.csv"
/// output = "hydraulics_5min.csv"
/// ```
///
/// Relative job paths are resolved against `input_dir` and `output_dir`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Name of the time column
    pub time_column: String,

    /// Value columns to aggregate; all other columns if empty
    #[serde(default)]
    pub columns: Vec<String>,

    /// Window duration token, e.g. `5T`
    pub window: String,

    /// Reducer name
    #[serde(default)]
    pub method: Reducer,

    /// `epoch`, `start` or a timestamp
    #[serde(default)]
    pub anchor: Option<String>,

    /// `emit` or `omit`
    #[serde(default)]
    pub empty: EmptyWindowPolicy,

    /// Text written for empty aggregates
    #[serde(default)]
    pub marker: String,

    /// Field delimiter, a single ASCII character
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Maximum number of files processed at the same time
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Base directory for relative input paths
    #[serde(default)]
    pub input_dir: PathBuf,

    /// Base directory for relative output paths
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Jobs generated from a numbered file name pattern
    #[serde(default)]
    pub numbered: Option<Numbered>,

    /// Explicit jobs
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// Jobs for files that only differ by a number, e.g. one file per sensor.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Numbered {
    /// Input file name, `{n}` is replaced by the number
    pub input: String,

    /// Output file name, `{n}` is replaced by the number
    pub output: String,

    /// First number (inclusive)
    pub from: u32,

    /// Last number (inclusive)
    pub to: u32,
}

/// An explicit job in a manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobEntry {
    /// Input file
    pub input: PathBuf,

    /// Output file
    pub output: PathBuf,
}

fn default_delimiter() -> char {
    ','
}

impl Manifest {
    /// Parses a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not a valid manifest.
    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads a manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest.
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Builds the resampler described by the manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if the window or anchor is invalid.
    pub fn resampler(&self) -> crate::Result<Resampler> {
        let anchor = match &self.anchor {
            Some(anchor) => anchor.parse()?,
            None => Anchor::default(),
        };

        Ok(Resampler::new(&*self.time_column, Window::parse(&self.window)?)
            .columns(self.columns.iter().cloned())
            .reducer(self.method)
            .anchor(anchor)
            .empty_windows(self.empty))
    }

    /// Builds the batch described by the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the window, anchor or delimiter is invalid.
    pub fn batch(&self) -> crate::Result<Batch> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                Error::Config(format!("delimiter {:?} is not ASCII", self.delimiter))
            })?;

        let batch = Batch::new(self.resampler()?)
            .delimiter(delimiter)
            .marker(&*self.marker);

        Ok(match self.concurrency {
            Some(n) => batch.concurrency(n),
            None => batch,
        })
    }

    /// Lists all jobs: numbered ones first, then explicit ones.
    #[must_use]
    pub fn jobs(&self) -> Vec<Job> {
        let numbered = self.numbered.iter().flat_map(|numbered| {
            (numbered.from..=numbered.to).map(|n| {
                let n = n.to_string();
                (
                    PathBuf::from(numbered.input.replace(NUMBER_PLACEHOLDER, &n)),
                    PathBuf::from(numbered.output.replace(NUMBER_PLACEHOLDER, &n)),
                )
            })
        });

        let explicit = self
            .jobs
            .iter()
            .map(|job| (job.input.clone(), job.output.clone()));

        numbered
            .chain(explicit)
            .map(|(input, output)| Job::new(self.input_dir.join(input), self.output_dir.join(output)))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn parse_manifest() {
        let manifest = Manifest::parse(
            r#"
time_column = "Time_s[s]"
columns = ["RMS[A]"]
window = "5T"
method = "avg"
input_dir = "data"
output_dir = "processed"

[numbered]
input = "프레스 {n}호-유압모터 전류데이터.csv"
output = "press{n}_5min.csv"
from = 1
to = 4

[[jobs]]
input = "/abs/extra.csv"
output = "extra_5min.csv"
"#,
        )
        .unwrap();

        assert_eq!(Reducer::Mean, manifest.method);
        assert_eq!(EmptyWindowPolicy::Emit, manifest.empty);
        assert_eq!(',', manifest.delimiter);

        let jobs = manifest.jobs();
        assert_eq!(5, jobs.len());
        assert_eq!(
            Job::new(
                "data/프레스 1호-유압모터 전류데이터.csv",
                "processed/press1_5min.csv"
            ),
            jobs[0]
        );
        assert_eq!(PathBuf::from("processed/press4_5min.csv"), jobs[3].output);
        assert_eq!(PathBuf::from("/abs/extra.csv"), jobs[4].input);

        assert!(manifest.batch().is_ok());
    }

    #[test]
    fn parse_manifest_options() {
        let manifest = Manifest::parse(
            r#"
time_column = "t"
window = "30s"
method = "max"
anchor = "start"
empty = "omit"
marker = "NA"
delimiter = ";"
concurrency = 2
"#,
        )
        .unwrap();

        assert_eq!(Reducer::Max, manifest.method);
        assert_eq!(EmptyWindowPolicy::Omit, manifest.empty);
        assert!(manifest.columns.is_empty());
        assert!(manifest.jobs().is_empty());
        assert!(manifest.batch().is_ok());
    }

    #[test]
    fn parse_manifest_invalid() {
        assert!(matches!(
            Manifest::parse("window = \"5T\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Manifest::parse("time_column = \"t\"\nwindow = \"5T\"\nmethod = \"median\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Manifest::parse("time_column = \"t\"\nwindow = \"5T\"\ncolour = 1"),
            Err(Error::Config(_))
        ));

        let manifest = Manifest::parse("time_column = \"t\"\nwindow = \"0T\"").unwrap();
        assert!(matches!(manifest.batch(), Err(Error::InvalidWindow(_))));

        let manifest =
            Manifest::parse("time_column = \"t\"\nwindow = \"5T\"\ndelimiter = \"→\"").unwrap();
        assert!(matches!(manifest.batch(), Err(Error::Config(_))));
    }
}
