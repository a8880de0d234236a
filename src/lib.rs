//! A simple, embeddable time series resampling engine.
//!
//! Converts irregularly or finely sampled sensor readings into a regular,
//! coarser series: observations are bucketed into fixed-width, half-open
//! windows aligned to an anchor, and each window is reduced per column
//! (mean, sum, min, max, count, first or last).
//!
//! Every window between the first and the last observation appears in the
//! output exactly once, so consumers can rely on fixed-interval data.
//! Windows without observations either carry a missing marker or are
//! omitted, see [`EmptyWindowPolicy`].
//!
//! The engine is a pure function of its input; independent series can be
//! resampled in parallel, which is what [`Batch`] does for many files.
//!
//! Values are parsed, accumulated and written as f64, so a series that is
//! already regular passes through unchanged.
//!
//! ```
//! use fenster::{resample, Duration, Reducer, Table};
//!
//! let table = Table::from_reader(
//!     "Time_s[s],RMS[A]\n0,2.0\n65.5,4.0\n130,6.0\n720,1.0\n".as_bytes(),
//!     b',',
//! )?;
//!
//! let series = resample(
//!     &table,
//!     "Time_s[s]",
//!     &["RMS[A]"],
//!     Duration::minutes(5.0),
//!     Reducer::Mean,
//! )?;
//!
//! let mut out = vec![];
//! series.write_csv(&mut out, &Default::default())?;
//!
//! assert_eq!(
//!     "Time_s[s],RMS[A]\n0,4\n300,\n600,1\n",
//!     String::from_utf8_lossy(&out),
//! );
//!
//! # Ok::<(), fenster::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![warn(clippy::result_unit_err)]

mod agg;
mod batch;
mod config;
mod duration;
mod error;
mod resample;
mod series;
mod span;
mod table;
mod time;
mod window;

type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

pub use agg::Reducer;
pub use batch::{Batch, Job, Outcome, Report};
pub use config::{JobEntry, Manifest, Numbered};
pub use duration::Duration;
pub use error::{Error, Result};
pub use resample::{resample, AggregatedRow, AggregatedSeries, Resampler, WriteOptions};
pub use series::{Observation, SkippedValues, TimeSeries};
pub use table::Table;
pub use time::{TimeFormat, Timestamp};
pub use window::{Anchor, EmptyWindowPolicy, Window};

/// Value used in aggregated series
pub type Value = f64;
