mod avg;
mod count;
mod first;
mod last;
mod max;
mod min;
mod sum;

use crate::Error;

/// Running state of one column inside one window.
///
/// `accu` is a [`crate::Value`] sum or pick, `len` the number of values seen.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub accu: f64,
    pub len: usize,
}

/// Defines an aggregation.
///
/// - `init` seeds the accumulator with the first value (default: Identity)
///
/// - `transform` defines what to do with each further value (default: Add)
///
/// - `finish` can transform the result value (default: Identity)
pub trait Aggregation {
    fn init(value: f64) -> f64 {
        value
    }

    fn transform(accu: f64, x: f64) -> f64 {
        accu + x
    }

    fn finish(cell: &Cell) -> f64 {
        cell.accu
    }
}

fn push<A: Aggregation>(cell: &mut Option<Cell>, x: f64) {
    match cell {
        Some(cell) => {
            cell.len += 1;
            cell.accu = A::transform(cell.accu, x);
        }
        None => {
            *cell = Some(Cell {
                accu: A::init(x),
                len: 1,
            });
        }
    }
}

/// Reduction applied to the values of one column inside one window.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    /// Arithmetic mean
    #[default]
    #[serde(alias = "avg", alias = "average")]
    Mean,

    /// Sum of values
    Sum,

    /// Smallest value
    Min,

    /// Largest value
    Max,

    /// Number of values; an empty window counts 0
    Count,

    /// First value in time order
    First,

    /// Last value in time order
    Last,
}

impl Reducer {
    /// All supported reducers.
    pub const ALL: [Self; 7] = [
        Self::Mean,
        Self::Sum,
        Self::Min,
        Self::Max,
        Self::Count,
        Self::First,
        Self::Last,
    ];

    /// Canonical name of the reducer.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::First => "first",
            Self::Last => "last",
        }
    }

    pub(crate) fn push(self, cell: &mut Option<Cell>, x: f64) {
        match self {
            Self::Mean => push::<avg::Avg>(cell, x),
            Self::Sum => push::<sum::Sum>(cell, x),
            Self::Min => push::<min::Min>(cell, x),
            Self::Max => push::<max::Max>(cell, x),
            Self::Count => push::<count::Count>(cell, x),
            Self::First => push::<first::First>(cell, x),
            Self::Last => push::<last::Last>(cell, x),
        }
    }

    /// Returns `None` if the cell never saw a value (empty window marker).
    pub(crate) fn finish(self, cell: Option<&Cell>) -> Option<f64> {
        let Some(cell) = cell else {
            return (self == Self::Count).then_some(0.0);
        };

        Some(match self {
            Self::Mean => avg::Avg::finish(cell),
            Self::Sum => sum::Sum::finish(cell),
            Self::Min => min::Min::finish(cell),
            Self::Max => max::Max::finish(cell),
            Self::Count => count::Count::finish(cell),
            Self::First => first::First::finish(cell),
            Self::Last => last::Last::finish(cell),
        })
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Reducer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "count" => Ok(Self::Count),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            _ => Err(Error::UnknownReducer(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    fn reduce(reducer: Reducer, values: &[f64]) -> Option<f64> {
        let mut cell = None;
        for &x in values {
            reducer.push(&mut cell, x);
        }
        reducer.finish(cell.as_ref())
    }

    #[test]
    fn reducers() {
        let values = [4.0, 2.0, 6.0];

        assert_eq!(Some(4.0), reduce(Reducer::Mean, &values));
        assert_eq!(Some(12.0), reduce(Reducer::Sum, &values));
        assert_eq!(Some(2.0), reduce(Reducer::Min, &values));
        assert_eq!(Some(6.0), reduce(Reducer::Max, &values));
        assert_eq!(Some(3.0), reduce(Reducer::Count, &values));
        assert_eq!(Some(4.0), reduce(Reducer::First, &values));
        assert_eq!(Some(6.0), reduce(Reducer::Last, &values));
    }

    #[test]
    fn reducers_empty() {
        for reducer in Reducer::ALL {
            let expected = (reducer == Reducer::Count).then_some(0.0);
            assert_eq!(expected, reduce(reducer, &[]), "{reducer}");
        }
    }

    #[test]
    fn mean_of_long_window() {
        let values = vec![0.1; 1_000_000];
        let mean = reduce(Reducer::Mean, &values).unwrap();
        assert!((mean - 0.1).abs() < 1e-9);
    }

    #[test]
    fn reducer_from_str() {
        for reducer in Reducer::ALL {
            assert_eq!(reducer, reducer.name().parse().unwrap());
        }
        assert_eq!(Reducer::Mean, "AVG".parse().unwrap());
        assert!(matches!(
            "median".parse::<Reducer>(),
            Err(Error::UnknownReducer(_))
        ));
    }
}
