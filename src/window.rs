use crate::{time::Timestamp, Duration, Error, TimeFormat};

/// Reference point from which window boundaries are computed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Anchor {
    /// Windows start at multiples of the width from time 0
    /// (the Unix epoch for date-time columns)
    #[default]
    Epoch,

    /// Windows start at multiples of the width from the first observation
    FirstObservation,

    /// Windows start at multiples of the width from a fixed timestamp
    At(Timestamp),
}

impl std::str::FromStr for Anchor {
    type Err = Error;

    /// Accepts `epoch`, `start` (or `first`), or a timestamp in any
    /// supported time representation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "epoch" => Ok(Self::Epoch),
            "start" | "first" => Ok(Self::FirstObservation),
            other => TimeFormat::detect(other)
                .and_then(|fmt| fmt.parse(other))
                .map(Self::At)
                .ok_or_else(|| Error::InvalidWindow(format!("unknown anchor {other:?}"))),
        }
    }
}

/// What to emit for windows without any observation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyWindowPolicy {
    /// Emit a row with the missing marker in every column
    #[default]
    Emit,

    /// Drop the row
    Omit,
}

impl std::str::FromStr for EmptyWindowPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "emit" => Ok(Self::Emit),
            "omit" => Ok(Self::Omit),
            other => Err(Error::InvalidWindow(format!(
                "unknown empty window policy {other:?}"
            ))),
        }
    }
}

/// Fixed-width, half-open time windows aligned to an anchor.
///
/// A timestamp `ts` falls into window `floor((ts - origin) / width)`, which
/// covers `[origin + index * width, origin + (index + 1) * width)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Window {
    width: i128,
    anchor: Anchor,
}

impl Window {
    /// Creates windows of the given width in nanoseconds, anchored at the epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if the width is zero or too large.
    pub fn new(width: u128) -> crate::Result<Self> {
        match i128::try_from(width) {
            Ok(width) if width > 0 => Ok(Self {
                width,
                anchor: Anchor::default(),
            }),
            _ => Err(Error::InvalidWindow(format!(
                "width must be strictly positive, got {width}ns"
            ))),
        }
    }

    /// Creates windows from a duration token such as `5T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if the token is invalid.
    pub fn parse(token: &str) -> crate::Result<Self> {
        Self::new(Duration::parse(token)?)
    }

    /// Sets the anchor.
    #[must_use]
    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Window width in nanoseconds.
    #[must_use]
    pub fn width(&self) -> u128 {
        self.width.unsigned_abs()
    }

    /// Resolves the anchor for a series starting at `first_ts`.
    #[must_use]
    pub fn origin(&self, first_ts: Timestamp) -> Timestamp {
        match self.anchor {
            Anchor::Epoch => 0,
            Anchor::FirstObservation => first_ts,
            Anchor::At(ts) => ts,
        }
    }

    /// Index of the window containing `ts`.
    #[must_use]
    pub fn index(&self, origin: Timestamp, ts: Timestamp) -> i128 {
        ts.saturating_sub(origin).div_euclid(self.width)
    }

    /// Start of the window with the given index.
    #[must_use]
    pub fn start(&self, origin: Timestamp, index: i128) -> Timestamp {
        origin.saturating_add(index.saturating_mul(self.width))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use test_log::test;

    const MINUTE: i128 = 60_000_000_000;

    #[test]
    fn window_zero() {
        assert!(matches!(Window::new(0), Err(Error::InvalidWindow(_))));
        assert!(matches!(Window::new(u128::MAX), Err(Error::InvalidWindow(_))));
    }

    #[test]
    fn window_index_half_open() {
        let window = Window::parse("5T").unwrap();
        let origin = window.origin(3 * MINUTE);

        assert_eq!(0, origin);
        assert_eq!(0, window.index(origin, 0));
        assert_eq!(0, window.index(origin, 5 * MINUTE - 1));
        assert_eq!(1, window.index(origin, 5 * MINUTE));
        assert_eq!(2, window.index(origin, 12 * MINUTE));
        assert_eq!(10 * MINUTE, window.start(origin, 2));
    }

    #[test]
    fn window_index_negative() {
        let window = Window::parse("5T").unwrap();

        assert_eq!(-1, window.index(0, -1));
        assert_eq!(-1, window.index(0, -5 * MINUTE));
        assert_eq!(-2, window.index(0, -5 * MINUTE - 1));
        assert_eq!(-5 * MINUTE, window.start(0, -1));
    }

    #[test]
    fn window_anchor_first_observation() {
        let window = Window::parse("5T")
            .unwrap()
            .anchor(Anchor::FirstObservation);
        let origin = window.origin(3 * MINUTE);

        assert_eq!(3 * MINUTE, origin);
        assert_eq!(1, window.index(origin, 8 * MINUTE));
        assert_eq!(8 * MINUTE, window.start(origin, 1));
    }

    #[test]
    fn anchor_from_str() {
        assert_eq!(Anchor::Epoch, "epoch".parse().unwrap());
        assert_eq!(Anchor::FirstObservation, "start".parse().unwrap());
        assert_eq!(Anchor::At(MINUTE), "60".parse().unwrap());
        assert_eq!(
            Anchor::At(MINUTE),
            "1970-01-01 00:01:00".parse().unwrap()
        );
        assert!("noon".parse::<Anchor>().is_err());
    }
}
