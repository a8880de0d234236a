use crate::span::{Parse, ParseResult, RawSpan};
use crate::Error;
use nom::{
    character::complete::{alpha1, char, digit1, space0},
    combinator::{opt, recognize},
    sequence::pair,
};

/// Helpers for calculating window widths
///
/// All helpers return nanoseconds, the unit used for timestamps and
/// window widths throughout this crate.
///
/// ```
/// use fenster::Duration;
///
/// assert_eq!(Duration::minutes(5.0), Duration::parse("5T")?);
/// assert_eq!(Duration::seconds(90.0), Duration::parse("1.5min")?);
///
/// # Ok::<(), fenster::Error>(())
/// ```
pub struct Duration;

impl Duration {
    /// Formats N weeks as nanosecond time frame.
    #[must_use]
    pub fn weeks(n: f64) -> u128 {
        Self::days(n * 7.0)
    }

    /// Formats N days as nanosecond time frame.
    #[must_use]
    pub fn days(n: f64) -> u128 {
        Self::hours(n * 24.0)
    }

    /// Formats N hours as nanosecond time frame.
    #[must_use]
    pub fn hours(n: f64) -> u128 {
        Self::minutes(n * 60.0)
    }

    /// Formats N minutes as nanosecond time frame.
    #[must_use]
    pub fn minutes(n: f64) -> u128 {
        Self::seconds(n * 60.0)
    }

    /// Formats N seconds as nanosecond time frame.
    #[must_use]
    pub fn seconds(n: f64) -> u128 {
        Self::nanos(n * 1_000_000_000.0)
    }

    /// Formats N milliseconds as nanosecond time frame.
    #[must_use]
    pub fn millis(n: f64) -> u128 {
        Self::nanos(n * 1_000_000.0)
    }

    /// Formats N microseconds as nanosecond time frame.
    #[must_use]
    pub fn micros(n: f64) -> u128 {
        Self::nanos(n * 1_000.0)
    }

    /// Formats N nanoseconds as nanosecond time frame.
    ///
    /// Negative inputs saturate to 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn nanos(n: f64) -> u128 {
        n.round() as u128
    }

    /// Parses a compact duration token into nanoseconds.
    ///
    /// A token is an optional decimal amount followed by a unit. Without an
    /// amount, the unit counts once (`T` = one minute).
    ///
    /// | unit                | meaning      |
    /// |---------------------|--------------|
    /// | `ns`, `N`           | nanoseconds  |
    /// | `us`, `U`           | microseconds |
    /// | `ms`, `L`           | milliseconds |
    /// | `s`, `S`, `sec`     | seconds      |
    /// | `min`, `m`, `T`     | minutes      |
    /// | `h`, `H`            | hours        |
    /// | `d`, `D`            | days         |
    /// | `w`, `W`            | weeks        |
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] if the token is malformed, uses an
    /// unknown unit, or amounts to zero.
    pub fn parse(token: &str) -> crate::Result<u128> {
        let invalid = |reason: &str| Error::InvalidWindow(format!("{token:?}: {reason}"));

        let (rest, parsed) = DurationToken::parse_from_raw(token)
            .map_err(|_| invalid("expected [amount]unit, e.g. 5T or 30s"))?;

        if !rest.fragment().is_empty() {
            return Err(invalid(&format!(
                "unexpected input at column {}",
                rest.get_utf8_column()
            )));
        }

        let Some(unit) = unit_nanos(parsed.unit) else {
            return Err(invalid(&format!("unknown unit {:?}", parsed.unit)));
        };

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let nanos = match parsed.amount {
            None => Some(unit),
            Some(amount) if !amount.contains('.') => amount
                .parse::<u128>()
                .ok()
                .and_then(|n| n.checked_mul(unit)),
            Some(amount) => amount
                .parse::<f64>()
                .ok()
                .map(|n| (n * unit as f64).round() as u128),
        };

        match nanos {
            Some(0) => Err(invalid("must be strictly positive")),
            Some(n) => Ok(n),
            None => Err(invalid("out of range")),
        }
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    const SECOND: u128 = 1_000_000_000;

    let nanos = match unit {
        "ns" | "N" => 1,
        "us" | "U" => 1_000,
        "ms" | "L" => 1_000_000,
        "s" | "S" | "sec" => SECOND,
        "min" | "m" | "T" => 60 * SECOND,
        "h" | "H" => 60 * 60 * SECOND,
        "d" | "D" => 24 * 60 * 60 * SECOND,
        "w" | "W" => 7 * 24 * 60 * 60 * SECOND,
        _ => return None,
    };

    Some(nanos)
}

#[derive(Debug, Eq, PartialEq)]
struct DurationToken<'a> {
    amount: Option<&'a str>,
    unit: &'a str,
}

impl<'a> Parse<'a> for DurationToken<'a> {
    fn parse(input: RawSpan<'a>) -> ParseResult<'a, Self> {
        let (input, _) = space0(input)?;
        let (input, amount) = opt(recognize(pair(digit1, opt(pair(char('.'), digit1)))))(input)?;
        let (input, _) = space0(input)?;
        let (input, unit) = alpha1(input)?;
        let (input, _) = space0(input)?;

        Ok((
            input,
            Self {
                amount: amount.map(|x| *x.fragment()),
                unit: *unit.fragment(),
            },
        ))
    }
}
