use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Timestamp in nanoseconds.
///
/// Numeric time columns count seconds from 0, date-time columns count from
/// the Unix epoch (UTC).
pub type Timestamp = i128;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Representation of a time column.
///
/// Detected from the first data row; every other row must use the same
/// representation. Window starts are written back in it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeFormat {
    /// Plain (possibly fractional) seconds, e.g. `12.5`
    Seconds,

    /// Date-time without offset, interpreted as UTC, e.g. `2024-03-01 12:00:00`
    DateTime,

    /// RFC 3339 date-time with offset, e.g. `2024-03-01T12:00:00+09:00`
    ///
    /// Rows may use any offset; output is written in the offset of the
    /// first row.
    Rfc3339(FixedOffset),
}

impl TimeFormat {
    /// Detects the representation of a raw time cell.
    #[must_use]
    pub fn detect(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if parse_seconds(raw).is_some() {
            return Some(Self::Seconds);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::Rfc3339(*dt.offset()));
        }

        parse_naive(raw).map(|_| Self::DateTime)
    }

    /// Parses a raw time cell into nanoseconds.
    #[must_use]
    pub fn parse(self, raw: &str) -> Option<Timestamp> {
        let raw = raw.trim();

        match self {
            Self::Seconds => parse_seconds(raw),
            Self::Rfc3339(_) => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| to_nanos(dt.timestamp(), dt.timestamp_subsec_nanos())),
            Self::DateTime => parse_naive(raw)
                .map(|dt| to_nanos(dt.and_utc().timestamp(), dt.and_utc().timestamp_subsec_nanos())),
        }
    }

    /// Formats a timestamp in this representation.
    #[must_use]
    pub fn format(self, ts: Timestamp) -> String {
        match self {
            Self::Seconds => format_seconds(ts),
            Self::DateTime => to_datetime(ts).map_or_else(
                || format_seconds(ts),
                |dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            ),
            Self::Rfc3339(offset) => to_datetime(ts).map_or_else(
                || format_seconds(ts),
                |dt| {
                    dt.with_timezone(&offset)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                },
            ),
        }
    }
}

fn to_nanos(secs: i64, subsec_nanos: u32) -> Timestamp {
    i128::from(secs) * NANOS_PER_SECOND + i128::from(subsec_nanos)
}

fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(ts.div_euclid(NANOS_PER_SECOND)).ok()?;
    let nanos = u32::try_from(ts.rem_euclid(NANOS_PER_SECOND)).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parses decimal seconds without going through a float, so nanosecond
/// digits survive. Exponent notation falls back to `f64`.
fn parse_seconds(raw: &str) -> Option<Timestamp> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let is_decimal = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_decimal(whole) || !is_decimal(frac) {
        return parse_scientific(raw);
    }

    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    // NOTE: Digits beyond nanoseconds are truncated
    let frac = frac.get(..9).unwrap_or(frac);
    let frac: i128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<9}").parse().ok()?
    };

    let nanos = whole.checked_mul(NANOS_PER_SECOND)?.checked_add(frac)?;

    Some(if negative { -nanos } else { nanos })
}

#[allow(clippy::cast_possible_truncation)]
fn parse_scientific(raw: &str) -> Option<Timestamp> {
    let secs = raw.parse::<f64>().ok().filter(|x| x.is_finite())?;
    Some((secs * 1_000_000_000.0).round() as i128)
}

fn format_seconds(ts: Timestamp) -> String {
    let sign = if ts < 0 { "-" } else { "" };
    let abs = ts.unsigned_abs();

    let nanos_per_second = NANOS_PER_SECOND.unsigned_abs();
    let whole = abs / nanos_per_second;
    let frac = abs % nanos_per_second;

    if frac == 0 {
        format!("{sign}{whole}")
    } else {
        let frac = format!("{frac:09}");
        format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
    }
}
