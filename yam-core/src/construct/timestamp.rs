use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

const YMD: &str = r"^([0-9][0-9][0-9][0-9])-([0-9][0-9]?)-([0-9][0-9]?)$";
const DATE_TIME: &str = r"^([0-9][0-9][0-9][0-9])-([0-9][0-9]?)-([0-9][0-9]?)(?:(?:[Tt]|[ \t]+)([0-9][0-9]?):([0-9][0-9]):([0-9][0-9])(?:\.([0-9]*))?(?:[ \t]*(?:Z|([-+][0-9][0-9]?)(?::([0-9][0-9])?)?))?)?$";

const SECONDS_PER_DAY: i64 = 86_400;

fn ymd_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(YMD).ok()).as_ref()
}

fn date_time_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(DATE_TIME).ok()).as_ref()
}

///
/// A point in time, kept in UTC.
///
/// Offsets written in the source are applied when parsing, so
/// `2001-12-14t21:59:43.10-05:00` and `2001-12-15T02:59:43.1Z` are equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    /// Seconds since 1970-01-01T00:00:00Z.
    seconds: i64,
    nanos: u32,
    date_only: bool,
}

impl Timestamp {
    #[must_use]
    pub fn from_date(year: i64, month: u32, day: u32) -> Timestamp {
        Timestamp {
            seconds: days_from_civil(year, month, day) * SECONDS_PER_DAY,
            nanos: 0,
            date_only: true,
        }
    }

    #[must_use]
    pub fn from_unix(seconds: i64, nanos: u32) -> Timestamp {
        Timestamp {
            seconds: seconds + i64::from(nanos / 1_000_000_000),
            nanos: nanos % 1_000_000_000,
            date_only: false,
        }
    }

    /// Parses the YAML timestamp forms: a bare date, or a date and time with an
    /// optional fraction and an optional `Z`/`±HH[:MM]` offset.
    #[must_use]
    pub fn parse(value: &str) -> Option<Timestamp> {
        if let Some(caps) = ymd_regex()?.captures(value) {
            let year = caps.get(1)?.as_str().parse().ok()?;
            let month = caps.get(2)?.as_str().parse().ok()?;
            let day = caps.get(3)?.as_str().parse().ok()?;
            return Some(Timestamp::from_date(year, month, day));
        }
        let caps = date_time_regex()?.captures(value)?;
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        let day = caps.get(3)?.as_str().parse().ok()?;
        let number = |i: usize| -> Option<i64> {
            caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
        };
        let hour = number(4)?;
        let minute = number(5)?;
        let second = number(6)?;
        let nanos = match caps.get(7) {
            Some(fraction) => {
                let digits: String = fraction.as_str().chars().take(9).collect();
                format!("{digits:0<9}").parse().ok()?
            }
            None => 0,
        };
        let mut offset = 0;
        if let Some(hours) = caps.get(8) {
            let hours: i64 = hours.as_str().parse().ok()?;
            let minutes: i64 = number(9)?;
            let sign = if hours < 0 || caps.get(8)?.as_str().starts_with('-') {
                -1
            } else {
                1
            };
            offset = hours * 3600 + sign * minutes * 60;
        }

        let seconds = days_from_civil(year, month, day) * SECONDS_PER_DAY
            + hour * 3600
            + minute * 60
            + second
            - offset;
        Some(Timestamp::from_unix(seconds, nanos))
    }

    #[must_use]
    pub fn unix_seconds(&self) -> i64 {
        self.seconds
    }

    #[must_use]
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    #[must_use]
    pub fn is_date_only(&self) -> bool {
        self.date_only
    }

    /// `(year, month, day)` in UTC.
    #[must_use]
    pub fn date(&self) -> (i64, u32, u32) {
        civil_from_days(self.seconds.div_euclid(SECONDS_PER_DAY))
    }

    /// `(hour, minute, second)` in UTC.
    #[must_use]
    pub fn time(&self) -> (u32, u32, u32) {
        let secs = self.seconds.rem_euclid(SECONDS_PER_DAY);
        // all three fit in u32 since secs < 86400
        (
            (secs / 3600) as u32,
            (secs % 3600 / 60) as u32,
            (secs % 60) as u32,
        )
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (year, month, day) = self.date();
        write!(f, "{year:04}-{month:02}-{day:02}")?;
        let (hour, minute, second) = self.time();
        if self.date_only && hour == 0 && minute == 0 && second == 0 && self.nanos == 0 {
            return Ok(());
        }
        write!(f, "T{hour:02}:{minute:02}:{second:02}")?;
        if self.nanos > 0 {
            let fraction = format!("{:09}", self.nanos);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        f.write_str("Z")
    }
}

fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let month = i64::from(month);
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
