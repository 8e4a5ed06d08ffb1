use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDateTime, Offset, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// A departure or arrival time as exported: with a timezone when the export
/// names one, otherwise wall-clock only.
///
/// Equality and ordering both compare the instant, so an aware value equals
/// a naive one that reads the same in UTC.
#[derive(Debug, Clone, Copy)]
pub enum Timestamp {
    Aware(DateTime<Tz>),
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Parses `YYYY-MM-DD HH:MM:SS[.ffffff]`. Unknown timezone ids leave the
    /// value naive. A local time inside a DST gap takes the offset in effect
    /// just before the gap.
    pub fn parse(raw: Option<&str>, tzid: Option<&str>) -> Option<Timestamp> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }

        let naive = FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())?;

        let aware = tzid
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .and_then(|id| id.parse::<Tz>().ok())
            .and_then(|tz| {
                tz.from_local_datetime(&naive)
                    .earliest()
                    .or_else(|| before_gap(tz, naive))
            });

        Some(match aware {
            Some(dt) => Timestamp::Aware(dt),
            None => Timestamp::Naive(naive),
        })
    }

    /// Calendar year in the timestamp's own timezone.
    pub fn year(&self) -> i32 {
        match self {
            Timestamp::Aware(dt) => dt.year(),
            Timestamp::Naive(dt) => dt.year(),
        }
    }

    /// Point on a single timeline used for ordering; naive values are read as UTC.
    fn instant(&self) -> NaiveDateTime {
        match self {
            Timestamp::Aware(dt) => dt.naive_utc(),
            Timestamp::Naive(dt) => *dt,
        }
    }

    /// ISO 8601; aware values are converted to UTC and carry `+00:00`.
    /// Fractional seconds appear only when non-zero, in microseconds.
    pub fn to_iso(&self) -> String {
        match self {
            Timestamp::Aware(dt) => {
                format!("{}+00:00", iso_local(&dt.with_timezone(&Utc).naive_utc()))
            }
            Timestamp::Naive(dt) => iso_local(dt),
        }
    }
}

/// Places a skipped local time using the offset of the last valid local
/// time before it. Gaps never exceed a day.
fn before_gap(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    let offset = (1..=24)
        .filter_map(|hours| naive.checked_sub_signed(TimeDelta::hours(hours)))
        .find_map(|earlier| tz.from_local_datetime(&earlier).latest())?
        .offset()
        .fix();
    let utc = naive.checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc().into()))?;
    Some(tz.from_utc_datetime(&utc))
}

fn iso_local(dt: &NaiveDateTime) -> String {
    let base = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    match dt.nanosecond() / 1_000 {
        0 => base,
        micros => format!("{base}.{micros:06}"),
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant() == other.instant()
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant().cmp(&other.instant())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_fraction() {
        let ts = Timestamp::parse(Some("2024-03-01 08:15:00.000000"), None).unwrap();
        assert!(matches!(ts, Timestamp::Naive(_)));
        assert_eq!(ts.to_iso(), "2024-03-01T08:15:00");
        assert_eq!(ts.year(), 2024);
    }

    #[test]
    fn test_parse_without_fraction() {
        let ts = Timestamp::parse(Some(" 2024-03-01 08:15:00 "), None).unwrap();
        assert_eq!(ts.to_iso(), "2024-03-01T08:15:00");
    }

    #[test]
    fn test_keeps_microseconds() {
        let ts = Timestamp::parse(Some("2024-03-01 08:15:00.250000"), None).unwrap();
        assert_eq!(ts.to_iso(), "2024-03-01T08:15:00.250000");
    }

    #[test]
    fn test_unparseable_is_absent() {
        assert_eq!(Timestamp::parse(Some("not-a-date"), None), None);
        assert_eq!(Timestamp::parse(Some("2024-03-01"), Some("Europe/Berlin")), None);
        assert_eq!(Timestamp::parse(Some(""), None), None);
        assert_eq!(Timestamp::parse(None, Some("UTC")), None);
    }

    #[test]
    fn test_timezone_normalized_to_utc() {
        let ts = Timestamp::parse(Some("2024-03-01 08:15:00.000000"), Some("Europe/Berlin")).unwrap();
        assert!(matches!(ts, Timestamp::Aware(_)));
        assert_eq!(ts.to_iso(), "2024-03-01T07:15:00+00:00");
    }

    #[test]
    fn test_year_uses_local_calendar() {
        let ts = Timestamp::parse(Some("2024-01-01 00:30:00"), Some("Europe/Berlin")).unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.to_iso(), "2023-12-31T23:30:00+00:00");
    }

    #[test]
    fn test_unknown_timezone_stays_naive() {
        let ts = Timestamp::parse(Some("2024-03-01 08:15:00"), Some("Mars/Olympus_Mons")).unwrap();
        assert!(matches!(ts, Timestamp::Naive(_)));
    }

    #[test]
    fn test_dst_gap_keeps_timezone() {
        let ts = Timestamp::parse(Some("2024-03-31 02:30:00"), Some("Europe/Berlin")).unwrap();
        assert!(matches!(ts, Timestamp::Aware(_)));
        assert_eq!(ts.to_iso(), "2024-03-31T01:30:00+00:00");
        assert_eq!(ts.year(), 2024);
    }

    #[test]
    fn test_equality_follows_instant() {
        let berlin = Timestamp::parse(Some("2024-03-01 09:00:00"), Some("Europe/Berlin")).unwrap();
        let utc = Timestamp::parse(Some("2024-03-01 08:00:00"), Some("UTC")).unwrap();
        let naive = Timestamp::parse(Some("2024-03-01 08:00:00"), None).unwrap();

        assert_eq!(berlin, utc);
        assert_eq!(utc, naive);
        assert_eq!(berlin.cmp(&naive), Ordering::Equal);
        assert_ne!(naive, Timestamp::parse(Some("2024-03-01 09:00:00"), None).unwrap());
    }

    #[test]
    fn test_ordering_across_timezones() {
        let tokyo = Timestamp::parse(Some("2024-03-01 10:00:00"), Some("Asia/Tokyo")).unwrap();
        let london = Timestamp::parse(Some("2024-03-01 09:00:00"), Some("Europe/London")).unwrap();
        assert!(tokyo < london);
        assert_eq!(std::cmp::min(tokyo, london), tokyo);
    }
}
