//! Epoch-millisecond conversions for date/time values
//!
//! `Date` is a UTC instant. Wall-clock kinds are interpreted in the
//! system's local time zone.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::{CoreError, Result};
use crate::types::TemporalKind;
use crate::value::Value;

/// Milliseconds since the Unix epoch for a date/time value
pub fn to_epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Date(instant) => Some(instant.timestamp_millis()),
        Value::LocalDateTime(wall) => Some(local_instant(wall).timestamp_millis()),
        Value::LocalDate(date) => Some(local_instant(&date.and_hms_opt(0, 0, 0)?).timestamp_millis()),
        _ => None,
    }
}

/// Build a date/time value of `kind` from epoch milliseconds
pub fn from_epoch_millis(kind: TemporalKind, millis: i64) -> Result<Value> {
    let instant = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| CoreError::type_mismatch(kind.name(), format!("epoch millis {}", millis)))?;
    Ok(match kind {
        TemporalKind::Date => Value::Date(instant),
        TemporalKind::LocalDateTime => Value::LocalDateTime(instant.with_timezone(&Local).naive_local()),
        TemporalKind::LocalDate => Value::LocalDate(instant.with_timezone(&Local).date_naive()),
    })
}

/// Convert between date/time representations through epoch milliseconds
pub fn convert(value: &Value, kind: TemporalKind) -> Result<Option<Value>> {
    if value.temporal_kind() == Some(kind) {
        return Ok(Some(value.clone()));
    }
    match to_epoch_millis(value) {
        Some(millis) => from_epoch_millis(kind, millis).map(Some),
        None => Ok(None),
    }
}

/// Resolve a wall-clock time in the local zone
fn local_instant(wall: &NaiveDateTime) -> DateTime<Local> {
    resolve_wall_time(&Local, wall)
}

/// Overlaps take the earlier instant. A time inside a gap is read with
/// the offset in force before the transition, which moves it forward.
fn resolve_wall_time<Tz: TimeZone>(zone: &Tz, wall: &NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(wall) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let probe = wall.checked_sub_signed(Duration::days(1)).unwrap_or(*wall);
            let before = zone.offset_from_utc_datetime(&probe).fix();
            let utc = wall
                .checked_sub_signed(Duration::seconds(i64::from(before.local_minus_utc())))
                .unwrap_or(*wall);
            zone.from_utc_datetime(&utc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    /// UTC until 2024-03-31 01:00 UTC, one hour ahead afterwards
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(1, 0, 0).unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            if *local < Self::switch() {
                LocalResult::Single(Self::before())
            } else if *local < Self::switch() + Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn test_gap_uses_offset_before_transition() {
        let in_gap = SpringForward::switch() + Duration::minutes(30);
        let instant = resolve_wall_time(&SpringForward, &in_gap);
        assert_eq!(instant.naive_utc(), in_gap);
        assert_eq!(instant.naive_local(), in_gap + Duration::hours(1));

        let after = SpringForward::switch() + Duration::hours(2);
        assert_eq!(
            resolve_wall_time(&SpringForward, &after).naive_utc(),
            after - Duration::hours(1)
        );
    }

    #[test]
    fn test_date_millis() {
        let value = from_epoch_millis(TemporalKind::Date, 1000).unwrap();
        assert_eq!(to_epoch_millis(&value), Some(1000));
    }

    #[test]
    fn test_local_date_time_round_trip() {
        let wall = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_milli_opt(10, 30, 0, 250)
            .unwrap();
        let millis = to_epoch_millis(&Value::LocalDateTime(wall)).unwrap();
        assert_eq!(
            from_epoch_millis(TemporalKind::LocalDateTime, millis).unwrap(),
            Value::LocalDateTime(wall)
        );
    }

    #[test]
    fn test_convert_between_kinds() {
        let date = from_epoch_millis(TemporalKind::Date, 86_400_000).unwrap();
        let wall = convert(&date, TemporalKind::LocalDateTime).unwrap().unwrap();
        let back = convert(&wall, TemporalKind::Date).unwrap().unwrap();
        assert_eq!(back, date);
        assert_eq!(convert(&Value::Int(1), TemporalKind::Date).unwrap(), None);
    }
}
