use chrono::{offset::LocalResult, DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Resolve a local wall-clock time to an instant.
///
/// Nonexistent times (spring-forward gap) scan forward minute by minute to
/// the first valid instant; ambiguous times (fall-back fold) take the
/// earlier occurrence. This is how a schedule window start behaves across
/// DST transitions.
pub fn resolve_local_earliest(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut probe = naive;
    // DST gaps are at most a few hours in the IANA data
    for _ in 0..=240 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => return earlier.with_timezone(&Utc),
            LocalResult::None => probe += Duration::minutes(1),
        }
    }
    warn!(%naive, timezone = %tz, "Unresolvable local time, falling back to UTC reading");
    Utc.from_utc_datetime(&naive)
}

/// Resolve a local wall-clock time to an instant.
///
/// Nonexistent times scan backward to the last valid instant; ambiguous
/// times take the later occurrence. This is how a schedule window end
/// behaves across DST transitions.
pub fn resolve_local_latest(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut probe = naive;
    for _ in 0..=240 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt.with_timezone(&Utc),
            LocalResult::Ambiguous(_, later) => return later.with_timezone(&Utc),
            LocalResult::None => probe -= Duration::minutes(1),
        }
    }
    warn!(%naive, timezone = %tz, "Unresolvable local time, falling back to UTC reading");
    Utc.from_utc_datetime(&naive)
}

/// The local calendar date an instant falls on in the given timezone.
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Start of the local day containing the instant, as a UTC instant.
pub fn start_of_local_day(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let date = local_date(instant, tz);
    resolve_local_earliest(tz, date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Start of the local day after the one containing the instant.
/// Doubles as the exclusive end of the local day, intervals being half-open.
pub fn next_local_midnight(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let date = local_date(instant, tz);
    let next = date.succ_opt().unwrap_or(date);
    resolve_local_earliest(tz, next.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Ceiling-round an instant onto the slot grid: the next instant whose
/// wall-clock minute-of-day in `tz` is a multiple of `interval_minutes`.
/// An instant already on the grid is returned unchanged.
pub fn ceil_to_slot_grid(instant: DateTime<Utc>, interval_minutes: i64, tz: &Tz) -> DateTime<Utc> {
    if interval_minutes <= 0 {
        return instant;
    }
    let local = instant.with_timezone(tz);
    let mut minute_of_day = i64::from(local.hour()) * 60 + i64::from(local.minute());
    if local.second() > 0 || local.nanosecond() > 0 {
        minute_of_day += 1;
    }

    let aligned = (minute_of_day + interval_minutes - 1) / interval_minutes * interval_minutes;
    if aligned >= 24 * 60 {
        return next_local_midnight(instant, tz);
    }

    let date = local.date_naive();
    let naive = date
        .and_hms_opt(
            u32::try_from(aligned / 60).unwrap_or(0),
            u32::try_from(aligned % 60).unwrap_or(0),
            0,
        )
        .unwrap_or_default();
    resolve_local_earliest(tz, naive)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use chrono_tz::Tz;

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().to_utc()
    }

    #[test]
    fn resolves_a_nonexistent_local_time_forward() {
        // Europe/Lisbon springs forward 2025-03-30 01:00 -> 02:00
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(1, 30, 0).unwrap());
        let resolved = resolve_local_earliest(&tz, naive);
        assert_eq!(resolved, utc("2025-03-30T01:00:00Z")); // 02:00 WEST
    }

    #[test]
    fn resolves_a_nonexistent_local_time_backward() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(1, 30, 0).unwrap());
        let resolved = resolve_local_latest(&tz, naive);
        // Last valid wall-clock minute before the gap is 00:59 WET
        assert_eq!(resolved, utc("2025-03-30T00:59:00Z"));
    }

    #[test]
    fn ambiguous_fold_times_pick_the_requested_side() {
        // America/New_York falls back 2025-11-02 02:00 EDT -> 01:00 EST
        let tz: Tz = "America/New_York".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2025, 11, 2)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(1, 30, 0).unwrap());
        assert_eq!(
            resolve_local_earliest(&tz, naive),
            utc("2025-11-02T05:30:00Z") // 01:30 EDT
        );
        assert_eq!(
            resolve_local_latest(&tz, naive),
            utc("2025-11-02T06:30:00Z") // 01:30 EST
        );
    }

    #[test]
    fn ceil_to_grid_rounds_up_in_local_time() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        // 08:13 local on a UTC+0 date
        let instant = utc("2025-03-03T08:13:00Z");
        assert_eq!(
            ceil_to_slot_grid(instant, 30, &tz),
            utc("2025-03-03T08:30:00Z")
        );
        // Already aligned stays put
        assert_eq!(
            ceil_to_slot_grid(utc("2025-03-03T09:00:00Z"), 30, &tz),
            utc("2025-03-03T09:00:00Z")
        );
        // Non-zero seconds push to the next grid point
        assert_eq!(
            ceil_to_slot_grid(utc("2025-03-03T09:00:01Z"), 30, &tz),
            utc("2025-03-03T09:30:00Z")
        );
    }

    #[test]
    fn ceil_past_end_of_day_lands_on_next_midnight() {
        let tz: Tz = "Europe/Lisbon".parse().unwrap();
        let instant = utc("2025-03-03T23:45:00Z");
        assert_eq!(
            ceil_to_slot_grid(instant, 30, &tz),
            utc("2025-03-04T00:00:00Z")
        );
    }

    #[test]
    fn next_local_midnight_respects_the_timezone() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        // 2025-03-03T20:00Z is already 2025-03-04 05:00 in Tokyo
        let instant = utc("2025-03-03T20:00:00Z");
        assert_eq!(
            next_local_midnight(instant, &tz),
            utc("2025-03-04T15:00:00Z") // 2025-03-05 00:00 JST
        );
    }
}
