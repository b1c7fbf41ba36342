use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    date::{local_date, resolve_local_earliest, resolve_local_latest},
    interval::{Interval, IntervalSet},
    shared::entity::ExpertId,
    timespan::TimeSpan,
};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
const MAX_WINDOWS_PER_WEEKDAY: usize = 10;

/// A weekly availability window expressed as wall-clock minutes in the
/// expert's home timezone. Half-open: `[start_minute, end_minute)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    pub weekday: Weekday,
    pub start_minute: u32,
    pub end_minute: u32,
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidScheduleError {
    #[error("Window on {weekday} has start minute {start} not before end minute {end}")]
    WindowNotMonotone {
        weekday: Weekday,
        start: u32,
        end: u32,
    },
    #[error("Window on {weekday} ends at minute {end}, past the end of the day")]
    WindowPastMidnight { weekday: Weekday, end: u32 },
    #[error("More than {MAX_WINDOWS_PER_WEEKDAY} windows on {weekday}")]
    TooManyWindows { weekday: Weekday },
}

/// Weekly availability of an expert: a set of wall-clock windows in the
/// expert's home timezone. Windows may overlap; the union is what counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub expert_id: ExpertId,
    pub timezone: Tz,
    pub windows: Vec<ScheduleWindow>,
}

impl Schedule {
    pub fn new(expert_id: ExpertId, timezone: Tz) -> Self {
        Self {
            expert_id,
            timezone,
            windows: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidScheduleError> {
        for window in &self.windows {
            if window.start_minute >= window.end_minute {
                return Err(InvalidScheduleError::WindowNotMonotone {
                    weekday: window.weekday,
                    start: window.start_minute,
                    end: window.end_minute,
                });
            }
            if window.end_minute > MINUTES_PER_DAY {
                return Err(InvalidScheduleError::WindowPastMidnight {
                    weekday: window.weekday,
                    end: window.end_minute,
                });
            }
        }
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            let count = self.windows.iter().filter(|w| w.weekday == weekday).count();
            if count > MAX_WINDOWS_PER_WEEKDAY {
                return Err(InvalidScheduleError::TooManyWindows { weekday });
            }
        }
        Ok(())
    }

    fn windows_on(&self, weekday: Weekday) -> impl Iterator<Item = &ScheduleWindow> {
        self.windows.iter().filter(move |w| w.weekday == weekday)
    }

    /// Materialize the weekly windows into concrete UTC intervals over the
    /// given timespan, skipping blocked local dates.
    ///
    /// Window starts resolve to the earliest valid local instant and window
    /// ends to the latest, so DST gaps shrink a window rather than drop it.
    /// Overlapping windows coalesce; windows touching midnight merge with
    /// the next day's, which keeps spans crossing midnight covered.
    pub fn open_intervals(
        &self,
        timespan: &TimeSpan,
        blocked_dates: &HashSet<NaiveDate>,
    ) -> IntervalSet {
        let mut intervals = Vec::new();

        let mut day_cursor = local_date(timespan.start(), &self.timezone);
        let last_day = local_date(timespan.end(), &self.timezone);

        while day_cursor <= last_day {
            if !blocked_dates.contains(&day_cursor) {
                for window in self.windows_on(day_cursor.weekday()) {
                    if let Some(interval) = window_interval(&self.timezone, day_cursor, window) {
                        intervals.push(interval);
                    }
                }
            }
            day_cursor = match day_cursor.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        let mut set = IntervalSet::new(intervals);
        set.clamp(timespan.start(), timespan.end());
        set
    }
}

fn window_interval(tz: &Tz, date: NaiveDate, window: &ScheduleWindow) -> Option<Interval> {
    let start_naive = date.and_hms_opt(window.start_minute / 60, window.start_minute % 60, 0)?;
    let end_naive = if window.end_minute == MINUTES_PER_DAY {
        date.succ_opt()?.and_hms_opt(0, 0, 0)?
    } else {
        date.and_hms_opt(window.end_minute / 60, window.end_minute % 60, 0)?
    };

    let start = resolve_local_earliest(tz, start_naive);
    let end = resolve_local_latest(tz, end_naive);
    Interval::new(start, end)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().to_utc()
    }

    fn weekday_window(weekday: Weekday, start: u32, end: u32) -> ScheduleWindow {
        ScheduleWindow {
            weekday,
            start_minute: start,
            end_minute: end,
        }
    }

    fn business_hours(expert_id: ExpertId, tz: &str) -> Schedule {
        let mut schedule = Schedule::new(expert_id, tz.parse().unwrap());
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            schedule
                .windows
                .push(weekday_window(weekday, 9 * 60, 17 * 60));
        }
        schedule
    }

    #[test]
    fn validates_window_shape() {
        let mut schedule = Schedule::new(ExpertId::new_v4(), chrono_tz::UTC);
        schedule.windows.push(weekday_window(Weekday::Mon, 600, 600));
        assert!(matches!(
            schedule.validate(),
            Err(InvalidScheduleError::WindowNotMonotone { .. })
        ));

        schedule.windows.clear();
        schedule
            .windows
            .push(weekday_window(Weekday::Mon, 600, 1441));
        assert!(matches!(
            schedule.validate(),
            Err(InvalidScheduleError::WindowPastMidnight { .. })
        ));

        schedule.windows.clear();
        for _ in 0..11 {
            schedule.windows.push(weekday_window(Weekday::Mon, 0, 60));
        }
        assert!(matches!(
            schedule.validate(),
            Err(InvalidScheduleError::TooManyWindows { .. })
        ));

        schedule.windows.truncate(10);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn materializes_a_business_week() {
        let schedule = business_hours(ExpertId::new_v4(), "Europe/Lisbon");
        // Mon 2025-03-03 .. Sun 2025-03-09, Lisbon on UTC+0
        let timespan = TimeSpan::new(utc("2025-03-03T00:00:00Z"), utc("2025-03-10T00:00:00Z"));
        let open = schedule.open_intervals(&timespan, &HashSet::new());

        assert_eq!(open.len(), 5);
        assert_eq!(open.as_slice()[0].start, utc("2025-03-03T09:00:00Z"));
        assert_eq!(open.as_slice()[0].end, utc("2025-03-03T17:00:00Z"));
        assert_eq!(open.as_slice()[4].start, utc("2025-03-07T09:00:00Z"));
    }

    #[test]
    fn blocked_dates_remove_the_whole_local_day() {
        let schedule = business_hours(ExpertId::new_v4(), "Europe/Lisbon");
        let timespan = TimeSpan::new(utc("2025-03-03T00:00:00Z"), utc("2025-03-10T00:00:00Z"));
        let blocked: HashSet<NaiveDate> = [NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()]
            .into_iter()
            .collect();
        let open = schedule.open_intervals(&timespan, &blocked);

        assert_eq!(open.len(), 4);
        assert!(open
            .as_slice()
            .iter()
            .all(|i| local_date(i.start, &schedule.timezone)
                != NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()));
    }

    #[test]
    fn windows_straddling_midnight_merge_across_days() {
        let mut schedule = Schedule::new(ExpertId::new_v4(), chrono_tz::UTC);
        schedule
            .windows
            .push(weekday_window(Weekday::Mon, 22 * 60, MINUTES_PER_DAY));
        schedule.windows.push(weekday_window(Weekday::Tue, 0, 120));

        let timespan = TimeSpan::new(utc("2025-03-03T00:00:00Z"), utc("2025-03-05T00:00:00Z"));
        let open = schedule.open_intervals(&timespan, &HashSet::new());

        // Mon 22:00 -> Tue 02:00 is one merged interval
        assert_eq!(open.len(), 1);
        assert_eq!(open.as_slice()[0].start, utc("2025-03-03T22:00:00Z"));
        assert_eq!(open.as_slice()[0].end, utc("2025-03-04T02:00:00Z"));
    }

    #[test]
    fn spring_forward_shrinks_a_window_instead_of_dropping_it() {
        // Lisbon 2025-03-30: 01:00 WET jumps to 02:00 WEST
        let mut schedule = Schedule::new(ExpertId::new_v4(), "Europe/Lisbon".parse().unwrap());
        schedule
            .windows
            .push(weekday_window(Weekday::Sun, 60, 3 * 60)); // 01:00-03:00 local

        let timespan = TimeSpan::new(utc("2025-03-29T00:00:00Z"), utc("2025-03-31T00:00:00Z"));
        let open = schedule.open_intervals(&timespan, &HashSet::new());

        assert_eq!(open.len(), 1);
        // Window start 01:00 does not exist; it resolves to 02:00 WEST = 01:00Z
        assert_eq!(open.as_slice()[0].start, utc("2025-03-30T01:00:00Z"));
        // Window end 03:00 WEST = 02:00Z
        assert_eq!(open.as_slice()[0].end, utc("2025-03-30T02:00:00Z"));
    }

    #[test]
    fn overlapping_windows_union() {
        let mut schedule = Schedule::new(ExpertId::new_v4(), chrono_tz::UTC);
        schedule
            .windows
            .push(weekday_window(Weekday::Mon, 9 * 60, 12 * 60));
        schedule
            .windows
            .push(weekday_window(Weekday::Mon, 11 * 60, 15 * 60));

        let timespan = TimeSpan::new(utc("2025-03-03T00:00:00Z"), utc("2025-03-04T00:00:00Z"));
        let open = schedule.open_intervals(&timespan, &HashSet::new());

        assert_eq!(open.len(), 1);
        assert_eq!(open.as_slice()[0].start, utc("2025-03-03T09:00:00Z"));
        assert_eq!(open.as_slice()[0].end, utc("2025-03-03T15:00:00Z"));
    }
}
