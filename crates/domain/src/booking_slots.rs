use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::{
    date::{ceil_to_slot_grid, next_local_midnight, start_of_local_day},
    interval::{Interval, IntervalSet},
    policy::BookingPolicy,
    schedule::Schedule,
    timespan::TimeSpan,
};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Everything the availability computation depends on. All inputs are
/// materialized up front; the computation itself never touches a clock or
/// any I/O, so the same inputs always yield the same candidate sequence.
#[derive(Debug)]
pub struct AvailabilityInputs<'a> {
    pub schedule: &'a Schedule,
    pub policy: BookingPolicy,
    /// Duration of the offering being booked, minutes
    pub duration_minutes: i64,
    /// Expert-local dates on which no slot may start
    pub blocked_dates: &'a HashSet<NaiveDate>,
    /// External calendar busy intervals plus non-terminal holds and active
    /// meetings, already merged into one set
    pub busy: &'a IntervalSet,
    pub now: DateTime<Utc>,
}

/// The `[earliest, latest)` window candidates are generated over.
///
/// `earliest` honors the minimum notice: with less than a day of notice the
/// instant `now + notice` is ceiling-rounded onto the slot grid; with a day
/// or more, notice becomes day-granular and `earliest` is the start of the
/// local day that `now + notice` falls on. `latest` is the exclusive end of
/// the last bookable local day.
pub fn candidate_window(now: DateTime<Utc>, policy: &BookingPolicy, tz: &Tz) -> TimeSpan {
    let with_notice = now + Duration::minutes(policy.minimum_notice);

    let earliest = if policy.minimum_notice >= MINUTES_PER_DAY {
        start_of_local_day(with_notice, tz)
    } else {
        ceil_to_slot_grid(with_notice, policy.time_slot_interval, tz)
    };

    let last_day_instant = earliest + Duration::days(policy.booking_window_days);
    let latest = next_local_midnight(last_day_instant, tz);

    TimeSpan::new(earliest, latest)
}

/// Compute the ordered sequence of instants at which a booking of
/// `duration_minutes` may start.
///
/// A candidate `t` on the slot grid is accepted iff
/// - `t > now` and `t + duration` stays inside the candidate window,
/// - `[t, t + duration)` lies within a schedule window (blocked local dates
///   produce no windows at all),
/// - `[t - before_buffer, t + duration + after_buffer)` touches nothing in
///   the busy set.
pub fn bookable_starts(inputs: &AvailabilityInputs<'_>) -> Vec<DateTime<Utc>> {
    if inputs.duration_minutes < 1 {
        return Vec::new();
    }

    let tz = &inputs.schedule.timezone;
    let window = candidate_window(inputs.now, &inputs.policy, tz);

    let open = inputs
        .schedule
        .open_intervals(&window, inputs.blocked_dates);
    if open.is_empty() {
        return Vec::new();
    }

    let duration = Duration::minutes(inputs.duration_minutes);
    let before_buffer = Duration::minutes(inputs.policy.before_event_buffer);
    let after_buffer = Duration::minutes(inputs.policy.after_event_buffer);
    let step = Duration::minutes(inputs.policy.time_slot_interval);

    let mut starts = Vec::new();
    let mut cursor = window.start();
    while cursor + duration <= window.end() {
        if cursor > inputs.now {
            let booked = Interval {
                start: cursor,
                end: cursor + duration,
            };
            let guarded = Interval {
                start: cursor - before_buffer,
                end: cursor + duration + after_buffer,
            };
            if open.covers(&booked) && !inputs.busy.overlaps(&guarded) {
                starts.push(cursor);
            }
        }
        cursor += step;
    }

    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().to_utc()
    }

    fn lisbon() -> Tz {
        "Europe/Lisbon".parse().unwrap()
    }

    fn weekday_schedule(tz: Tz) -> Schedule {
        use chrono::Weekday;

        use crate::{schedule::ScheduleWindow, shared::entity::ExpertId};

        let mut schedule = Schedule::new(ExpertId::new_v4(), tz);
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            schedule.windows.push(ScheduleWindow {
                weekday,
                start_minute: 9 * 60,
                end_minute: 17 * 60,
            });
        }
        schedule
    }

    fn policy() -> BookingPolicy {
        BookingPolicy {
            time_slot_interval: 30,
            booking_window_days: 7,
            minimum_notice: 60,
            before_event_buffer: 0,
            after_event_buffer: 0,
        }
    }

    #[test]
    fn first_candidates_of_an_open_week() {
        // Mon 2025-03-03 08:00Z, Lisbon on UTC+0 until March 30
        let schedule = weekday_schedule(lisbon());
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 60,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        // Local 09:00, 09:30, 10:00 on a UTC+0 date
        assert_eq!(starts[0], utc("2025-03-03T09:00:00Z"));
        assert_eq!(starts[1], utc("2025-03-03T09:30:00Z"));
        assert_eq!(starts[2], utc("2025-03-03T10:00:00Z"));
    }

    #[test]
    fn busy_interval_pushes_the_first_candidate_out() {
        let schedule = weekday_schedule(lisbon());
        let busy = IntervalSet::new(vec![Interval {
            start: utc("2025-03-03T09:15:00Z"),
            end: utc("2025-03-03T10:15:00Z"),
        }]);
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 60,
            blocked_dates: &HashSet::new(),
            busy: &busy,
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        assert_eq!(starts[0], utc("2025-03-03T10:30:00Z"));
    }

    #[test]
    fn day_granular_notice_opens_the_whole_next_day() {
        // One full day of notice from Monday 14:00 local: Tuesday morning is
        // bookable, not a rounded-up same-day slot and not Wednesday
        let schedule = weekday_schedule(lisbon());
        let mut policy = policy();
        policy.minimum_notice = MINUTES_PER_DAY;
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy,
            duration_minutes: 60,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T14:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        assert_eq!(starts[0], utc("2025-03-04T09:00:00Z"));
    }

    #[test]
    fn short_notice_rounds_up_onto_the_grid() {
        let schedule = weekday_schedule(lisbon());
        let mut policy = policy();
        policy.minimum_notice = 45;
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy,
            duration_minutes: 30,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T09:10:00Z"),
        };

        // now + 45min = 09:55, ceiled to 10:00
        let starts = bookable_starts(&inputs);
        assert_eq!(starts[0], utc("2025-03-03T10:00:00Z"));
    }

    #[test]
    fn blocked_date_yields_nothing_that_day() {
        let schedule = weekday_schedule(lisbon());
        let blocked: HashSet<NaiveDate> = [NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()]
            .into_iter()
            .collect();
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 60,
            blocked_dates: &blocked,
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        assert!(!starts.is_empty());
        assert_eq!(starts[0], utc("2025-03-04T09:00:00Z"));
    }

    #[test]
    fn duration_may_end_exactly_at_the_window_close() {
        let schedule = weekday_schedule(lisbon());
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 60,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        // 16:00 fits (ends 17:00 on the closing edge), 16:30 does not
        assert!(starts.contains(&utc("2025-03-03T16:00:00Z")));
        assert!(!starts.contains(&utc("2025-03-03T16:30:00Z")));
    }

    #[test]
    fn buffers_guard_around_busy_neighbors() {
        let schedule = weekday_schedule(lisbon());
        let mut policy = policy();
        policy.before_event_buffer = 15;
        policy.after_event_buffer = 15;
        let busy = IntervalSet::new(vec![Interval {
            start: utc("2025-03-03T11:00:00Z"),
            end: utc("2025-03-03T12:00:00Z"),
        }]);
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy,
            duration_minutes: 30,
            blocked_dates: &HashSet::new(),
            busy: &busy,
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        // 10:30 would end 11:00 and needs 15 min of clearance after: rejected
        assert!(!starts.contains(&utc("2025-03-03T10:30:00Z")));
        assert!(starts.contains(&utc("2025-03-03T10:00:00Z")));
        // 12:00 needs 15 min of clearance before: rejected, 12:30 is fine
        assert!(!starts.contains(&utc("2025-03-03T12:00:00Z")));
        assert!(starts.contains(&utc("2025-03-03T12:30:00Z")));
    }

    #[test]
    fn no_candidate_before_or_at_now() {
        let schedule = weekday_schedule(lisbon());
        let mut policy = policy();
        policy.minimum_notice = 0;
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy,
            duration_minutes: 30,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T09:30:00Z"),
        };

        let starts = bookable_starts(&inputs);
        assert!(starts.iter().all(|t| *t > inputs.now));
        assert_eq!(starts[0], utc("2025-03-03T10:00:00Z"));
    }

    #[test]
    fn horizon_is_bounded_by_the_booking_window() {
        let schedule = weekday_schedule(lisbon());
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 60,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        let window = candidate_window(inputs.now, &inputs.policy, &lisbon());
        assert!(starts
            .iter()
            .all(|t| *t + Duration::minutes(60) <= window.end()));
        // 7-day window starting Mon 09:00 runs through the following Monday
        assert_eq!(window.end(), utc("2025-03-11T00:00:00Z"));
    }

    #[test]
    fn emitted_candidates_satisfy_their_own_acceptance_rule() {
        let schedule = weekday_schedule(lisbon());
        let busy = IntervalSet::new(vec![
            Interval {
                start: utc("2025-03-03T09:15:00Z"),
                end: utc("2025-03-03T10:15:00Z"),
            },
            Interval {
                start: utc("2025-03-04T13:00:00Z"),
                end: utc("2025-03-04T15:30:00Z"),
            },
        ]);
        let mut policy = policy();
        policy.before_event_buffer = 10;
        policy.after_event_buffer = 20;
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy,
            duration_minutes: 45,
            blocked_dates: &HashSet::new(),
            busy: &busy,
            now: utc("2025-03-03T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        assert!(!starts.is_empty());

        let window = candidate_window(inputs.now, &inputs.policy, &schedule.timezone);
        let open = inputs.schedule.open_intervals(&window, inputs.blocked_dates);
        for t in &starts {
            let booked = Interval {
                start: *t,
                end: *t + Duration::minutes(45),
            };
            let guarded = Interval {
                start: *t - Duration::minutes(10),
                end: *t + Duration::minutes(45 + 20),
            };
            assert!(*t > inputs.now);
            assert!(open.covers(&booked));
            assert!(!inputs.busy.overlaps(&guarded));
        }
    }

    #[test]
    fn same_inputs_same_outputs() {
        let schedule = weekday_schedule(lisbon());
        let busy = IntervalSet::new(vec![Interval {
            start: utc("2025-03-05T09:00:00Z"),
            end: utc("2025-03-05T17:00:00Z"),
        }]);
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 30,
            blocked_dates: &HashSet::new(),
            busy: &busy,
            now: utc("2025-03-03T08:00:00Z"),
        };

        assert_eq!(bookable_starts(&inputs), bookable_starts(&inputs));
    }

    #[test]
    fn dst_transition_keeps_wall_clock_window_boundaries() {
        // Lisbon springs forward Sunday 2025-03-30; book the Friday before
        // and the Monday after. Monday slots shift by one hour in UTC while
        // staying at 09:00 local.
        let schedule = weekday_schedule(lisbon());
        let mut policy = policy();
        policy.booking_window_days = 10;
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy,
            duration_minutes: 60,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-28T08:00:00Z"),
        };

        let starts = bookable_starts(&inputs);
        // Friday 2025-03-28 (WET): 09:00 local == 09:00Z
        assert!(starts.contains(&utc("2025-03-28T09:00:00Z")));
        // Monday 2025-03-31 (WEST): 09:00 local == 08:00Z
        assert!(starts.contains(&utc("2025-03-31T08:00:00Z")));
        // Last Monday slot is 16:00 local == 15:00Z, not 16:00Z
        assert!(starts.contains(&utc("2025-03-31T15:00:00Z")));
        assert!(!starts.contains(&utc("2025-03-31T16:00:00Z")));
    }

    #[test]
    fn empty_schedule_has_no_slots() {
        use crate::shared::entity::ExpertId;

        let schedule = Schedule::new(ExpertId::new_v4(), lisbon());
        let inputs = AvailabilityInputs {
            schedule: &schedule,
            policy: policy(),
            duration_minutes: 30,
            blocked_dates: &HashSet::new(),
            busy: &IntervalSet::default(),
            now: utc("2025-03-03T08:00:00Z"),
        };
        assert!(bookable_starts(&inputs).is_empty());
    }
}
