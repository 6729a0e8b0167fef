//! Working-time calendars.
//!
//! The schedulers only talk to calendars through the [`Calendar`] trait.
//! [`WorkingCalendar`] is a weekly pattern of working ranges with per-date
//! exceptions, which covers the standard and 24-hour calendars.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rustc_hash::FxHashMap;
use std::fmt;

use crate::duration::{Duration, TimeConversion, TimeUnit};

const SECONDS_PER_DAY: u32 = 86_400;

/// Days searched in either direction before giving up on finding working time.
const SEARCH_HORIZON_DAYS: u32 = 3_660;

/// Working-time queries used by the schedulers.
pub trait Calendar: fmt::Debug {
    fn name(&self) -> &str;

    /// Whether `t` falls inside a working period.
    fn is_working(&self, t: NaiveDateTime) -> bool;

    /// `t` itself if it is working time, otherwise the start of the next
    /// working period.
    fn next_work_start(&self, t: NaiveDateTime) -> NaiveDateTime;

    /// `t` itself if it lies inside or at the end of a working period,
    /// otherwise the end of the previous working period.
    fn previous_work_finish(&self, t: NaiveDateTime) -> NaiveDateTime;

    /// Working time between two instants, negative when `end` precedes `start`.
    fn work_between(&self, start: NaiveDateTime, end: NaiveDateTime, units: TimeUnit) -> Duration;

    /// Move `t` by `duration` of working time (or wall-clock time for elapsed units).
    fn add_duration(&self, t: NaiveDateTime, duration: Duration) -> NaiveDateTime;

    /// Minutes per day and week, and days per month, for this calendar's working units.
    fn time_conversion(&self) -> &TimeConversion;
}

/// A half-open working range within a day, in seconds from midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkingRange {
    start: u32,
    end: u32,
}

impl WorkingRange {
    /// Build a range from two times. An `end` of midnight means the end of the day.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        let start = start.num_seconds_from_midnight();
        let end = match end.num_seconds_from_midnight() {
            0 => SECONDS_PER_DAY,
            s => s,
        };
        Self { start, end }
    }

    fn hm(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start: start.0 * 3600 + start.1 * 60,
            end: end.0 * 3600 + end.1 * 60,
        }
    }

    fn whole_day() -> Self {
        Self {
            start: 0,
            end: SECONDS_PER_DAY,
        }
    }
}

/// Calendar defined by working ranges per weekday plus dated exceptions.
#[derive(Clone, Debug)]
pub struct WorkingCalendar {
    name: String,
    /// Indexed by `Weekday::num_days_from_monday`.
    week: [Vec<WorkingRange>; 7],
    exceptions: FxHashMap<NaiveDate, Vec<WorkingRange>>,
    conversion: TimeConversion,
}

impl WorkingCalendar {
    /// Create a calendar from per-weekday ranges, Monday first.
    pub fn new(name: impl Into<String>, week: [Vec<WorkingRange>; 7]) -> Self {
        let week = week.map(normalize);
        Self {
            name: name.into(),
            week,
            exceptions: FxHashMap::default(),
            conversion: TimeConversion::default(),
        }
    }

    /// Monday to Friday, 08:00-12:00 and 13:00-17:00.
    pub fn standard(name: impl Into<String>) -> Self {
        let day = vec![WorkingRange::hm((8, 0), (12, 0)), WorkingRange::hm((13, 0), (17, 0))];
        Self::new(
            name,
            [
                day.clone(),
                day.clone(),
                day.clone(),
                day.clone(),
                day,
                Vec::new(),
                Vec::new(),
            ],
        )
    }

    /// Every day, all day.
    pub fn twenty_four_hour() -> Self {
        let day = vec![WorkingRange::whole_day()];
        Self::new("24 Hours", std::array::from_fn(|_| day.clone()))
    }

    /// Override the working ranges for one date. An empty list makes it a holiday.
    pub fn with_exception(mut self, date: NaiveDate, ranges: Vec<WorkingRange>) -> Self {
        self.exceptions.insert(date, normalize(ranges));
        self
    }

    pub fn with_conversion(mut self, conversion: TimeConversion) -> Self {
        self.conversion = conversion;
        self
    }

    fn ranges(&self, date: NaiveDate) -> &[WorkingRange] {
        match self.exceptions.get(&date) {
            Some(ranges) => ranges,
            None => &self.week[date.weekday().num_days_from_monday() as usize],
        }
    }

    fn working_seconds(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        if end < start {
            return -self.working_seconds(end, start);
        }
        let mut total = 0;
        let mut date = start.date();
        while date <= end.date() {
            let day_start = date.and_time(NaiveTime::MIN);
            for range in self.ranges(date) {
                let from = at(day_start, range.start).max(start);
                let to = at(day_start, range.end).min(end);
                if to > from {
                    total += (to - from).num_seconds();
                }
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        total
    }

    fn add_working_seconds(&self, t: NaiveDateTime, seconds: i64) -> NaiveDateTime {
        if seconds >= 0 {
            self.walk_forward(t, seconds)
        } else {
            self.walk_backward(t, -seconds)
        }
    }

    fn walk_forward(&self, t: NaiveDateTime, mut remaining: i64) -> NaiveDateTime {
        if remaining == 0 {
            return t;
        }
        let mut date = t.date();
        let mut cursor = t.num_seconds_from_midnight();
        for _ in 0..SEARCH_HORIZON_DAYS {
            let day_start = date.and_time(NaiveTime::MIN);
            for range in self.ranges(date) {
                if cursor >= range.end {
                    continue;
                }
                let from = cursor.max(range.start);
                let available = i64::from(range.end - from);
                if remaining <= available {
                    return at(day_start, from) + chrono::Duration::seconds(remaining);
                }
                remaining -= available;
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            cursor = 0;
        }
        self.no_working_time(t, "forward walk");
        t
    }

    fn walk_backward(&self, t: NaiveDateTime, mut remaining: i64) -> NaiveDateTime {
        let mut date = t.date();
        let mut cursor = t.num_seconds_from_midnight();
        for _ in 0..SEARCH_HORIZON_DAYS {
            let day_start = date.and_time(NaiveTime::MIN);
            for range in self.ranges(date).iter().rev() {
                if cursor <= range.start {
                    continue;
                }
                let to = cursor.min(range.end);
                let available = i64::from(to - range.start);
                if remaining <= available {
                    return at(day_start, to) - chrono::Duration::seconds(remaining);
                }
                remaining -= available;
            }
            date = match date.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
            cursor = SECONDS_PER_DAY;
        }
        self.no_working_time(t, "backward walk");
        t
    }

    /// Searches that run out of horizon leave `t` where it was.
    fn no_working_time(&self, t: NaiveDateTime, search: &str) {
        tracing::warn!(
            calendar = %self.name,
            "{search} from {t} found no working time within {SEARCH_HORIZON_DAYS} days"
        );
    }
}

impl Calendar for WorkingCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn time_conversion(&self) -> &TimeConversion {
        &self.conversion
    }

    fn is_working(&self, t: NaiveDateTime) -> bool {
        let s = t.num_seconds_from_midnight();
        self.ranges(t.date())
            .iter()
            .any(|r| s >= r.start && s < r.end)
    }

    fn next_work_start(&self, t: NaiveDateTime) -> NaiveDateTime {
        let s = t.num_seconds_from_midnight();
        let day_start = t.date().and_time(NaiveTime::MIN);
        for range in self.ranges(t.date()) {
            if s >= range.start && s < range.end {
                return t;
            }
            if s < range.start {
                return at(day_start, range.start);
            }
        }

        let mut date = t.date();
        for _ in 0..SEARCH_HORIZON_DAYS {
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            if let Some(first) = self.ranges(date).first() {
                return at(date.and_time(NaiveTime::MIN), first.start);
            }
        }
        self.no_working_time(t, "next work start");
        t
    }

    fn previous_work_finish(&self, t: NaiveDateTime) -> NaiveDateTime {
        let s = t.num_seconds_from_midnight();
        let day_start = t.date().and_time(NaiveTime::MIN);
        for range in self.ranges(t.date()).iter().rev() {
            if s > range.start && s <= range.end {
                return t;
            }
            if s > range.end {
                return at(day_start, range.end);
            }
        }

        let mut date = t.date();
        for _ in 0..SEARCH_HORIZON_DAYS {
            date = match date.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
            if let Some(last) = self.ranges(date).last() {
                return at(date.and_time(NaiveTime::MIN), last.end);
            }
        }
        self.no_working_time(t, "previous work finish");
        t
    }

    fn work_between(&self, start: NaiveDateTime, end: NaiveDateTime, units: TimeUnit) -> Duration {
        if units.is_elapsed() {
            let minutes = (end - start).num_seconds() as f64 / 60.0;
            return Duration::new(minutes, TimeUnit::ElapsedMinutes)
                .convert_units(units, &self.conversion);
        }
        let minutes = self.working_seconds(start, end) as f64 / 60.0;
        Duration::new(minutes, TimeUnit::Minutes).convert_units(units, &self.conversion)
    }

    fn add_duration(&self, t: NaiveDateTime, duration: Duration) -> NaiveDateTime {
        if duration.is_zero() || duration.units.is_percent() {
            return t;
        }
        let seconds = (duration.as_minutes(&self.conversion) * 60.0).round() as i64;
        if duration.units.is_elapsed() {
            t + chrono::Duration::seconds(seconds)
        } else {
            self.add_working_seconds(t, seconds)
        }
    }
}

fn at(day_start: NaiveDateTime, seconds: u32) -> NaiveDateTime {
    day_start + chrono::Duration::seconds(i64::from(seconds))
}

fn normalize(mut ranges: Vec<WorkingRange>) -> Vec<WorkingRange> {
    ranges.retain(|r| r.end > r.start);
    ranges.sort_by_key(|r| r.start);
    ranges
}
