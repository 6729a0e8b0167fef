//! Durations with units, and conversion between them.
//!
//! Working units (minutes through years) are converted through the project's
//! minutes-per-day/week and days-per-month factors. Elapsed units measure
//! wall-clock time and convert by fixed ratios.

use std::cmp::Ordering;
use std::fmt;

const ELAPSED_MINUTES_PER_DAY: f64 = 1440.0;
const ELAPSED_DAYS_PER_MONTH: f64 = 30.0;
const ELAPSED_DAYS_PER_YEAR: f64 = 365.0;
const WEEKS_PER_YEAR: f64 = 52.0;

/// Unit attached to a [`Duration`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
    ElapsedMinutes,
    ElapsedHours,
    ElapsedDays,
    ElapsedWeeks,
    ElapsedMonths,
    ElapsedYears,
    /// Percentage of the predecessor's duration. Only meaningful for lag.
    Percent,
    ElapsedPercent,
}

impl TimeUnit {
    pub fn is_elapsed(self) -> bool {
        matches!(
            self,
            TimeUnit::ElapsedMinutes
                | TimeUnit::ElapsedHours
                | TimeUnit::ElapsedDays
                | TimeUnit::ElapsedWeeks
                | TimeUnit::ElapsedMonths
                | TimeUnit::ElapsedYears
                | TimeUnit::ElapsedPercent
        )
    }

    pub fn is_percent(self) -> bool {
        matches!(self, TimeUnit::Percent | TimeUnit::ElapsedPercent)
    }

    /// The elapsed twin of a working unit. Elapsed units map to themselves.
    pub fn to_elapsed(self) -> TimeUnit {
        match self {
            TimeUnit::Minutes => TimeUnit::ElapsedMinutes,
            TimeUnit::Hours => TimeUnit::ElapsedHours,
            TimeUnit::Days => TimeUnit::ElapsedDays,
            TimeUnit::Weeks => TimeUnit::ElapsedWeeks,
            TimeUnit::Months => TimeUnit::ElapsedMonths,
            TimeUnit::Years => TimeUnit::ElapsedYears,
            TimeUnit::Percent => TimeUnit::ElapsedPercent,
            other => other,
        }
    }

    /// Number of minutes in one of this unit. Percent units have no length.
    fn minutes(self, conversion: &TimeConversion) -> f64 {
        let per_day = conversion.minutes_per_day;
        let per_week = conversion.minutes_per_week;
        match self {
            TimeUnit::Minutes | TimeUnit::ElapsedMinutes => 1.0,
            TimeUnit::Hours | TimeUnit::ElapsedHours => 60.0,
            TimeUnit::Days => per_day,
            TimeUnit::Weeks => per_week,
            TimeUnit::Months => per_day * conversion.days_per_month,
            TimeUnit::Years => per_week * WEEKS_PER_YEAR,
            TimeUnit::ElapsedDays => ELAPSED_MINUTES_PER_DAY,
            TimeUnit::ElapsedWeeks => ELAPSED_MINUTES_PER_DAY * 7.0,
            TimeUnit::ElapsedMonths => ELAPSED_MINUTES_PER_DAY * ELAPSED_DAYS_PER_MONTH,
            TimeUnit::ElapsedYears => ELAPSED_MINUTES_PER_DAY * ELAPSED_DAYS_PER_YEAR,
            TimeUnit::Percent | TimeUnit::ElapsedPercent => 0.0,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mo",
            TimeUnit::Years => "y",
            TimeUnit::ElapsedMinutes => "em",
            TimeUnit::ElapsedHours => "eh",
            TimeUnit::ElapsedDays => "ed",
            TimeUnit::ElapsedWeeks => "ew",
            TimeUnit::ElapsedMonths => "emo",
            TimeUnit::ElapsedYears => "ey",
            TimeUnit::Percent => "%",
            TimeUnit::ElapsedPercent => "e%",
        };
        f.write_str(label)
    }
}

/// Factors used to convert between working time units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeConversion {
    pub minutes_per_day: f64,
    pub minutes_per_week: f64,
    pub days_per_month: f64,
}

impl Default for TimeConversion {
    fn default() -> Self {
        Self {
            minutes_per_day: 480.0,
            minutes_per_week: 2400.0,
            days_per_month: 20.0,
        }
    }
}

/// A signed magnitude with a unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Duration {
    pub value: f64,
    pub units: TimeUnit,
}

impl Duration {
    pub fn new(value: f64, units: TimeUnit) -> Self {
        Self { value, units }
    }

    pub fn zero(units: TimeUnit) -> Self {
        Self { value: 0.0, units }
    }

    pub fn days(value: f64) -> Self {
        Self::new(value, TimeUnit::Days)
    }

    pub fn hours(value: f64) -> Self {
        Self::new(value, TimeUnit::Hours)
    }

    pub fn percent(value: f64) -> Self {
        Self::new(value, TimeUnit::Percent)
    }

    pub fn negate(self) -> Self {
        Self::new(-self.value, self.units)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    pub fn is_negative(&self) -> bool {
        self.value < 0.0
    }

    /// Convert to another unit. Percent values cannot be converted and are
    /// returned unchanged.
    pub fn convert_units(self, target: TimeUnit, conversion: &TimeConversion) -> Duration {
        if self.units == target || self.units.is_percent() || target.is_percent() {
            return self;
        }
        let minutes = self.value * self.units.minutes(conversion);
        Duration::new(minutes / target.minutes(conversion), target)
    }

    /// Length of this duration in minutes.
    pub fn as_minutes(self, conversion: &TimeConversion) -> f64 {
        self.value * self.units.minutes(conversion)
    }

    /// Resolve a percentage against a base duration, yielding a value in the
    /// base's units. Non-percent durations are returned unchanged.
    pub fn percent_of(self, base: Duration) -> Duration {
        match self.units {
            TimeUnit::Percent => Duration::new(base.value * self.value / 100.0, base.units),
            TimeUnit::ElapsedPercent => {
                Duration::new(base.value * self.value / 100.0, base.units.to_elapsed())
            }
            _ => self,
        }
    }

    /// Sum of two durations, expressed in the units of `self`.
    pub fn add(self, other: Duration, conversion: &TimeConversion) -> Duration {
        let other = other.convert_units(self.units, conversion);
        Duration::new(self.value + other.value, self.units)
    }

    /// Compare two durations by their length.
    pub fn compare(&self, other: &Duration, conversion: &TimeConversion) -> Ordering {
        let other = other.convert_units(self.units, conversion);
        self.value.total_cmp(&other.value)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_day_conversion() {
        let conv = TimeConversion::default();
        let d = Duration::days(2.0).convert_units(TimeUnit::Hours, &conv);
        assert_eq!(d, Duration::hours(16.0));

        let w = Duration::new(1.0, TimeUnit::Weeks).convert_units(TimeUnit::Days, &conv);
        assert_eq!(w.value, 5.0);
    }

    #[test]
    fn test_elapsed_conversion_uses_fixed_ratios() {
        let conv = TimeConversion::default();
        let d = Duration::new(1.0, TimeUnit::ElapsedDays).convert_units(TimeUnit::Hours, &conv);
        assert_eq!(d.value, 24.0);
    }

    #[test]
    fn test_percent_of_predecessor_duration() {
        let lag = Duration::percent(50.0).percent_of(Duration::days(4.0));
        assert_eq!(lag, Duration::days(2.0));

        let elapsed = Duration::new(25.0, TimeUnit::ElapsedPercent).percent_of(Duration::days(4.0));
        assert_eq!(elapsed, Duration::new(1.0, TimeUnit::ElapsedDays));
    }

    #[test]
    fn test_percent_is_not_converted() {
        let conv = TimeConversion::default();
        let p = Duration::percent(10.0);
        assert_eq!(p.convert_units(TimeUnit::Hours, &conv), p);
    }

    #[test]
    fn test_add_and_compare() {
        let conv = TimeConversion::default();
        let sum = Duration::days(1.0).add(Duration::hours(4.0), &conv);
        assert_eq!(sum, Duration::days(1.5));
        assert_eq!(
            Duration::hours(8.0).compare(&Duration::days(1.0), &conv),
            Ordering::Equal
        );
        assert_eq!(
            Duration::hours(7.0).compare(&Duration::days(1.0), &conv),
            Ordering::Less
        );
    }

    #[test]
    fn test_negate_and_sign() {
        let d = Duration::days(3.0).negate();
        assert!(d.is_negative());
        assert!(!d.is_zero());
        assert!(Duration::zero(TimeUnit::Hours).is_zero());
        assert_eq!(TimeUnit::Days.to_elapsed(), TimeUnit::ElapsedDays);
    }
}
