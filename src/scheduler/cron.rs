//! Six-field cron expressions.
//!
//! Field order: `second minute hour day-of-month month day-of-week`.
//!
//! Each field accepts `*`, single values, `a-b` ranges, `,` lists and `/n`
//! steps (on `*`, on a value meaning "from here to the end", or on a range).
//! Day-of-month and day-of-week also accept `?` as a synonym for `*`.
//! Months accept `JAN`..`DEC` and weekdays `SUN`..`SAT`; weekday `0` and `7`
//! are both Sunday. When both day fields are restricted, a day must match
//! both. All evaluation happens in UTC.

use crate::error::{Result, SchedLockError};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// How far ahead `next_after` searches before concluding that the
/// expression never fires (e.g. `0 0 0 30 FEB *`). The Gregorian calendar
/// repeats its date/weekday pairing every 400 years.
const SEARCH_HORIZON_YEARS: i32 = 400;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Set of allowed values for one field, as a bitmask over `0..64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(self, value: u32) -> bool {
        value < 64 && self.0 & (1u64 << value) != 0
    }

    fn insert(&mut self, value: u32) {
        self.0 |= 1u64 << value;
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    name_offset: u32,
    allows_question_mark: bool,
}

const SECONDS: FieldSpec = FieldSpec {
    name: "second",
    min: 0,
    max: 59,
    names: &[],
    name_offset: 0,
    allows_question_mark: false,
};
const MINUTES: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    names: &[],
    name_offset: 0,
    allows_question_mark: false,
};
const HOURS: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    names: &[],
    name_offset: 0,
    allows_question_mark: false,
};
const DAYS_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    name_offset: 0,
    allows_question_mark: true,
};
const MONTHS: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: &MONTH_NAMES,
    name_offset: 1,
    allows_question_mark: false,
};
const DAYS_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: &WEEKDAY_NAMES,
    name_offset: 0,
    allows_question_mark: true,
};

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    seconds: FieldSet,
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
}

impl CronSchedule {
    /// Parse a six-field cron expression.
    ///
    /// # Returns
    ///
    /// * `Ok(CronSchedule)` - The parsed schedule
    /// * `Err(SchedLockError::ConfigInvalid)` - Wrong field count, unknown
    ///   token, value out of range, or zero step
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(SchedLockError::ConfigInvalid(format!(
                "cron expression '{}' must have 6 fields \
                 (second minute hour day-of-month month day-of-week), found {}",
                expression,
                fields.len()
            )));
        }

        let parse = |raw: &str, spec: FieldSpec| {
            parse_field(raw, spec).map_err(|msg| {
                SchedLockError::ConfigInvalid(format!(
                    "cron expression '{}': {} field '{}': {}",
                    expression, spec.name, raw, msg
                ))
            })
        };

        let mut days_of_week = parse(fields[5], DAYS_OF_WEEK)?;
        if days_of_week.contains(7) {
            days_of_week.insert(0);
        }

        Ok(Self {
            expression: fields.join(" "),
            seconds: parse(fields[0], SECONDS)?,
            minutes: parse(fields[1], MINUTES)?,
            hours: parse(fields[2], HOURS)?,
            days_of_month: parse(fields[3], DAYS_OF_MONTH)?,
            months: parse(fields[4], MONTHS)?,
            days_of_week,
        })
    }

    /// The first fire time strictly after `after`, at whole-second precision.
    ///
    /// Returns `None` if the expression has no fire time within the search
    /// horizon.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after.naive_utc().with_nanosecond(0)? + Duration::seconds(1);
        let horizon = start.year() + SEARCH_HORIZON_YEARS;
        let mut t = start;

        while t.year() <= horizon {
            if !self.months.contains(t.month()) {
                t = first_of_next_month(t.date())?;
                continue;
            }
            if !self.day_matches(t.date()) {
                t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !self.hours.contains(t.hour()) {
                t = t.with_minute(0)?.with_second(0)? + Duration::hours(1);
                continue;
            }
            if !self.minutes.contains(t.minute()) {
                t = t.with_second(0)? + Duration::minutes(1);
                continue;
            }
            if !self.seconds.contains(t.second()) {
                t += Duration::seconds(1);
                continue;
            }
            return Some(t.and_utc());
        }

        None
    }

    /// Up to `count` consecutive fire times after `after`.
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let mut times = Vec::new();
        let mut cursor = after;
        while times.len() < count {
            match self.next_after(cursor) {
                Some(next) => {
                    times.push(next);
                    cursor = next;
                }
                None => break,
            }
        }
        times
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        self.days_of_month.contains(date.day())
            && self
                .days_of_week
                .contains(date.weekday().num_days_from_sunday())
    }
}

impl FromStr for CronSchedule {
    type Err = SchedLockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDateTime> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

fn parse_field(raw: &str, spec: FieldSpec) -> std::result::Result<FieldSet, String> {
    let mut set = FieldSet(0);

    for part in raw.split(',') {
        if part.is_empty() {
            return Err("empty list element".to_string());
        }

        let (base, step) = match part.split_once('/') {
            Some((base, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step '{}'", step))?;
                let span = spec.max - spec.min + 1;
                if step == 0 || step > span {
                    return Err(format!("step must be between 1 and {}", span));
                }
                (base, Some(step))
            }
            None => (part, None),
        };

        let (start, end) = if base == "*" || base == "?" {
            if base == "?" && !spec.allows_question_mark {
                return Err("'?' is only allowed in day-of-month and day-of-week".to_string());
            }
            (spec.min, spec.max)
        } else if let Some((lo, hi)) = base.split_once('-') {
            let lo = parse_value(lo, spec)?;
            let hi = parse_value(hi, spec)?;
            if lo > hi {
                return Err(format!("range start {} is after range end {}", lo, hi));
            }
            (lo, hi)
        } else {
            let value = parse_value(base, spec)?;
            match step {
                Some(_) => (value, spec.max),
                None => (value, value),
            }
        };

        for value in (start..=end).step_by(step.unwrap_or(1) as usize) {
            set.insert(value);
        }
    }

    Ok(set)
}

fn parse_value(token: &str, spec: FieldSpec) -> std::result::Result<u32, String> {
    let upper = token.to_ascii_uppercase();
    if let Some(index) = spec.names.iter().position(|name| *name == upper) {
        return Ok(index as u32 + spec.name_offset);
    }

    let value: u32 = token
        .parse()
        .map_err(|_| format!("invalid value '{}'", token))?;
    if value < spec.min || value > spec.max {
        return Err(format!(
            "value {} out of range {}-{}",
            value, spec.min, spec.max
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn every_second() {
        let cron = CronSchedule::parse("* * * * * *").unwrap();
        let t = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 1, 1, 0, 0, 1)));
    }

    #[test]
    fn next_is_strictly_after_even_on_a_fire_time() {
        let cron = CronSchedule::parse("0 * * * * *").unwrap();
        let t = at(2024, 1, 1, 12, 30, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 1, 1, 12, 31, 0)));
    }

    #[test]
    fn sub_second_instants_round_up() {
        let cron = CronSchedule::parse("* * * * * *").unwrap();
        let t = at(2024, 1, 1, 0, 0, 0) + Duration::milliseconds(300);
        assert_eq!(cron.next_after(t), Some(at(2024, 1, 1, 0, 0, 1)));
    }

    #[test]
    fn every_two_minutes() {
        let cron = CronSchedule::parse("0 */2 * * * *").unwrap();
        let t = at(2024, 3, 10, 8, 1, 15);
        assert_eq!(cron.next_after(t), Some(at(2024, 3, 10, 8, 2, 0)));
        assert_eq!(
            cron.upcoming(t, 3),
            vec![
                at(2024, 3, 10, 8, 2, 0),
                at(2024, 3, 10, 8, 4, 0),
                at(2024, 3, 10, 8, 6, 0)
            ]
        );
    }

    #[test]
    fn rolls_over_hour_day_month_and_year() {
        let cron = CronSchedule::parse("30 15 10 * * *").unwrap();
        let t = at(2024, 12, 31, 11, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2025, 1, 1, 10, 15, 30)));
    }

    #[test]
    fn lists_and_ranges() {
        let cron = CronSchedule::parse("0 0 9-17/4 * * MON-FRI").unwrap();
        // 2024-06-07 is a Friday.
        let t = at(2024, 6, 7, 17, 0, 0);
        // Next is Monday 09:00 (9, 13, 17 are the allowed hours).
        assert_eq!(cron.next_after(t), Some(at(2024, 6, 10, 9, 0, 0)));

        let cron = CronSchedule::parse("0 0,30 * * * *").unwrap();
        let t = at(2024, 6, 7, 10, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 6, 7, 10, 30, 0)));
    }

    #[test]
    fn value_with_step_runs_to_end_of_range() {
        let cron = CronSchedule::parse("10/20 * * * * *").unwrap();
        let t = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(
            cron.upcoming(t, 4),
            vec![
                at(2024, 1, 1, 0, 0, 10),
                at(2024, 1, 1, 0, 0, 30),
                at(2024, 1, 1, 0, 0, 50),
                at(2024, 1, 1, 0, 1, 10)
            ]
        );
    }

    #[test]
    fn named_months_and_weekdays() {
        let cron = CronSchedule::parse("0 0 0 1 jul ?").unwrap();
        let t = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 7, 1, 0, 0, 0)));

        let cron = CronSchedule::parse("0 0 12 ? * SUN").unwrap();
        // 2024-06-05 is a Wednesday; next Sunday is 2024-06-09.
        let t = at(2024, 6, 5, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 6, 9, 12, 0, 0)));
    }

    #[test]
    fn weekday_seven_is_sunday() {
        let seven = CronSchedule::parse("0 0 0 * * 7").unwrap();
        let zero = CronSchedule::parse("0 0 0 * * 0").unwrap();
        let t = at(2024, 6, 5, 0, 0, 0);
        assert_eq!(seven.next_after(t), zero.next_after(t));
        assert_eq!(seven.next_after(t), Some(at(2024, 6, 9, 0, 0, 0)));
    }

    #[test]
    fn both_day_fields_must_match() {
        // The 13th that falls on a Friday.
        let cron = CronSchedule::parse("0 0 0 13 * FRI").unwrap();
        let t = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 9, 13, 0, 0, 0)));
    }

    #[test]
    fn leap_day() {
        let cron = CronSchedule::parse("0 0 0 29 FEB *").unwrap();
        let t = at(2024, 3, 1, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2028, 2, 29, 0, 0, 0)));
    }

    #[test]
    fn rare_day_pairing_is_found() {
        // Leap day on a Monday: 2044 is the next one after 2024.
        let cron = CronSchedule::parse("0 0 0 29 FEB MON").unwrap();
        let t = at(2024, 3, 1, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2044, 2, 29, 0, 0, 0)));
    }

    #[test]
    fn step_equal_to_span_is_allowed() {
        let cron = CronSchedule::parse("*/60 * * * * *").unwrap();
        let t = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(cron.next_after(t), Some(at(2024, 1, 1, 0, 1, 0)));
    }

    #[test]
    fn upcoming_with_huge_count_stops_when_schedule_ends() {
        let cron = CronSchedule::parse("0 0 0 30 FEB *").unwrap();
        assert!(cron.upcoming(at(2024, 1, 1, 0, 0, 0), usize::MAX).is_empty());
    }

    #[test]
    fn impossible_date_never_fires() {
        let cron = CronSchedule::parse("0 0 0 30 FEB *").unwrap();
        assert_eq!(cron.next_after(at(2024, 1, 1, 0, 0, 0)), None);
        assert!(cron.upcoming(at(2024, 1, 1, 0, 0, 0), 3).is_empty());
    }

    #[test]
    fn rejects_malformed_expressions() {
        for bad in [
            "",
            "* * * * *",
            "* * * * * * *",
            "60 * * * * *",
            "* 60 * * * *",
            "* * 24 * * *",
            "* * * 0 * *",
            "* * * 32 * *",
            "* * * * 13 *",
            "* * * * * 8",
            "*/0 * * * * *",
            "*/61 * * * * *",
            "5/4294967291 * * * * *",
            "* * * * * 1-5/9",
            "5-1 * * * * *",
            "? * * * * *",
            "a * * * * *",
            "1,,2 * * * * *",
            "* * * * FOO *",
            "* * * L * *",
        ] {
            let err = CronSchedule::parse(bad).unwrap_err();
            assert!(
                matches!(err, SchedLockError::ConfigInvalid(_)),
                "expected ConfigInvalid for {:?}",
                bad
            );
        }
    }

    #[test]
    fn display_normalizes_whitespace() {
        let cron: CronSchedule = "0  */2 *   * * *".parse().unwrap();
        assert_eq!(cron.to_string(), "0 */2 * * * *");
    }
}
