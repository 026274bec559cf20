// SPDX-License-Identifier: MIT

//! Five-field cron schedule matching
//!
//! Supports the classic minute / hour / day-of-month / month /
//! day-of-week pattern with `*`, single values, ranges, steps, comma
//! lists and month/weekday names. Malformed expressions fail at parse
//! time, before any turn is evaluated.

use crate::error::GateError;
use chrono::{DateTime, Datelike, Timelike, Utc};

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// One pattern within a field's comma list
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldPattern {
    Any,
    Value(u32),
    Range(u32, u32),
    RangeStep(u32, u32, u32),
}

impl FieldPattern {
    fn matches(&self, value: u32) -> bool {
        match *self {
            FieldPattern::Any => true,
            FieldPattern::Value(v) => value == v,
            FieldPattern::Range(lo, hi) => (lo..=hi).contains(&value),
            FieldPattern::RangeStep(lo, hi, step) => {
                (lo..=hi).contains(&value) && (value - lo) % step == 0
            }
        }
    }
}

/// One of the five schedule fields
#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    patterns: Vec<FieldPattern>,
    restricted: bool,
}

impl Field {
    fn matches(&self, value: u32) -> bool {
        self.patterns.iter().any(|p| p.matches(value))
    }
}

/// A parsed five-field cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronSchedule {
    /// Parse a cron expression like `*/17 14-19 * * mon`
    pub fn parse(expression: &str) -> Result<Self, GateError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(GateError::config(format!(
                "cron expression '{expression}' must have 5 fields, got {}",
                fields.len()
            )));
        }
        Ok(Self {
            minute: parse_field(fields[0], 0, 59, &[])?,
            hour: parse_field(fields[1], 0, 23, &[])?,
            day_of_month: parse_field(fields[2], 1, 31, &[])?,
            month: parse_field(fields[3], 1, 12, &MONTH_NAMES)?,
            day_of_week: parse_field(fields[4], 0, 7, &DAY_NAMES)?,
        })
    }

    /// Whether the schedule matches the given instant
    pub fn matches(&self, datetime: DateTime<Utc>) -> bool {
        if !self.minute.matches(datetime.minute())
            || !self.hour.matches(datetime.hour())
            || !self.month.matches(datetime.month())
        {
            return false;
        }

        let dom = self.day_of_month.matches(datetime.day());
        // 7 is an alias for Sunday, kept verbatim through parsing so
        // ranges like `5-7` (fri-sun) stay well formed
        let weekday = datetime.weekday().num_days_from_sunday();
        let dow = self.day_of_week.matches(weekday)
            || (weekday == 0 && self.day_of_week.matches(7));

        // Classic cron rule: when both day fields are restricted, a match
        // on either suffices.
        if self.day_of_month.restricted && self.day_of_week.restricted {
            dom || dow
        } else {
            dom && dow
        }
    }
}

fn parse_field(field: &str, min: u32, max: u32, names: &[&str]) -> Result<Field, GateError> {
    let mut patterns = Vec::new();
    for part in field.split(',') {
        patterns.push(parse_pattern(part, min, max, names)?);
    }
    Ok(Field {
        restricted: patterns.iter().any(|p| !matches!(p, FieldPattern::Any)),
        patterns,
    })
}

fn parse_pattern(part: &str, min: u32, max: u32, names: &[&str]) -> Result<FieldPattern, GateError> {
    let (body, step) = match part.split_once('/') {
        Some((body, step)) => {
            let step: u32 = step
                .parse()
                .map_err(|_| GateError::config(format!("invalid cron step in '{part}'")))?;
            if step == 0 {
                return Err(GateError::config(format!("cron step must be > 0 in '{part}'")));
            }
            (body, Some(step))
        }
        None => (part, None),
    };

    if body == "*" {
        // `*/n` steps from the field minimum, so `*/17` in day-of-month
        // hits 1 and 18, not 17 and 34
        return Ok(match step {
            Some(step) => FieldPattern::RangeStep(min, max, step),
            None => FieldPattern::Any,
        });
    }

    if let Some((lo, hi)) = body.split_once('-') {
        let lo = parse_value(lo, min, max, names)?;
        let hi = parse_value(hi, min, max, names)?;
        if lo > hi {
            return Err(GateError::config(format!("inverted cron range '{part}'")));
        }
        return Ok(match step {
            Some(step) => FieldPattern::RangeStep(lo, hi, step),
            None => FieldPattern::Range(lo, hi),
        });
    }

    if step.is_some() {
        return Err(GateError::config(format!(
            "cron step requires '*' or a range in '{part}'"
        )));
    }
    Ok(FieldPattern::Value(parse_value(body, min, max, names)?))
}

fn parse_value(value: &str, min: u32, max: u32, names: &[&str]) -> Result<u32, GateError> {
    let lowered = value.to_ascii_lowercase();
    if let Some(index) = names.iter().position(|n| *n == lowered) {
        // Month names are 1-based (jan=1), day names 0-based (sun=0)
        let offset = if names.len() == 12 { 1 } else { 0 };
        return Ok(index as u32 + offset);
    }
    let parsed: u32 = value
        .parse()
        .map_err(|_| GateError::config(format!("invalid cron value '{value}'")))?;
    if parsed < min || parsed > max {
        return Err(GateError::config(format!(
            "cron value {parsed} out of range {min}-{max}"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_monday_afternoon_schedule() {
        // 1610979455663 is Monday 2021-01-18 14:17:35 UTC
        let schedule = CronSchedule::parse("*/17 14-19 * * mon").unwrap();
        assert!(schedule.matches(instant(1610979455663)));
    }

    #[test]
    fn test_weekend_schedule_rejects_monday() {
        let schedule = CronSchedule::parse("* * * * 6,7").unwrap();
        assert!(!schedule.matches(instant(1610979455663)));
    }

    #[test]
    fn test_minute_step() {
        let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
        // 17:17 does not land on a quarter hour
        assert!(!schedule.matches(instant(1610990255000)));
        // 17:15 does
        assert!(schedule.matches(instant(1610990100000)));
    }

    #[test]
    fn test_month_names_and_ranges() {
        let schedule = CronSchedule::parse("17 14 18 jan mon-fri").unwrap();
        assert!(schedule.matches(instant(1610979455663)));

        let schedule = CronSchedule::parse("17 14 * feb *").unwrap();
        assert!(!schedule.matches(instant(1610979455663)));
    }

    #[test]
    fn test_dow_seven_is_sunday() {
        // 1610893055663 is Sunday 2021-01-17 14:17:35 UTC
        let sunday = instant(1610893055663);
        assert!(CronSchedule::parse("* * * * 7").unwrap().matches(sunday));
        assert!(CronSchedule::parse("* * * * sun").unwrap().matches(sunday));
        assert!(CronSchedule::parse("* * * * 0").unwrap().matches(sunday));
    }

    #[test]
    fn test_dow_range_ending_in_seven() {
        let schedule = CronSchedule::parse("* * * * 5-7").unwrap();
        // Sunday 2021-01-17 via the 7 alias
        assert!(schedule.matches(instant(1610893055663)));
        // Friday 2021-01-15
        assert!(schedule.matches(instant(1610720255663)));
        // Monday 2021-01-18
        assert!(!schedule.matches(instant(1610979455663)));
    }

    #[test]
    fn test_dom_step_starts_at_one() {
        let schedule = CronSchedule::parse("* * */17 * *").unwrap();
        // day 18: 1 + 17
        assert!(schedule.matches(instant(1610979455663)));
        // day 17
        assert!(!schedule.matches(instant(1610893055663)));
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(CronSchedule::parse("* * * *").is_err());
        assert!(CronSchedule::parse("61 * * * *").is_err());
        assert!(CronSchedule::parse("* * * * 8").is_err());
        assert!(CronSchedule::parse("*/0 * * * *").is_err());
        assert!(CronSchedule::parse("10-5 * * * *").is_err());
        assert!(CronSchedule::parse("5/2 * * * *").is_err());
    }
}
