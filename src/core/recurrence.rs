use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{MatchError, Result};
use crate::models::{RecurrencePattern, RecurrenceRule};

/// Upper bound on how far ahead an occurrence-count rule is expanded
const MAX_HORIZON_DAYS: i64 = 366 * 100;

/// Check structural validity of a recurrence rule
pub fn validate_rule(rule: &RecurrenceRule) -> Result<()> {
    if rule.interval == 0 {
        return Err(MatchError::InvalidRecurrenceRule("interval must be at least 1".into()));
    }
    if let Some(end) = rule.end_date {
        if end < rule.start_date {
            return Err(MatchError::InvalidRecurrenceRule(format!(
                "end date {} is before start date {}",
                end, rule.start_date
            )));
        }
    }
    if rule.occurrences == Some(0) {
        return Err(MatchError::InvalidRecurrenceRule("occurrence count must be at least 1".into()));
    }
    if let Some(day) = rule.day_of_month {
        if !(1..=31).contains(&day) {
            return Err(MatchError::InvalidRecurrenceRule(format!(
                "day of month {} is outside 1..=31",
                day
            )));
        }
    }

    match rule.pattern {
        RecurrencePattern::Weekly | RecurrencePattern::Biweekly if rule.days_of_week.is_empty() => Err(
            MatchError::InvalidRecurrenceRule("weekly recurrence requires at least one day of week".into()),
        ),
        RecurrencePattern::Monthly if rule.day_of_month.is_none() => Err(MatchError::InvalidRecurrenceRule(
            "monthly recurrence requires a day of month".into(),
        )),
        _ => Ok(()),
    }
}

/// Whether `rule` produces at least one occurrence in `range_start..=range_end`
///
/// Exception dates never produce an occurrence. CUSTOM rules are rejected
/// with [`MatchError::UnsupportedRecurrence`]; callers must expand them into
/// a concrete pattern first.
pub fn occurs_within(rule: &RecurrenceRule, range_start: NaiveDate, range_end: NaiveDate) -> Result<bool> {
    if range_start > range_end {
        return Err(MatchError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }
    if rule.pattern == RecurrencePattern::Custom {
        return Err(MatchError::UnsupportedRecurrence);
    }
    validate_rule(rule)?;

    if rule.start_date > range_end {
        return Ok(false);
    }
    let last = last_occurrence_bound(rule);
    if matches!(last, Some(last) if last < range_start) {
        return Ok(false);
    }

    let from = range_start.max(rule.start_date);
    let to = last.map_or(range_end, |last| last.min(range_end));

    let found = match rule.pattern {
        RecurrencePattern::Daily if rule.interval == 1 && rule.exceptions.is_empty() => true,
        RecurrencePattern::Monthly => monthly_candidates(rule, from, to).any(|day| !rule.exceptions.contains(&day)),
        _ => from
            .iter_days()
            .take_while(|day| *day <= to)
            .any(|day| !rule.exceptions.contains(&day) && is_pattern_day(rule, day)),
    };

    Ok(found)
}

/// Last date on which `rule` may occur, or `None` when it runs forever
///
/// Combines the explicit end date with the date of the final counted
/// occurrence. Exception dates still count towards the occurrence total.
pub fn last_occurrence_bound(rule: &RecurrenceRule) -> Option<NaiveDate> {
    let counted = rule.occurrences.and_then(|count| nth_occurrence(rule, count));
    match (rule.end_date, counted) {
        (Some(end), Some(counted)) => Some(end.min(counted)),
        (end, counted) => end.or(counted),
    }
}

fn nth_occurrence(rule: &RecurrenceRule, count: u32) -> Option<NaiveDate> {
    let horizon = rule
        .start_date
        .checked_add_signed(Duration::days(MAX_HORIZON_DAYS))
        .unwrap_or(NaiveDate::MAX);
    let limit = rule.end_date.map_or(horizon, |end| end.min(horizon));
    let index = count.checked_sub(1)? as usize;

    match rule.pattern {
        RecurrencePattern::Monthly => monthly_candidates(rule, rule.start_date, limit).nth(index),
        RecurrencePattern::Custom => None,
        _ => rule
            .start_date
            .iter_days()
            .take_while(|day| *day <= limit)
            .filter(|day| is_pattern_day(rule, *day))
            .nth(index),
    }
}

/// Pattern membership for a day on or after the rule's start, ignoring exceptions
fn is_pattern_day(rule: &RecurrenceRule, day: NaiveDate) -> bool {
    let days_since = day.signed_duration_since(rule.start_date).num_days();
    if days_since < 0 {
        return false;
    }
    let interval = i64::from(rule.interval.max(1));
    let weeks_since = days_since / 7;

    match rule.pattern {
        RecurrencePattern::Daily => days_since % interval == 0,
        RecurrencePattern::Weekly => rule.days_of_week.contains(&day.weekday()) && weeks_since % interval == 0,
        RecurrencePattern::Biweekly => {
            rule.days_of_week.contains(&day.weekday()) && weeks_since % (interval * 2) == 0
        }
        RecurrencePattern::Monthly => {
            rule.day_of_month == Some(day.day()) && months_between(rule.start_date, day) % interval == 0
        }
        RecurrencePattern::Custom => false,
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    i64::from(to.year() - from.year()) * 12 + i64::from(to.month()) - i64::from(from.month())
}

/// Monthly candidate dates inside `from..=to`, one per touched month
///
/// Months without the requested day (e.g. the 31st in April) are skipped.
fn monthly_candidates(rule: &RecurrenceRule, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> + '_ {
    let day_of_month = rule.day_of_month.unwrap_or(0);
    let interval = i64::from(rule.interval.max(1));
    let total_months = if from > to { -1 } else { months_between(from, to) };

    (0..=total_months).filter_map(move |offset| {
        let month_index = i64::from(from.year()) * 12 + i64::from(from.month0()) + offset;
        let year = i32::try_from(month_index.div_euclid(12)).ok()?;
        let month = u32::try_from(month_index.rem_euclid(12)).ok()? + 1;
        let candidate = NaiveDate::from_ymd_opt(year, month, day_of_month)?;

        let in_range = candidate >= from && candidate <= to && candidate >= rule.start_date;
        (in_range && months_between(rule.start_date, candidate) % interval == 0).then_some(candidate)
    })
}
