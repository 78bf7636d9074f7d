use std::borrow::Cow;

use chrono::NaiveDate;

use crate::core::recurrence::{last_occurrence_bound, occurs_within, validate_rule};
use crate::error::{MatchError, Result};
use crate::models::{Availability, AvailabilityStatus, RecurrencePattern, ScheduleWindow};

/// Check the structural invariants of an availability entry
pub fn validate_availability(entry: &Availability) -> Result<()> {
    let invalid = |reason: String| MatchError::InvalidAvailability {
        id: entry.id.clone(),
        reason,
    };

    if let Some(end) = entry.end_date {
        if end < entry.start_date {
            return Err(invalid(format!("end date {} is before start date {}", end, entry.start_date)));
        }
    }
    if let Some(slot) = entry.time_slots.iter().find(|slot| !slot.is_valid()) {
        return Err(invalid(format!(
            "time slot start {} must be before end {}",
            slot.start, slot.end
        )));
    }

    if entry.is_recurring {
        let rule = entry
            .recurrence
            .as_ref()
            .ok_or_else(|| invalid("recurring entry has no recurrence rule".into()))?;
        if rule.end_date.is_none() && rule.occurrences.is_none() {
            return Err(invalid("recurrence rule needs an end date or an occurrence count".into()));
        }
        if rule.pattern != RecurrencePattern::Custom {
            validate_rule(rule).map_err(|e| invalid(e.to_string()))?;
        }
    }

    Ok(())
}

/// Last date an entry can apply on, `None` when open-ended
pub fn effective_end(entry: &Availability) -> Option<NaiveDate> {
    let rule_end = entry
        .recurrence
        .as_ref()
        .filter(|_| entry.is_recurring)
        .and_then(last_occurrence_bound);

    match (entry.end_date, rule_end) {
        (Some(end), Some(rule_end)) => Some(end.min(rule_end)),
        (end, rule_end) => end.or(rule_end),
    }
}

/// Copy of `entry` with ACTIVE turned into EXPIRED once its last date is before `today`
pub fn expire_as_of(entry: &Availability, today: NaiveDate) -> Availability {
    let mut entry = entry.clone();
    if entry.status == AvailabilityStatus::Active && matches!(effective_end(&entry), Some(end) if end < today) {
        entry.status = AvailabilityStatus::Expired;
    }
    entry
}

/// Whether an entry applies on at least one day (and hour range) of `window`
///
/// Entries without time slots cover whole days. Entry-level exception dates
/// are honoured for both one-off and recurring entries.
pub fn entry_covers(entry: &Availability, window: &ScheduleWindow) -> Result<bool> {
    if let Some(hours) = window.hours {
        if !entry.time_slots.is_empty() && !entry.time_slots.iter().any(|slot| slot.overlaps(&hours)) {
            return Ok(false);
        }
    }

    let from = window.start.max(entry.start_date);
    let to = entry.end_date.map_or(window.end, |end| end.min(window.end));
    if from > to {
        return Ok(false);
    }

    if !entry.is_recurring {
        if entry.exceptions.is_empty() {
            return Ok(true);
        }
        return Ok(from
            .iter_days()
            .take_while(|day| *day <= to)
            .any(|day| !entry.exceptions.contains(&day)));
    }

    let rule = entry.recurrence.as_ref().ok_or_else(|| MatchError::InvalidAvailability {
        id: entry.id.clone(),
        reason: "recurring entry has no recurrence rule".into(),
    })?;

    let rule = if entry.exceptions.is_empty() {
        Cow::Borrowed(rule)
    } else {
        let mut merged = rule.clone();
        merged.exceptions.extend(entry.exceptions.iter().copied());
        Cow::Owned(merged)
    };

    occurs_within(&rule, from, to)
}

/// Whether any ACTIVE UNAVAILABLE entry blocks `proposed_start..=proposed_end`
///
/// Having no entries at all is not a conflict.
pub fn has_conflict(entries: &[Availability], proposed_start: NaiveDate, proposed_end: NaiveDate) -> Result<bool> {
    has_conflict_in(entries, &ScheduleWindow::new(proposed_start, proposed_end))
}

/// [`has_conflict`] for a window that may carry daily hours
pub fn has_conflict_in(entries: &[Availability], window: &ScheduleWindow) -> Result<bool> {
    check_window(window)?;

    for entry in entries.iter().filter(|e| e.is_active() && e.is_blocking()) {
        validate_availability(entry)?;
        if entry_covers(entry, window)? {
            tracing::trace!("Availability {} blocks {}..={}", entry.id, window.start, window.end);
            return Ok(true);
        }
    }

    Ok(false)
}

/// Whether an ACTIVE AVAILABLE or PREFERRED entry overlaps `window`
pub fn declares_free_in(entries: &[Availability], window: &ScheduleWindow) -> Result<bool> {
    check_window(window)?;

    for entry in entries.iter().filter(|e| e.is_active() && e.declares_free()) {
        validate_availability(entry)?;
        if entry_covers(entry, window)? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Binary availability dimension (0 or 1)
///
/// With a job window: 1 when nothing blocks it and the worker declared
/// themselves free during it. Without one: 1 when the worker has any
/// active positive declaration.
pub fn availability_score(entries: &[Availability], window: Option<&ScheduleWindow>) -> Result<f64> {
    let available = match window {
        Some(window) => !has_conflict_in(entries, window)? && declares_free_in(entries, window)?,
        None => entries.iter().any(|e| e.is_active() && e.declares_free()),
    };

    Ok(if available { 1.0 } else { 0.0 })
}

fn check_window(window: &ScheduleWindow) -> Result<()> {
    if window.start > window.end {
        return Err(MatchError::InvalidRange {
            start: window.start,
            end: window.end,
        });
    }
    Ok(())
}
