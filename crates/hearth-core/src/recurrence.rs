//! Recurring-task rules and the pure calendar logic behind them.
//!
//! A [`RecurrenceRule`] is stored on every task of a series and copied verbatim
//! onto each successor. Two pure functions drive the lifecycle:
//!
//! - [`next_occurrence`] computes the due date of the next instance;
//! - [`has_ended`] decides whether the series stops before producing it.
//!
//! Client input arrives as [`RecurrenceSettings`], a tagged variant that is
//! validated once by [`parse_recurrence_settings`].

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum RecurrenceUnit {
    Day,
    Week,
    Month,
    Year,
    /// Monday through Friday, one business day at a time.
    Weekday,
}

impl fmt::Display for RecurrenceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceUnit::Day => write!(f, "day"),
            RecurrenceUnit::Week => write!(f, "week"),
            RecurrenceUnit::Month => write!(f, "month"),
            RecurrenceUnit::Year => write!(f, "year"),
            RecurrenceUnit::Weekday => write!(f, "weekday"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence unit: {0}")]
pub struct ParseRecurrenceUnitError(String);

impl FromStr for RecurrenceUnit {
    type Err = ParseRecurrenceUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "days" => Ok(RecurrenceUnit::Day),
            "week" | "weeks" => Ok(RecurrenceUnit::Week),
            "month" | "months" => Ok(RecurrenceUnit::Month),
            "year" | "years" => Ok(RecurrenceUnit::Year),
            "weekday" | "weekdays" => Ok(RecurrenceUnit::Weekday),
            _ => Err(ParseRecurrenceUnitError(s.to_string())),
        }
    }
}

/// Which date the next occurrence is counted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum AnchorMode {
    #[default]
    DueDate,
    Completion,
}

impl FromStr for AnchorMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "due_date" | "due" => Ok(AnchorMode::DueDate),
            "completion" | "completed" => Ok(AnchorMode::Completion),
            _ => Err(CoreError::InvalidRecurrence(format!("unknown anchor '{}'", s))),
        }
    }
}

/// Pre-`unit` rule format, still read from older rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum LegacyPattern {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for LegacyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyPattern::Daily => write!(f, "daily"),
            LegacyPattern::Weekly => write!(f, "weekly"),
            LegacyPattern::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for LegacyPattern {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(LegacyPattern::Daily),
            "weekly" => Ok(LegacyPattern::Weekly),
            "monthly" => Ok(LegacyPattern::Monthly),
            _ => Err(CoreError::InvalidRecurrence(format!(
                "unknown pattern '{}', expected daily, weekly or monthly",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        };
        f.write_str(name)
    }
}

impl FromStr for DayOfWeek {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(DayOfWeek::Monday),
            "tuesday" | "tue" => Ok(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Ok(DayOfWeek::Wednesday),
            "thursday" | "thu" => Ok(DayOfWeek::Thursday),
            "friday" | "fri" => Ok(DayOfWeek::Friday),
            "saturday" | "sat" => Ok(DayOfWeek::Saturday),
            "sunday" | "sun" => Ok(DayOfWeek::Sunday),
            _ => Err(CoreError::InvalidRecurrence(format!("unknown day of week '{}'", s))),
        }
    }
}

/// The persisted description of how a task repeats.
///
/// A rule with neither `unit` nor `legacy_pattern` does not repeat; this is
/// what [`RecurrenceRule::default`] produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub unit: Option<RecurrenceUnit>,
    /// Step count in `unit`s. Ignored for `weekday` and for day sets.
    pub interval: u32,
    /// Only meaningful with `unit = week`.
    pub days_of_week: Option<BTreeSet<DayOfWeek>>,
    pub anchor: AnchorMode,
    pub end_date: Option<DateTime<Utc>>,
    pub end_count: Option<u32>,
    pub legacy_pattern: Option<LegacyPattern>,
    pub copy_attachments: bool,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            unit: None,
            interval: 1,
            days_of_week: None,
            anchor: AnchorMode::DueDate,
            end_date: None,
            end_count: None,
            legacy_pattern: None,
            copy_attachments: false,
        }
    }
}

/// A rule reduced to the single stepping behaviour it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence<'a> {
    Days(u32),
    Weeks(u32),
    OnDays(&'a BTreeSet<DayOfWeek>),
    Months(u32),
    Years(u32),
    Weekdays,
}

impl RecurrenceRule {
    /// A rule in the old single-keyword format.
    pub fn legacy(pattern: LegacyPattern) -> Self {
        Self {
            legacy_pattern: Some(pattern),
            ..Self::default()
        }
    }

    /// Every `interval` `unit`s, counted from the due date.
    pub fn every(unit: RecurrenceUnit, interval: u32) -> Self {
        Self {
            unit: Some(unit),
            interval,
            ..Self::default()
        }
    }

    /// Weekly on the given days.
    pub fn on_days(days: impl IntoIterator<Item = DayOfWeek>) -> Self {
        Self {
            unit: Some(RecurrenceUnit::Week),
            days_of_week: Some(days.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.unit.is_some() || self.legacy_pattern.is_some()
    }

    /// Resolves the unit / legacy pattern pair into what the calculator steps by.
    /// `unit` wins whenever both are present.
    pub fn cadence(&self) -> Option<Cadence<'_>> {
        let interval = self.interval.max(1);
        match (self.unit, self.legacy_pattern) {
            (Some(unit), _) => Some(match unit {
                RecurrenceUnit::Day => Cadence::Days(interval),
                RecurrenceUnit::Week => match &self.days_of_week {
                    Some(days) => Cadence::OnDays(days),
                    None => Cadence::Weeks(interval),
                },
                RecurrenceUnit::Month => Cadence::Months(interval),
                RecurrenceUnit::Year => Cadence::Years(interval),
                RecurrenceUnit::Weekday => Cadence::Weekdays,
            }),
            (None, Some(LegacyPattern::Daily)) => Some(Cadence::Days(1)),
            (None, Some(LegacyPattern::Weekly)) => Some(Cadence::Weeks(1)),
            (None, Some(LegacyPattern::Monthly)) => Some(Cadence::Months(1)),
            (None, None) => None,
        }
    }

    /// Legacy rules are always counted from the due date.
    pub fn effective_anchor(&self) -> AnchorMode {
        if self.unit.is_some() {
            self.anchor
        } else {
            AnchorMode::DueDate
        }
    }

    /// Rejects rules that could not have come out of [`parse_recurrence_settings`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval == 0 {
            return Err(CoreError::InvalidRecurrence(
                "interval must be a positive integer".to_string(),
            ));
        }
        if self.end_count == Some(0) {
            return Err(CoreError::InvalidRecurrence(
                "end count must be a positive integer".to_string(),
            ));
        }
        match &self.days_of_week {
            Some(_) if self.unit != Some(RecurrenceUnit::Week) => Err(CoreError::InvalidRecurrence(
                "days of week require a weekly unit".to_string(),
            )),
            Some(days) if days.is_empty() => Err(CoreError::InvalidRecurrence(
                "weekly recurrence needs at least one day".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// The old keyword equivalent of this rule, when one exists.
    fn legacy_alias(&self) -> Option<LegacyPattern> {
        if self.interval != 1 {
            return None;
        }
        match (self.unit?, &self.days_of_week) {
            (RecurrenceUnit::Day, _) => Some(LegacyPattern::Daily),
            (RecurrenceUnit::Week, None) => Some(LegacyPattern::Weekly),
            (RecurrenceUnit::Month, _) => Some(LegacyPattern::Monthly),
            _ => None,
        }
    }
}

/// Position of a task inside its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesState {
    /// 1-based; the first task of a series is occurrence 1.
    pub occurrence_number: u32,
    /// Shared by every task in the series, assigned on first materialization.
    pub group_id: Option<Uuid>,
    /// The task the series started from. Never changes once set.
    pub parent_task_id: Option<Uuid>,
}

impl Default for SeriesState {
    fn default() -> Self {
        Self {
            occurrence_number: 1,
            group_id: None,
            parent_task_id: None,
        }
    }
}

impl SeriesState {
    /// Bookkeeping for the instance that follows `task_id`.
    pub fn successor(&self, task_id: Uuid) -> SeriesState {
        SeriesState {
            occurrence_number: self.occurrence_number.saturating_add(1),
            group_id: Some(self.group_id.unwrap_or_else(Uuid::now_v7)),
            parent_task_id: Some(self.parent_task_id.unwrap_or(task_id)),
        }
    }
}

/// Computes the due date of the next occurrence.
///
/// The base date is `completed_at` for rules anchored on completion and
/// `current_due` otherwise. Returns `None` when the rule does not repeat, when
/// the base date is missing, or when the arithmetic leaves chrono's range.
pub fn next_occurrence(
    rule: &RecurrenceRule,
    current_due: Option<DateTime<Utc>>,
    completed_at: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let cadence = rule.cadence()?;
    let base = match rule.effective_anchor() {
        AnchorMode::Completion => completed_at,
        AnchorMode::DueDate => current_due?,
    };

    match cadence {
        Cadence::Days(n) => base.checked_add_signed(Duration::days(i64::from(n))),
        Cadence::Weeks(n) => base.checked_add_signed(Duration::days(7 * i64::from(n))),
        Cadence::OnDays(days) => next_matching_day(base, days),
        // chrono clamps to the last day of the target month
        Cadence::Months(n) => base.checked_add_months(Months::new(n)),
        Cadence::Years(n) => base.checked_add_months(Months::new(n.checked_mul(12)?)),
        Cadence::Weekdays => next_business_day(base),
    }
}

fn next_matching_day(base: DateTime<Utc>, days: &BTreeSet<DayOfWeek>) -> Option<DateTime<Utc>> {
    (1..=7)
        .filter_map(|offset| base.checked_add_signed(Duration::days(offset)))
        .find(|candidate| days.contains(&DayOfWeek::from(candidate.weekday())))
}

/// The next Monday to Friday after `base`. `interval` is ignored for weekday stepping.
fn next_business_day(base: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (1..=3)
        .filter_map(|offset| base.checked_add_signed(Duration::days(offset)))
        .find(|candidate| !matches!(candidate.weekday(), Weekday::Sat | Weekday::Sun))
}

/// Whether the series stops at the task described by `series`.
///
/// End date and end count are independent; either one ends the series. The
/// check uses the current occurrence number, so `end_count = 3` still yields
/// occurrence 3 and stops before 4.
pub fn has_ended(rule: &RecurrenceRule, series: &SeriesState, now: DateTime<Utc>) -> bool {
    let past_end_date = rule.end_date.is_some_and(|end| now >= end);
    let count_reached = rule
        .end_count
        .is_some_and(|count| series.occurrence_number >= count);
    past_end_date || count_reached
}

/// End conditions and anchoring shared by every repeating settings variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOptions {
    #[serde(default)]
    pub from: AnchorMode,
    #[serde(default, deserialize_with = "deserialize_end_date")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_count: Option<i64>,
    #[serde(default)]
    pub copy_attachments: bool,
}

/// Recurrence settings as a client submits them.
///
/// ```json
/// { "type": "interval", "unit": "week", "interval": 2, "endCount": 5 }
/// { "type": "weekly", "days": ["monday", "friday"], "from": "completion" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceSettings {
    None,
    Interval {
        unit: RecurrenceUnit,
        #[serde(default = "default_interval")]
        interval: i64,
        #[serde(flatten)]
        options: SeriesOptions,
    },
    Weekly {
        days: Vec<DayOfWeek>,
        #[serde(flatten)]
        options: SeriesOptions,
    },
    Legacy {
        pattern: LegacyPattern,
    },
}

fn default_interval() -> i64 {
    1
}

fn deserialize_end_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_end_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_end_date(value: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::InvalidRecurrence(format!("invalid end date '{}'", value)))
}

impl RecurrenceSettings {
    /// Decodes client JSON; unknown units and malformed shapes are rejected here.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidRecurrence(e.to_string()))
    }
}

/// Validates client settings into the canonical stored rule.
///
/// `None` settings produce no rule. Simple daily, weekly (without a day set)
/// and monthly rules with interval 1 also carry the legacy keyword alias.
pub fn parse_recurrence_settings(
    settings: &RecurrenceSettings,
) -> Result<Option<RecurrenceRule>, CoreError> {
    let rule = match settings {
        RecurrenceSettings::None => return Ok(None),
        RecurrenceSettings::Legacy { pattern } => return Ok(Some(RecurrenceRule::legacy(*pattern))),
        RecurrenceSettings::Interval {
            unit,
            interval,
            options,
        } => {
            let interval = u32::try_from(*interval)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| {
                    CoreError::InvalidRecurrence(format!(
                        "interval must be a positive integer, got {}",
                        interval
                    ))
                })?;
            apply_options(RecurrenceRule::every(*unit, interval), options)?
        }
        RecurrenceSettings::Weekly { days, options } => {
            if days.is_empty() {
                return Err(CoreError::InvalidRecurrence(
                    "weekly recurrence needs at least one day".to_string(),
                ));
            }
            apply_options(RecurrenceRule::on_days(days.iter().copied()), options)?
        }
    };

    Ok(Some(RecurrenceRule {
        legacy_pattern: rule.legacy_alias(),
        ..rule
    }))
}

fn apply_options(rule: RecurrenceRule, options: &SeriesOptions) -> Result<RecurrenceRule, CoreError> {
    let end_count = options
        .end_count
        .map(|count| {
            u32::try_from(count).ok().filter(|n| *n >= 1).ok_or_else(|| {
                CoreError::InvalidRecurrence(format!(
                    "end count must be a positive integer, got {}",
                    count
                ))
            })
        })
        .transpose()?;

    Ok(RecurrenceRule {
        anchor: options.from,
        end_date: options.end_date,
        end_count,
        copy_attachments: options.copy_attachments,
        ..rule
    })
}

/// Human readable description, e.g. `Every 2 weeks (from completion) (3/10)`.
pub fn summarize(rule: &RecurrenceRule, series: &SeriesState) -> Option<String> {
    let cadence = rule.cadence()?;
    let Some(unit) = rule.unit else {
        return rule.legacy_pattern.map(|pattern| pattern.to_string());
    };

    let mut summary = match cadence {
        Cadence::Weekdays => "Every weekday".to_string(),
        Cadence::OnDays(days) => format!(
            "Every {}",
            days.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ),
        _ if rule.interval <= 1 => format!("Every {}", unit),
        _ => format!("Every {} {}s", rule.interval, unit),
    };

    if rule.anchor == AnchorMode::Completion {
        summary.push_str(" (from completion)");
    }

    if let Some(end_date) = rule.end_date {
        summary.push_str(&format!(" until {}", end_date.format("%Y-%m-%d")));
    } else if let Some(end_count) = rule.end_count {
        summary.push_str(&format!(" ({}/{})", series.occurrence_number, end_count));
    }

    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    mod calculator_tests {
        use super::*;

        #[rstest]
        #[case::daily(RecurrenceRule::every(RecurrenceUnit::Day, 1), utc(2024, 3, 10), utc(2024, 3, 11))]
        #[case::every_three_days(RecurrenceRule::every(RecurrenceUnit::Day, 3), utc(2024, 2, 27), utc(2024, 3, 1))]
        #[case::fortnightly(RecurrenceRule::every(RecurrenceUnit::Week, 2), utc(2024, 1, 1), utc(2024, 1, 15))]
        #[case::monthly_leap_clamp(RecurrenceRule::every(RecurrenceUnit::Month, 1), utc(2024, 1, 31), utc(2024, 2, 29))]
        #[case::monthly_common_clamp(RecurrenceRule::every(RecurrenceUnit::Month, 1), utc(2023, 1, 31), utc(2023, 2, 28))]
        #[case::quarterly_clamp(RecurrenceRule::every(RecurrenceUnit::Month, 3), utc(2024, 5, 31), utc(2024, 8, 31))]
        #[case::monthly_into_30_day_month(RecurrenceRule::every(RecurrenceUnit::Month, 1), utc(2024, 3, 31), utc(2024, 4, 30))]
        #[case::monthly_over_year_end(RecurrenceRule::every(RecurrenceUnit::Month, 2), utc(2024, 12, 15), utc(2025, 2, 15))]
        #[case::yearly(RecurrenceRule::every(RecurrenceUnit::Year, 1), utc(2023, 6, 1), utc(2024, 6, 1))]
        #[case::yearly_leap_day(RecurrenceRule::every(RecurrenceUnit::Year, 1), utc(2024, 2, 29), utc(2025, 2, 28))]
        #[case::four_years_from_leap_day(RecurrenceRule::every(RecurrenceUnit::Year, 4), utc(2024, 2, 29), utc(2028, 2, 29))]
        #[case::weekday_from_friday(RecurrenceRule::every(RecurrenceUnit::Weekday, 1), utc(2024, 1, 5), utc(2024, 1, 8))]
        #[case::weekday_from_saturday(RecurrenceRule::every(RecurrenceUnit::Weekday, 1), utc(2024, 1, 6), utc(2024, 1, 8))]
        #[case::weekday_midweek(RecurrenceRule::every(RecurrenceUnit::Weekday, 1), utc(2024, 1, 2), utc(2024, 1, 3))]
        #[case::weekday_ignores_interval(RecurrenceRule::every(RecurrenceUnit::Weekday, 5), utc(2024, 1, 2), utc(2024, 1, 3))]
        #[case::legacy_daily(RecurrenceRule::legacy(LegacyPattern::Daily), utc(2024, 3, 10), utc(2024, 3, 11))]
        #[case::legacy_weekly(RecurrenceRule::legacy(LegacyPattern::Weekly), utc(2024, 3, 10), utc(2024, 3, 17))]
        #[case::legacy_monthly(RecurrenceRule::legacy(LegacyPattern::Monthly), utc(2024, 1, 31), utc(2024, 2, 29))]
        fn test_next_occurrence_from_due_date(
            #[case] rule: RecurrenceRule,
            #[case] due: DateTime<Utc>,
            #[case] expected: DateTime<Utc>,
        ) {
            assert_eq!(next_occurrence(&rule, Some(due), utc(2030, 1, 1)), Some(expected));
        }

        #[test]
        fn test_time_of_day_is_preserved() {
            let due = Utc.with_ymd_and_hms(2024, 3, 10, 18, 30, 0).unwrap();
            let rule = RecurrenceRule::every(RecurrenceUnit::Month, 1);
            let expected = Utc.with_ymd_and_hms(2024, 4, 10, 18, 30, 0).unwrap();
            assert_eq!(next_occurrence(&rule, Some(due), Utc::now()), Some(expected));
        }

        #[test]
        fn test_specific_days_never_return_base_date() {
            // 2024-01-05 is a Friday
            let rule = RecurrenceRule::on_days([DayOfWeek::Friday]);
            assert_eq!(
                next_occurrence(&rule, Some(utc(2024, 1, 5)), Utc::now()),
                Some(utc(2024, 1, 12))
            );
        }

        #[test]
        fn test_specific_days_pick_nearest_and_ignore_interval() {
            let mut rule = RecurrenceRule::on_days([DayOfWeek::Monday, DayOfWeek::Thursday]);
            rule.interval = 4;
            // Tuesday -> Thursday
            assert_eq!(
                next_occurrence(&rule, Some(utc(2024, 1, 2)), Utc::now()),
                Some(utc(2024, 1, 4))
            );
            // Thursday -> Monday
            assert_eq!(
                next_occurrence(&rule, Some(utc(2024, 1, 4)), Utc::now()),
                Some(utc(2024, 1, 8))
            );
        }

        #[test]
        fn test_empty_day_set_has_no_next_date() {
            let rule = RecurrenceRule::on_days([]);
            assert_eq!(next_occurrence(&rule, Some(utc(2024, 1, 2)), Utc::now()), None);
        }

        #[test]
        fn test_completion_anchor_uses_completion_time() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Day, 2);
            rule.anchor = AnchorMode::Completion;
            let completed_at = utc(2024, 5, 20);
            assert_eq!(
                next_occurrence(&rule, Some(utc(2024, 5, 1)), completed_at),
                Some(utc(2024, 5, 22))
            );
            // No due date is fine when anchored on completion
            assert_eq!(next_occurrence(&rule, None, completed_at), Some(utc(2024, 5, 22)));
        }

        #[test]
        fn test_legacy_pattern_forces_due_date_anchor() {
            let mut rule = RecurrenceRule::legacy(LegacyPattern::Daily);
            rule.anchor = AnchorMode::Completion;
            assert_eq!(
                next_occurrence(&rule, Some(utc(2024, 3, 10)), utc(2024, 6, 1)),
                Some(utc(2024, 3, 11))
            );
        }

        #[test]
        fn test_unit_takes_precedence_over_legacy_pattern() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Week, 1);
            rule.legacy_pattern = Some(LegacyPattern::Monthly);
            assert_eq!(
                next_occurrence(&rule, Some(utc(2024, 1, 1)), Utc::now()),
                Some(utc(2024, 1, 8))
            );
        }

        #[test]
        fn test_missing_due_date_yields_none() {
            let rule = RecurrenceRule::every(RecurrenceUnit::Day, 1);
            assert_eq!(next_occurrence(&rule, None, Utc::now()), None);
        }

        #[test]
        fn test_non_recurring_rule_yields_none() {
            let rule = RecurrenceRule::default();
            assert!(!rule.is_recurring());
            assert_eq!(next_occurrence(&rule, Some(utc(2024, 1, 1)), Utc::now()), None);
        }

        #[test]
        fn test_legacy_daily_timestamp_scenario() {
            let due: DateTime<Utc> = "2024-03-10T00:00:00Z".parse().unwrap();
            let rule = RecurrenceRule::legacy(LegacyPattern::Daily);
            let next = next_occurrence(&rule, Some(due), Utc::now()).unwrap();
            assert_eq!(next.to_rfc3339(), "2024-03-11T00:00:00+00:00");
        }
    }

    mod termination_tests {
        use super::*;

        fn at(occurrence_number: u32) -> SeriesState {
            SeriesState {
                occurrence_number,
                ..SeriesState::default()
            }
        }

        #[test]
        fn test_unbounded_series_never_ends() {
            let rule = RecurrenceRule::every(RecurrenceUnit::Day, 1);
            assert!(!has_ended(&rule, &at(10_000), utc(2100, 1, 1)));
        }

        #[test]
        fn test_end_count_is_inclusive() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Day, 1);
            rule.end_count = Some(3);
            assert!(!has_ended(&rule, &at(1), Utc::now()));
            assert!(!has_ended(&rule, &at(2), Utc::now()));
            assert!(has_ended(&rule, &at(3), Utc::now()));
        }

        #[test]
        fn test_end_count_two_at_second_occurrence() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Week, 1);
            rule.end_count = Some(2);
            assert!(has_ended(&rule, &at(2), Utc::now()));
        }

        #[test]
        fn test_end_date_reached_or_passed() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Day, 1);
            rule.end_date = Some(utc(2024, 6, 1));
            assert!(!has_ended(&rule, &at(1), utc(2024, 5, 31)));
            assert!(has_ended(&rule, &at(1), utc(2024, 6, 1)));
            assert!(has_ended(&rule, &at(1), utc(2024, 7, 1)));
        }

        #[test]
        fn test_conditions_are_independent() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Day, 1);
            rule.end_date = Some(utc(2024, 6, 1));
            rule.end_count = Some(5);
            // count reached, date not
            assert!(has_ended(&rule, &at(5), utc(2024, 1, 1)));
            // date reached, count not
            assert!(has_ended(&rule, &at(1), utc(2024, 6, 2)));
            assert!(!has_ended(&rule, &at(4), utc(2024, 5, 1)));
        }
    }

    mod series_state_tests {
        use super::*;

        #[test]
        fn test_first_successor_generates_group_and_links_origin() {
            let origin = Uuid::now_v7();
            let next = SeriesState::default().successor(origin);
            assert_eq!(next.occurrence_number, 2);
            assert!(next.group_id.is_some());
            assert_eq!(next.parent_task_id, Some(origin));
        }

        #[test]
        fn test_later_successors_propagate_group_and_parent() {
            let group = Uuid::now_v7();
            let origin = Uuid::now_v7();
            let state = SeriesState {
                occurrence_number: 4,
                group_id: Some(group),
                parent_task_id: Some(origin),
            };
            let next = state.successor(Uuid::now_v7());
            assert_eq!(next.occurrence_number, 5);
            assert_eq!(next.group_id, Some(group));
            assert_eq!(next.parent_task_id, Some(origin));
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_none_settings_produce_no_rule() {
            assert_eq!(parse_recurrence_settings(&RecurrenceSettings::None).unwrap(), None);
            let parsed = RecurrenceSettings::from_json(r#"{"type":"none"}"#).unwrap();
            assert_eq!(parsed, RecurrenceSettings::None);
        }

        #[rstest]
        #[case(RecurrenceUnit::Day, Some(LegacyPattern::Daily))]
        #[case(RecurrenceUnit::Week, Some(LegacyPattern::Weekly))]
        #[case(RecurrenceUnit::Month, Some(LegacyPattern::Monthly))]
        #[case(RecurrenceUnit::Year, None)]
        #[case(RecurrenceUnit::Weekday, None)]
        fn test_legacy_alias_for_simple_rules(
            #[case] unit: RecurrenceUnit,
            #[case] alias: Option<LegacyPattern>,
        ) {
            let settings = RecurrenceSettings::Interval {
                unit,
                interval: 1,
                options: SeriesOptions::default(),
            };
            let rule = parse_recurrence_settings(&settings).unwrap().unwrap();
            assert_eq!(rule.unit, Some(unit));
            assert_eq!(rule.legacy_pattern, alias);
        }

        #[test]
        fn test_no_alias_when_interval_above_one() {
            let settings = RecurrenceSettings::Interval {
                unit: RecurrenceUnit::Day,
                interval: 2,
                options: SeriesOptions::default(),
            };
            let rule = parse_recurrence_settings(&settings).unwrap().unwrap();
            assert_eq!(rule.interval, 2);
            assert_eq!(rule.legacy_pattern, None);
        }

        #[test]
        fn test_weekly_days_have_no_alias() {
            let json = r#"{"type":"weekly","days":["friday","monday","friday"],"from":"completion","copyAttachments":true}"#;
            let settings = RecurrenceSettings::from_json(json).unwrap();
            let rule = parse_recurrence_settings(&settings).unwrap().unwrap();
            assert_eq!(rule.unit, Some(RecurrenceUnit::Week));
            assert_eq!(
                rule.days_of_week,
                Some(BTreeSet::from([DayOfWeek::Monday, DayOfWeek::Friday]))
            );
            assert_eq!(rule.anchor, AnchorMode::Completion);
            assert!(rule.copy_attachments);
            assert_eq!(rule.legacy_pattern, None);
        }

        #[test]
        fn test_end_conditions_are_carried() {
            let json = r#"{"type":"interval","unit":"month","interval":1,"endDate":"2024-12-31","endCount":6}"#;
            let settings = RecurrenceSettings::from_json(json).unwrap();
            let rule = parse_recurrence_settings(&settings).unwrap().unwrap();
            assert_eq!(rule.end_date, Some(utc(2024, 12, 31)));
            assert_eq!(rule.end_count, Some(6));
        }

        #[test]
        fn test_interval_defaults_to_one() {
            let settings = RecurrenceSettings::from_json(r#"{"type":"interval","unit":"year"}"#).unwrap();
            let rule = parse_recurrence_settings(&settings).unwrap().unwrap();
            assert_eq!(rule.interval, 1);
        }

        #[rstest]
        #[case::unknown_unit(r#"{"type":"interval","unit":"fortnight"}"#)]
        #[case::unknown_type(r#"{"type":"sometimes"}"#)]
        #[case::bad_end_date(r#"{"type":"interval","unit":"day","endDate":"next tuesday"}"#)]
        #[case::unknown_day(r#"{"type":"weekly","days":["caturday"]}"#)]
        fn test_malformed_json_is_rejected(#[case] json: &str) {
            assert!(matches!(
                RecurrenceSettings::from_json(json),
                Err(CoreError::InvalidRecurrence(_))
            ));
        }

        #[rstest]
        #[case::zero_interval(RecurrenceSettings::Interval { unit: RecurrenceUnit::Day, interval: 0, options: SeriesOptions::default() })]
        #[case::negative_interval(RecurrenceSettings::Interval { unit: RecurrenceUnit::Week, interval: -2, options: SeriesOptions::default() })]
        #[case::empty_days(RecurrenceSettings::Weekly { days: vec![], options: SeriesOptions::default() })]
        #[case::zero_end_count(RecurrenceSettings::Interval {
            unit: RecurrenceUnit::Day,
            interval: 1,
            options: SeriesOptions { end_count: Some(0), ..SeriesOptions::default() },
        })]
        fn test_invalid_settings_are_rejected(#[case] settings: RecurrenceSettings) {
            assert!(matches!(
                parse_recurrence_settings(&settings),
                Err(CoreError::InvalidRecurrence(_))
            ));
        }

        #[test]
        fn test_legacy_settings() {
            let settings = RecurrenceSettings::from_json(r#"{"type":"legacy","pattern":"weekly"}"#).unwrap();
            let rule = parse_recurrence_settings(&settings).unwrap().unwrap();
            assert_eq!(rule, RecurrenceRule::legacy(LegacyPattern::Weekly));
        }

        #[test]
        fn test_validate_hand_built_rules() {
            assert!(RecurrenceRule::every(RecurrenceUnit::Day, 3).validate().is_ok());
            assert!(RecurrenceRule::every(RecurrenceUnit::Day, 0).validate().is_err());
            assert!(RecurrenceRule::on_days([]).validate().is_err());

            let mut days_on_month = RecurrenceRule::on_days([DayOfWeek::Monday]);
            days_on_month.unit = Some(RecurrenceUnit::Month);
            assert!(matches!(
                days_on_month.validate(),
                Err(CoreError::InvalidRecurrence(_))
            ));
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_summaries() {
            let series = SeriesState::default();
            assert_eq!(summarize(&RecurrenceRule::default(), &series), None);
            assert_eq!(
                summarize(&RecurrenceRule::legacy(LegacyPattern::Monthly), &series).as_deref(),
                Some("monthly")
            );
            assert_eq!(
                summarize(&RecurrenceRule::every(RecurrenceUnit::Day, 1), &series).as_deref(),
                Some("Every day")
            );
            assert_eq!(
                summarize(&RecurrenceRule::every(RecurrenceUnit::Week, 2), &series).as_deref(),
                Some("Every 2 weeks")
            );
            assert_eq!(
                summarize(&RecurrenceRule::every(RecurrenceUnit::Weekday, 1), &series).as_deref(),
                Some("Every weekday")
            );
            assert_eq!(
                summarize(&RecurrenceRule::on_days([DayOfWeek::Friday, DayOfWeek::Monday]), &series)
                    .as_deref(),
                Some("Every monday, friday")
            );
        }

        #[test]
        fn test_summary_suffixes() {
            let mut rule = RecurrenceRule::every(RecurrenceUnit::Month, 3);
            rule.anchor = AnchorMode::Completion;
            rule.end_count = Some(10);
            let series = SeriesState {
                occurrence_number: 3,
                ..SeriesState::default()
            };
            assert_eq!(
                summarize(&rule, &series).as_deref(),
                Some("Every 3 months (from completion) (3/10)")
            );

            rule.end_date = Some(utc(2025, 1, 31));
            assert_eq!(
                summarize(&rule, &series).as_deref(),
                Some("Every 3 months (from completion) until 2025-01-31")
            );
        }
    }

    mod properties {
        use super::*;

        fn any_base() -> impl Strategy<Value = DateTime<Utc>> {
            // 1970-01-01 .. roughly 2100, at any second of the day
            (0i64..47_000, 0i64..86_400).prop_map(|(days, secs)| {
                utc(1970, 1, 1) + Duration::days(days) + Duration::seconds(secs)
            })
        }

        fn last_day_of_month(year: i32, month: u32) -> u32 {
            let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
            NaiveDate::from_ymd_opt(next_year, next_month, 1)
                .unwrap()
                .pred_opt()
                .unwrap()
                .day()
        }

        proptest! {
            #[test]
            fn month_end_clamps_to_target_month_end(
                year in 1970i32..2100,
                month in prop::sample::select(vec![1u32, 3, 5, 7, 8, 10, 12]),
                interval in 1u32..36,
            ) {
                let base = utc(year, month, 31);
                let rule = RecurrenceRule::every(RecurrenceUnit::Month, interval);
                let next = next_occurrence(&rule, Some(base), Utc::now()).unwrap();

                let months_since_zero = (year * 12 + month as i32 - 1) + interval as i32;
                let target_year = months_since_zero.div_euclid(12);
                let target_month = months_since_zero.rem_euclid(12) as u32 + 1;
                prop_assert_eq!(next.year(), target_year);
                prop_assert_eq!(next.month(), target_month);
                prop_assert_eq!(next.day(), last_day_of_month(target_year, target_month));
            }

            #[test]
            fn friday_rule_lands_on_a_later_friday(base in any_base()) {
                let rule = RecurrenceRule::on_days([DayOfWeek::Friday]);
                let next = next_occurrence(&rule, Some(base), Utc::now()).unwrap();
                prop_assert!(next > base);
                prop_assert_eq!(next.weekday(), Weekday::Fri);
                prop_assert!(next - base <= Duration::days(7));
            }

            #[test]
            fn weekday_rule_skips_weekends(base in any_base()) {
                let rule = RecurrenceRule::every(RecurrenceUnit::Weekday, 1);
                let next = next_occurrence(&rule, Some(base), Utc::now()).unwrap();
                prop_assert!(next > base);
                prop_assert!(!matches!(next.weekday(), Weekday::Sat | Weekday::Sun));
            }

            #[test]
            fn end_count_boundary(end_count in 1u32..50, occurrence in 1u32..60) {
                let mut rule = RecurrenceRule::every(RecurrenceUnit::Day, 1);
                rule.end_count = Some(end_count);
                let state = SeriesState { occurrence_number: occurrence, ..SeriesState::default() };
                prop_assert_eq!(has_ended(&rule, &state, Utc::now()), occurrence >= end_count);
            }
        }
    }
}
