use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use hearth_core::models::TaskPriority;
use hearth_core::recurrence::{parse_end_date, AnchorMode, RecurrenceSettings, SeriesOptions};

use crate::cli::RecurrenceArgs;

pub fn parse_due_date(date_str: &str) -> Result<DateTime<Utc>> {
    parse_date_string(date_str, Utc::now(), Dialect::Us)
        .map_err(|e| anyhow!("Failed to parse due date '{}': {}", date_str, e))
}

/// `YYYY-MM-DD` is taken as midnight UTC; anything else goes through the natural-language parser.
pub fn parse_until(date_str: &str) -> Result<DateTime<Utc>> {
    parse_end_date(date_str).or_else(|_| parse_due_date(date_str))
}

/// One `hearth list` filter term.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    Open,
    Done,
    Overdue,
    Today,
    Deleted,
    Priority(TaskPriority),
    Person(String),
    Category(String),
}

pub fn parse_filter_term(term: &str) -> Result<FilterTerm> {
    let term = term.trim();
    if let Some((key, value)) = term.split_once(':') {
        let value = value.trim();
        if value.is_empty() {
            return Err(anyhow!("Filter '{}' needs a value", key));
        }
        return match key.to_lowercase().as_str() {
            "priority" | "p" => Ok(FilterTerm::Priority(value.parse()?)),
            "person" | "who" => Ok(FilterTerm::Person(value.to_string())),
            "category" | "cat" => Ok(FilterTerm::Category(value.to_string())),
            _ => Err(anyhow!("Unknown filter '{}'", key)),
        };
    }

    match term.to_lowercase().as_str() {
        "open" | "pending" => Ok(FilterTerm::Open),
        "done" | "completed" => Ok(FilterTerm::Done),
        "overdue" => Ok(FilterTerm::Overdue),
        "today" => Ok(FilterTerm::Today),
        "deleted" => Ok(FilterTerm::Deleted),
        _ => Err(anyhow!("Unknown filter '{}'", term)),
    }
}

impl RecurrenceArgs {
    fn has_series_options(&self) -> bool {
        self.from_completion || self.until.is_some() || self.count.is_some() || self.copy_attachments
    }
}

/// Turns the recurrence flags into client settings. `None` means no recurrence flag was given.
pub fn recurrence_settings(args: &RecurrenceArgs) -> Result<Option<RecurrenceSettings>> {
    if let Some(pattern) = args.repeat {
        if args.has_series_options() {
            return Err(anyhow!(
                "--repeat cannot be combined with --from-completion, --until, --count or --copy-attachments; use --every instead"
            ));
        }
        return Ok(Some(RecurrenceSettings::Legacy { pattern }));
    }

    let options = SeriesOptions {
        from: if args.from_completion {
            AnchorMode::Completion
        } else {
            AnchorMode::DueDate
        },
        end_date: args.until.as_deref().map(parse_until).transpose()?,
        end_count: args.count,
        copy_attachments: args.copy_attachments,
    };

    if !args.on.is_empty() {
        return Ok(Some(RecurrenceSettings::Weekly {
            days: args.on.clone(),
            options,
        }));
    }

    if let Some(unit) = args.every {
        return Ok(Some(RecurrenceSettings::Interval {
            unit,
            interval: args.interval.unwrap_or(1),
            options,
        }));
    }

    if args.has_series_options() {
        return Err(anyhow!(
            "Recurrence options need one of --every, --on or --repeat"
        ));
    }
    Ok(None)
}
