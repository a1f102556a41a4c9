//! Parsing of user-entered dates and human-readable rendering of timestamps.

use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const SECONDS_PER_DAY: i64 = 86_400;

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

/// Parses a deadline typed by the user.
///
/// Formats are tried in a fixed order and the first full match wins, so
/// `01/02/2025` is read month-first. Returns `None` for blank or
/// unrecognised input so the caller can fall back to "no deadline".
pub fn parse_datetime(input: &str) -> Option<OffsetDateTime> {
    parse_datetime_with_offset(input, local_offset())
}

pub fn parse_datetime_with_offset(input: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let naive = Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight())
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[year]-[month]-[day] [hour]:[minute]"),
            )
        })
        .or_else(|_| {
            Date::parse(
                trimmed,
                format_description!("[month padding:none]/[day padding:none]/[year]"),
            )
            .map(|date| date.midnight())
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!(
                    "[month padding:none]/[day padding:none]/[year] [hour]:[minute]:[second]"
                ),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[month padding:none]/[day padding:none]/[year] [hour]:[minute]"),
            )
        })
        .or_else(|_| {
            Date::parse(
                trimmed,
                format_description!("[day padding:none]/[month padding:none]/[year]"),
            )
            .map(|date| date.midnight())
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!(
                    "[day padding:none]/[month padding:none]/[year] [hour]:[minute]:[second]"
                ),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                trimmed,
                format_description!("[day padding:none]/[month padding:none]/[year] [hour]:[minute]"),
            )
        })
        .ok()?;

    Some(naive.assume_offset(offset))
}

pub fn format_datetime(value: Option<OffsetDateTime>) -> String {
    format_with(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
}

pub fn format_date(value: Option<OffsetDateTime>) -> String {
    format_with(value, format_description!("[year]-[month]-[day]"))
}

pub fn format_time(value: Option<OffsetDateTime>) -> String {
    format_with(value, format_description!("[hour]:[minute]:[second]"))
}

/// Relative rendering used in task tables: "Today at 14:30",
/// "Yesterday at 09:00", "Monday at 14:30", or a plain date beyond a week.
pub fn format_for_display(value: Option<OffsetDateTime>) -> String {
    format_for_display_at(value, now())
}

pub fn format_for_display_at(value: Option<OffsetDateTime>, now: OffsetDateTime) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };
    let value = value.to_offset(now.offset());
    let days = (now - value).whole_seconds().div_euclid(SECONDS_PER_DAY);
    let clock = hour_minute(value.time());

    match days {
        0 => format!("Today at {clock}"),
        1 => format!("Yesterday at {clock}"),
        d if d < 7 => format!("{} at {clock}", value.weekday()),
        _ => value
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .unwrap_or_else(|_| value.to_string()),
    }
}

fn hour_minute(value: Time) -> String {
    format!("{:02}:{:02}", value.hour(), value.minute())
}

fn format_with(
    value: Option<OffsetDateTime>,
    description: &[time::format_description::BorrowedFormatItem<'_>],
) -> String {
    match value {
        Some(value) => value.format(description).unwrap_or_default(),
        None => String::new(),
    }
}
