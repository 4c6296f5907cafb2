use chrono::format::ParseError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::format::Event;
use crate::scalar::LeafError;
use crate::types::DateType;
use crate::value::Value;

const DATE: &str = "%Y-%m-%d";
const LOCAL_DATE_TIMES: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
const OFFSET_DATE_TIMES: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Decodes a member of the date family.
///
/// Without a `pattern`, dates and instants are read as ISO-8601: text
/// containing a time separator (`T` or `t`) is a date-time, normalized to
/// UTC when it carries an offset and taken as UTC when it does not; any
/// other text is a calendar date at the start of that day in UTC. With a
/// `pattern`, the text must match it (in `strftime` syntax).
///
/// `Date` and `Instant` also accept a JSON number of milliseconds since the
/// epoch.
pub fn parse_date(
    kind: DateType,
    event: Event,
    text: &str,
    pattern: Option<&str>,
) -> Result<Value, LeafError> {
    match (kind, event) {
        (DateType::Date | DateType::Instant, Event::Number) => {
            let millis = text
                .parse::<i64>()
                .map_err(|_| LeafError::new("expected integral epoch milliseconds"))?;
            let instant = Utc
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| LeafError::new("timestamp out of range"))?;
            Ok(instant_value(kind, instant))
        }
        (_, Event::String) => match pattern {
            Some(pattern) => with_pattern(kind, text, pattern),
            None => iso(kind, text),
        }
        .map_err(|err| LeafError::new(err.to_string())),
        _ => Err(LeafError::new("expected a string")),
    }
}

fn instant_value(kind: DateType, instant: DateTime<Utc>) -> Value {
    match kind {
        DateType::Date => Value::Date(instant.timestamp_millis()),
        _ => Value::Instant(instant),
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn first_match<T>(
    formats: &[&str],
    mut parse: impl FnMut(&str) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    let mut result = parse(formats[0]);
    for format in &formats[1..] {
        if result.is_ok() {
            break;
        }
        result = parse(format);
    }
    result
}

fn iso_date_time(text: &str) -> Result<DateTime<Utc>, ParseError> {
    let mut normalized = text.to_ascii_uppercase();
    if normalized.ends_with('Z') {
        normalized.pop();
        normalized.push_str("+00:00");
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(instant.with_timezone(&Utc));
    }
    first_match(&OFFSET_DATE_TIMES, |format| {
        DateTime::parse_from_str(&normalized, format).map(|instant| instant.with_timezone(&Utc))
    })
    .or_else(|_| {
        first_match(&LOCAL_DATE_TIMES, |format| {
            NaiveDateTime::parse_from_str(&normalized, format)
                .map(|local| Utc.from_utc_datetime(&local))
        })
    })
}

fn iso_date(text: &str) -> Result<NaiveDate, ParseError> {
    // A trailing zone designator on a calendar date does not move the day.
    let date = match text.get(..10) {
        Some(date) if text.len() > 10 && is_zone(&text[10..]) => date,
        _ => text,
    };
    NaiveDate::parse_from_str(date, DATE)
}

fn is_zone(text: &str) -> bool {
    matches!(text, "Z" | "z")
        || (text.len() == 6
            && (text.starts_with('+') || text.starts_with('-'))
            && text.as_bytes()[3] == b':')
}

fn iso(kind: DateType, text: &str) -> Result<Value, ParseError> {
    match kind {
        DateType::Date => {
            let instant = if text.contains(['T', 't']) {
                iso_date_time(text)?
            } else {
                start_of_day(iso_date(text)?)
            };
            Ok(instant_value(kind, instant))
        }
        DateType::Instant => iso_date_time(text).map(Value::Instant),
        DateType::LocalDate => iso_date(text).map(Value::LocalDate),
        DateType::LocalDateTime => {
            let normalized = text.to_ascii_uppercase();
            first_match(&LOCAL_DATE_TIMES, |format| {
                NaiveDateTime::parse_from_str(&normalized, format)
            })
            .map(Value::LocalDateTime)
        }
    }
}

fn with_pattern(kind: DateType, text: &str, pattern: &str) -> Result<Value, ParseError> {
    match kind {
        DateType::Date | DateType::Instant => {
            let instant = DateTime::parse_from_str(text, pattern)
                .map(|instant| instant.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(text, pattern)
                        .map(|local| Utc.from_utc_datetime(&local))
                })
                .or_else(|_| NaiveDate::parse_from_str(text, pattern).map(start_of_day))?;
            Ok(instant_value(kind, instant))
        }
        DateType::LocalDate => NaiveDate::parse_from_str(text, pattern).map(Value::LocalDate),
        DateType::LocalDateTime => {
            NaiveDateTime::parse_from_str(text, pattern).map(Value::LocalDateTime)
        }
    }
}
