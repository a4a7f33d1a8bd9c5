use crate::error::{config_error, validation_error, AppResult};
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse an IANA timezone name such as `America/Sao_Paulo`
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))
}

/// Combine a calendar date with an `HH:MM` time in the given timezone
pub fn at_local_time(date: NaiveDate, time_str: &str, timezone: Tz) -> AppResult<DateTime<Tz>> {
    let (hour, minute) = parse_time(time_str)
        .ok_or_else(|| config_error(&format!("Invalid time format: {}", time_str)))?;

    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| validation_error("Failed to create datetime"))?;

    match timezone.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        // Take the earlier instant when a DST fall-back repeats the hour
        chrono::LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        chrono::LocalResult::None => Err(validation_error(&format!(
            "{} {} does not exist in {}",
            date, time_str, timezone
        ))),
    }
}

/// Start and end of a reminder on `date`, between two `HH:MM` times
pub fn reminder_window(
    date: NaiveDate,
    start_time: &str,
    end_time: &str,
    timezone: Tz,
) -> AppResult<(DateTime<Tz>, DateTime<Tz>)> {
    let start = at_local_time(date, start_time, timezone)?;
    let end = at_local_time(date, end_time, timezone)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        // Valid cases
        assert_eq!(parse_time("00:00"), Some((0, 0)));
        assert_eq!(parse_time("09:00"), Some((9, 0)));
        assert_eq!(parse_time("23:59"), Some((23, 59)));

        // Invalid cases
        assert_eq!(parse_time("24:00"), None); // Hour out of range
        assert_eq!(parse_time("12:60"), None); // Minute out of range
        assert_eq!(parse_time("12:30:45"), None); // Too many parts
        assert_eq!(parse_time("12"), None); // Too few parts
        assert_eq!(parse_time("ab:30"), None); // Invalid hour
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("UTC").unwrap(), chrono_tz::UTC);
        assert_eq!(
            parse_timezone("America/Sao_Paulo").unwrap(),
            chrono_tz::America::Sao_Paulo
        );
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_reminder_window_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (start, end) = reminder_window(date, "09:00", "17:00", chrono_tz::UTC).unwrap();

        assert_eq!(start.to_rfc3339(), "2024-05-01T09:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-05-01T17:00:00+00:00");
        assert!(start <= end);
    }

    #[test]
    fn test_reminder_window_keeps_offset() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (start, _) =
            reminder_window(date, "09:00", "17:00", chrono_tz::America::Sao_Paulo).unwrap();

        assert_eq!(start.to_rfc3339(), "2024-05-01T09:00:00-03:00");
    }

    #[test]
    fn test_nonexistent_local_time() {
        // Clocks jump from 02:00 to 03:00 in Berlin on this date
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert!(at_local_time(date, "02:30", chrono_tz::Europe::Berlin).is_err());
        assert!(at_local_time(date, "25:00", chrono_tz::UTC).is_err());
    }
}
