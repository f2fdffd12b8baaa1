use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2025-05-01T10:00:00Z`, `+07:00` offsets) and the naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` form the backend emits without an offset, which
/// is read as UTC. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2025-05-01T17:30:00+07:00").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.day(), 1);
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let ts = parse_timestamp("2025-05-01T10:15:30.123456").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 15);

        let ts = parse_timestamp("2025-05-01 10:15:30").unwrap();
        assert_eq!(ts.second(), 30);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
