use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("invalid time format, expected HH:MM:SS")]
    Format,
    #[error("'{0}' is not a number")]
    Number(String),
    #[error("time must be positive")]
    NotPositive,
    #[error("time is too large")]
    TooLarge,
}

/// Parse `HH:MM:SS` into seconds. Fields are not range-checked, so
/// `0:90:00` is ninety minutes.
pub fn parse_hms(input: &str) -> Result<u64, ClockError> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return Err(ClockError::Format);
    };
    let field = |raw: &str| -> Result<u64, ClockError> {
        raw.trim()
            .parse::<u64>()
            .map_err(|_| ClockError::Number(raw.to_string()))
    };
    let (h, m, s) = (field(h)?, field(m)?, field(s)?);
    let total = h
        .checked_mul(3600)
        .zip(m.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|t| t.checked_add(s))
        .ok_or(ClockError::TooLarge)?;
    if total == 0 {
        return Err(ClockError::NotPositive);
    }
    Ok(total)
}

pub fn format_hms(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_values() {
        assert_eq!(parse_hms("00:00:05"), Ok(5));
        assert_eq!(parse_hms("01:02:03"), Ok(3723));
        assert_eq!(parse_hms(" 0:90:00\n"), Ok(5400));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(parse_hms("10:00"), Err(ClockError::Format));
        assert_eq!(parse_hms(""), Err(ClockError::Format));
        assert_eq!(parse_hms("1:2:3:4"), Err(ClockError::Format));
        assert_eq!(parse_hms("aa:00:01"), Err(ClockError::Number("aa".into())));
        assert_eq!(parse_hms("-1:00:00"), Err(ClockError::Number("-1".into())));
    }

    #[test]
    fn zero_is_not_a_duration() {
        assert_eq!(parse_hms("00:00:00"), Err(ClockError::NotPositive));
    }

    #[test]
    fn huge_values_are_rejected_not_wrapped() {
        assert_eq!(parse_hms("5124095576030432:00:00"), Err(ClockError::TooLarge));
        assert_eq!(parse_hms("0:0:18446744073709551615"), Ok(u64::MAX));
        assert_eq!(parse_hms("0:1:18446744073709551615"), Err(ClockError::TooLarge));
        assert_eq!(parse_hms("99999999999999999999:0:0"), Err(ClockError::Number("99999999999999999999".into())));
    }

    #[test]
    fn formats_with_padding() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3723), "01:02:03");
        assert_eq!(format_hms(100 * 3600 + 59), "100:00:59");
    }
}
