// Utility helpers for parsing and formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Date formats observed across dataset revisions. Tried in order; the
/// first successful parse wins.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a string-like value into a non-negative case count while being
/// forgiving about formatting issues common in CSV exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts decimal text (`"3.0"`) by truncating toward zero.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_count_safe(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    if let Ok(n) = s.parse::<i64>() {
        // Negative counts are data entry noise; clamp rather than reject.
        return Some(n.max(0) as u64);
    }
    s.parse::<f64>().ok().map(|f| {
        if f.is_finite() && f > 0.0 {
            f.trunc() as u64
        } else {
            0
        }
    })
}

pub fn parse_date_safe(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Extract a calendar year from a raw date-like string.
///
/// Prefers a full date parse; otherwise reads the trailing 4 characters as a
/// year (covers formats like `15/03/2019` or a bare `2019`). Anything else
/// yields 0, the "unknown year" sentinel.
pub fn year_of(s: &str) -> i32 {
    if let Some(d) = parse_date_safe(s) {
        return d.year();
    }
    year_from_tail(s).unwrap_or(0)
}

fn year_from_tail(s: &str) -> Option<i32> {
    let chars: Vec<char> = s.trim().chars().collect();
    if chars.len() < 4 {
        return None;
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    match tail.parse::<i32>() {
        Ok(y) if (1900..=2100).contains(&y) => Some(y),
        _ => None,
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

pub fn format_pct(p: f64) -> String {
    format!("{:+.1}%", p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_parses_plain_integers() {
        assert_eq!(parse_count_safe("3"), Some(3));
        assert_eq!(parse_count_safe(" 1,200 "), Some(1200));
    }

    #[test]
    fn count_rejects_text() {
        assert_eq!(parse_count_safe("N/A"), None);
        assert_eq!(parse_count_safe(""), None);
    }

    #[test]
    fn count_clamps_negatives() {
        assert_eq!(parse_count_safe("-4"), Some(0));
    }

    #[test]
    fn date_accepts_day_first_format() {
        let d = parse_date_safe("15/03/2019").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2019, 3, 15));
    }

    #[test]
    fn year_falls_back_to_trailing_digits() {
        assert_eq!(year_of("hecho en 2017"), 2017);
        assert_eq!(year_of("15/03/2019"), 2019);
        assert_eq!(year_of("N/A"), 0);
        assert_eq!(year_of("9999"), 0);
    }
}
