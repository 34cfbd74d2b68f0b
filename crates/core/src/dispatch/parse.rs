//! Lightweight parsing of short follow-up replies

use daybook_domain::constants::DEFAULT_ACTIVITY_MINUTES;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches "90", "2hr", "45 min", "1 hour" anywhere in a reply.
static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(hr|hour|h|min|minute|m)?")
        .expect("DURATION_REGEX should compile - this is a bug")
});

/// True for a bare "yes" or "y" in any casing.
pub fn is_affirmative(message: &str) -> bool {
    matches!(message.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Extract a duration in minutes from a free-form reply.
///
/// The first number wins; a unit beginning with `h` means hours, anything
/// else (or no unit) means minutes. Replies with no number at all fall back
/// to the default of thirty minutes.
pub fn parse_duration_reply(message: &str) -> i64 {
    let Some(captures) = DURATION_REGEX.captures(message) else {
        return DEFAULT_ACTIVITY_MINUTES;
    };
    let Ok(amount) = captures[1].parse::<i64>() else {
        return DEFAULT_ACTIVITY_MINUTES;
    };
    let is_hours = captures
        .get(2)
        .is_some_and(|unit| unit.as_str().to_lowercase().starts_with('h'));
    if is_hours {
        amount * 60
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_number_is_minutes() {
        assert_eq!(parse_duration_reply("90"), 90);
    }

    #[test]
    fn test_hour_units_scale_to_minutes() {
        assert_eq!(parse_duration_reply("2hr"), 120);
        assert_eq!(parse_duration_reply("1 hour"), 60);
        assert_eq!(parse_duration_reply("3H"), 180);
    }

    #[test]
    fn test_minute_units_pass_through() {
        assert_eq!(parse_duration_reply("45 min"), 45);
        assert_eq!(parse_duration_reply("20m"), 20);
        assert_eq!(parse_duration_reply("15 minutes"), 15);
    }

    #[test]
    fn test_number_embedded_in_a_sentence() {
        assert_eq!(parse_duration_reply("took about 25 min I think"), 25);
    }

    #[test]
    fn test_no_number_falls_back_to_default() {
        assert_eq!(parse_duration_reply("a while"), DEFAULT_ACTIVITY_MINUTES);
    }

    #[test]
    fn test_affirmations() {
        assert!(is_affirmative("yes"));
        assert!(is_affirmative("  YES "));
        assert!(is_affirmative("y"));
        assert!(!is_affirmative("yeah"));
        assert!(!is_affirmative("no"));
    }
}
