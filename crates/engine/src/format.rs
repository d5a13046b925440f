//! Human-readable durations for the snapshot.

use chrono::Duration;

/// `"3d 4h 12m"`, `"4h 12m"` or `"12m"`. Negative durations read as zero.
pub fn field_age(age: Duration) -> String {
    let minutes_total = age.num_minutes().max(0);
    let days = minutes_total / (24 * 60);
    let hours = (minutes_total / 60) % 24;
    let minutes = minutes_total % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `"42s ago"`, `"5m ago"` or `"3h ago"`; `"never"` without a timestamp.
pub fn last_seen(since: Option<Duration>) -> String {
    let Some(since) = since else {
        return "never".into();
    };

    let secs = since.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3_600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_age_units() {
        assert_eq!(field_age(Duration::seconds(30)), "0m");
        assert_eq!(field_age(Duration::minutes(12)), "12m");
        assert_eq!(field_age(Duration::minutes(4 * 60 + 12)), "4h 12m");
        assert_eq!(
            field_age(Duration::days(3) + Duration::hours(4) + Duration::minutes(12)),
            "3d 4h 12m"
        );
        assert_eq!(field_age(Duration::days(1)), "1d 0h 0m");
    }

    #[test]
    fn field_age_never_negative() {
        assert_eq!(field_age(Duration::minutes(-30)), "0m");
    }

    #[test]
    fn last_seen_units() {
        assert_eq!(last_seen(None), "never");
        assert_eq!(last_seen(Some(Duration::seconds(42))), "42s ago");
        assert_eq!(last_seen(Some(Duration::seconds(59))), "59s ago");
        assert_eq!(last_seen(Some(Duration::minutes(5))), "5m ago");
        assert_eq!(last_seen(Some(Duration::minutes(59))), "59m ago");
        assert_eq!(last_seen(Some(Duration::hours(3) + Duration::minutes(20))), "3h ago");
        assert_eq!(last_seen(Some(Duration::seconds(-5))), "0s ago");
    }
}
