//! Row types as stored. Kept apart from the `verse-types` wire models so the
//! storage layer doesn't depend on the HTTP shape.

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub created_at: String,
}

/// Fixed-width RFC 3339 in UTC, so lexical order equals time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);

        let a = format_timestamp(earlier);
        let b = format_timestamp(later);
        assert_eq!(a, "2024-01-02T03:04:05.000000Z");
        assert!(a < b);
    }
}
