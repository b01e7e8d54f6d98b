use std::time::{SystemTime, UNIX_EPOCH};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

pub fn uuid_v7_without_dashes() -> String {
    Uuid::now_v7().simple().to_string()
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Epoch milliseconds to an RFC 3339 string with the `Z` designator.
pub fn format_ms_rfc3339(epoch_ms: i64) -> String {
    let fallback = OffsetDateTime::from_unix_timestamp(0).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    let value =
        OffsetDateTime::from_unix_timestamp_nanos(epoch_ms as i128 * 1_000_000).unwrap_or(fallback);
    value
        .format(&Rfc3339)
        .unwrap_or("1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ms_rfc3339_carries_utc_designator() {
        assert_eq!(format_ms_rfc3339(0), "1970-01-01T00:00:00Z");
        assert!(format_ms_rfc3339(1_700_000_000_000).ends_with('Z'));
    }

    #[test]
    fn uuid_v7_ids_are_lexicographically_sortable() {
        let first = uuid_v7_without_dashes();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = uuid_v7_without_dashes();
        assert!(first < second);
    }
}
