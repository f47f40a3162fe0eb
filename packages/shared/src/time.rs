//! Time helpers.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

fn jst() -> FixedOffset {
    // 9h is always within the valid offset range
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Get current Unix timestamp in JST (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&jst());
    now_jst.timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) into an RFC 3339 string in JST.
pub fn timestamp_to_jst_rfc3339(timestamp_ms: i64) -> String {
    match jst().timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.to_rfc3339(),
        None => timestamp_ms.to_string(),
    }
}

/// Format a number of seconds as `MM:SS`.
///
/// Minutes are not wrapped, so one hour renders as `60:00`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        // テスト項目: 秒数が MM:SS 形式に整形される
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn test_timestamp_to_jst_rfc3339() {
        // テスト項目: Unix エポックが JST の RFC 3339 文字列になる
        // when (操作):
        let formatted = timestamp_to_jst_rfc3339(0);

        // then (期待する結果):
        assert_eq!(formatted, "1970-01-01T09:00:00+09:00");
    }
}
