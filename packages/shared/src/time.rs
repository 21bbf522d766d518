//! Time-related utilities.

use chrono::{Local, TimeZone, Utc};

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to a short local wall-clock time (`HH:MM:SS`)
pub fn timestamp_to_local_clock(timestamp_millis: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_millis).single() {
        Some(dt) => dt.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_after_2024() {
        // テスト項目: 現在時刻が妥当な範囲のミリ秒で返される
        // given (前提条件):
        let jan_1_2024 = 1_704_067_200_000;

        // when (操作):
        let now = now_millis();

        // then (期待する結果):
        assert!(now > jan_1_2024);
    }

    #[test]
    fn test_timestamp_to_local_clock_shape() {
        // テスト項目: ローカル時刻が HH:MM:SS 形式で返される
        // given (前提条件):
        let timestamp = 1_704_067_200_000;

        // when (操作):
        let formatted = timestamp_to_local_clock(timestamp);

        // then (期待する結果):
        assert_eq!(formatted.len(), 8);
        assert_eq!(formatted.matches(':').count(), 2);
    }
}
