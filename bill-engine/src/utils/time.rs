//! 时间工具函数: 业务时区转换
//!
//! 单号按业务时区的自然日编号；存储层只接收 `i64` Unix millis。

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// 日期 + 时分秒 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let Some(naive) = date.and_hms_opt(hour, min, sec) else {
        return date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
    };
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}

/// 某一时刻所在的业务日期
pub fn business_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// 小票日期: "05 Mar 2025"
pub fn receipt_date(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%d %b %Y").to_string()
}

/// 小票时间: "07:45 pm"
pub fn receipt_time(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz)
        .format("%I:%M %p")
        .to_string()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bounds_in_business_timezone() {
        let tz = chrono_tz::Asia::Kolkata;
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();

        let start = day_start_millis(date, tz);
        let end = day_end_millis(date, tz);
        assert_eq!(end - start, 24 * 60 * 60 * 1000);

        // 2025-03-04 18:30 UTC is midnight in Kolkata
        let expected = Utc.with_ymd_and_hms(2025, 3, 4, 18, 30, 0).unwrap();
        assert_eq!(start, expected.timestamp_millis());
    }

    #[test]
    fn test_business_date_crosses_utc_midnight() {
        let tz = chrono_tz::Asia::Kolkata;
        // 20:00 UTC is already the next day in Kolkata
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 20, 0, 0).unwrap();
        assert_eq!(
            business_date(now, tz),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_receipt_formats() {
        let tz = chrono_tz::Asia::Kolkata;
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 14, 15, 0).unwrap();
        assert_eq!(receipt_date(now, tz), "05 Mar 2025");
        assert_eq!(receipt_time(now, tz), "07:45 pm");
    }
}
