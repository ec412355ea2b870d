//! Sequential display ids
//!
//! `#B-DDMMYYYY-N` for bills, `#O-DDMMYYYY-N` for kitchen orders, where N is
//! one plus the number of records of that kind created on the same business
//! day. Count-then-assign is not atomic: two terminals saving at once may
//! mint the same id. Display ids are never used as keys.

use crate::store::{BillRepository, StoreResult, collections};
use crate::utils::time;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Bill,
    Order,
}

impl IdKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Bill => "#B",
            Self::Order => "#O",
        }
    }

    fn collection(&self) -> &'static str {
        match self {
            Self::Bill => collections::BILLS,
            Self::Order => collections::ORDERS,
        }
    }
}

/// `#B-05032025-7`
pub fn format_display_id(kind: IdKind, date: NaiveDate, seq: usize) -> String {
    format!("{}-{}-{}", kind.prefix(), date.format("%d%m%Y"), seq)
}

/// Bill display id → order display id of the same sequence (`#B-` → `#O-`)
pub fn order_no_for_bill(bill_id: &str) -> String {
    match bill_id.strip_prefix("#B-") {
        Some(rest) => format!("#O-{}", rest),
        None => bill_id.to_string(),
    }
}

#[derive(Clone)]
pub struct IdGenerator {
    repo: BillRepository,
    tz: Tz,
}

impl IdGenerator {
    pub fn new(repo: BillRepository, tz: Tz) -> Self {
        Self { repo, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub async fn next_id(&self, kind: IdKind, now: DateTime<Utc>) -> StoreResult<String> {
        let mut ids = self.next_ids(kind, now, 1).await?;
        Ok(ids.pop().unwrap_or_default())
    }

    /// `n` consecutive ids from a single count
    pub async fn next_ids(
        &self,
        kind: IdKind,
        now: DateTime<Utc>,
        n: usize,
    ) -> StoreResult<Vec<String>> {
        let date = time::business_date(now, self.tz);
        let start = time::day_start_millis(date, self.tz);
        let end = time::day_end_millis(date, self.tz);

        let count = self
            .repo
            .count_created_between(kind.collection(), start, end)
            .await?;

        Ok((1..=n)
            .map(|i| format_display_id(kind, date, count + i))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(format_display_id(IdKind::Bill, date, 1), "#B-05032025-1");
        assert_eq!(format_display_id(IdKind::Order, date, 12), "#O-05032025-12");
        assert_eq!(order_no_for_bill("#B-05032025-3"), "#O-05032025-3");
        assert_eq!(order_no_for_bill("legacy"), "legacy");
    }

    #[tokio::test]
    async fn test_counts_only_same_business_day() {
        let store = Arc::new(MemoryStore::new());
        let tz = chrono_tz::Asia::Kolkata;
        let ids = IdGenerator::new(BillRepository::new(store.clone()), tz);

        // 2025-03-05 00:30 IST == 2025-03-04 19:00 UTC
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 19, 0, 0).unwrap();
        assert_eq!(ids.next_id(IdKind::Bill, now).await.unwrap(), "#B-05032025-1");

        let today = now.timestamp_millis();
        let yesterday = Utc
            .with_ymd_and_hms(2025, 3, 4, 18, 0, 0)
            .unwrap()
            .timestamp_millis();
        store
            .create(collections::BILLS, json!({"created_at": today}))
            .await
            .unwrap();
        store
            .create(collections::BILLS, json!({"created_at": yesterday}))
            .await
            .unwrap();
        // Orders do not count towards bills
        store
            .create(collections::ORDERS, json!({"created_at": today}))
            .await
            .unwrap();

        assert_eq!(ids.next_id(IdKind::Bill, now).await.unwrap(), "#B-05032025-2");
        assert_eq!(
            ids.next_ids(IdKind::Order, now, 3).await.unwrap(),
            vec!["#O-05032025-2", "#O-05032025-3", "#O-05032025-4"]
        );
    }
}
