//! Admin analytics aggregation.

use std::collections::HashMap;

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::db::{CartRepository, ClickRepository, OrderRepository, RepositoryError, WishlistRepository};
use crate::models::{AnalyticsReport, DailySales};

/// Products listed under "most viewed".
pub const MOST_VIEWED_LIMIT: i64 = 5;

/// Calendar days in the sales trend, today included.
pub const SALES_TREND_DAYS: u64 = 7;

/// Builds the admin analytics report.
pub struct AnalyticsService<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsService<'a> {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Aggregate clicks, sales, and saved items as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any aggregate query fails.
    #[instrument(skip(self))]
    pub async fn report(&self, now: DateTime<Utc>) -> Result<AnalyticsReport, RepositoryError> {
        let clicks = ClickRepository::new(self.pool);
        let orders = OrderRepository::new(self.pool);

        let daily_visits = clicks.count_since(now - Duration::hours(24)).await?;
        let weekly_visits = clicks.count_since(now - Duration::days(7)).await?;
        let monthly_visits = clicks.count_since(now - Duration::days(30)).await?;
        let most_viewed_products = clicks.top_overall(MOST_VIEWED_LIMIT).await?;

        let today = now.date_naive();
        let first_day = trend_start(today);
        let daily_counts = orders.daily_item_counts(first_day).await?;
        let sales_trend = fill_sales_trend(today, &daily_counts);

        let wishlist_count = WishlistRepository::new(self.pool).count_all().await?;
        let cart_count = CartRepository::new(self.pool).count_all().await?;

        Ok(AnalyticsReport {
            daily_visits,
            weekly_visits,
            monthly_visits,
            most_viewed_products,
            sales_trend,
            wishlist_count,
            cart_count,
        })
    }
}

/// First day of the trend window ending on `today`.
fn trend_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_days(Days::new(SALES_TREND_DAYS - 1))
        .unwrap_or(NaiveDate::MIN)
}

/// One entry per day of the window ending on `today`, oldest first.
///
/// Days missing from `counts` report zero sales; counts outside the window
/// are ignored.
#[must_use]
pub fn fill_sales_trend(today: NaiveDate, counts: &[(NaiveDate, i64)]) -> Vec<DailySales> {
    let by_day: HashMap<NaiveDate, i64> = counts.iter().copied().collect();

    trend_start(today)
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| DailySales {
            date,
            sales: by_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_sales_trend_is_zero_filled_oldest_first() {
        let trend = fill_sales_trend(
            day("2026-03-10"),
            &[(day("2026-03-05"), 4), (day("2026-03-10"), 2)],
        );

        let dates: Vec<String> = trend.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(
            dates,
            [
                "2026-03-04",
                "2026-03-05",
                "2026-03-06",
                "2026-03-07",
                "2026-03-08",
                "2026-03-09",
                "2026-03-10"
            ]
        );

        let sales: Vec<i64> = trend.iter().map(|d| d.sales).collect();
        assert_eq!(sales, [0, 4, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_sales_trend_ignores_days_outside_window() {
        let trend = fill_sales_trend(day("2026-03-10"), &[(day("2026-02-01"), 99)]);
        assert_eq!(trend.len(), 7);
        assert!(trend.iter().all(|d| d.sales == 0));
    }

    #[test]
    fn test_sales_trend_crosses_month_boundary() {
        let trend = fill_sales_trend(day("2026-03-02"), &[]);
        assert_eq!(trend.first().unwrap().date, day("2026-02-24"));
        assert_eq!(trend.last().unwrap().date, day("2026-03-02"));
    }

    #[test]
    fn test_daily_sales_serializes_iso_date() {
        let json = serde_json::to_value(DailySales {
            date: day("2026-03-10"),
            sales: 3,
        })
        .unwrap();
        assert_eq!(json["date"], "2026-03-10");
        assert_eq!(json["sales"], 3);
    }
}
