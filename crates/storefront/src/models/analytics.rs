//! Admin analytics report.

use chrono::NaiveDate;
use serde::Serialize;

use super::ProductClickCount;

/// Order items sold on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailySales {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub sales: i64,
}

/// Payload of `GET /admin/analytics/data`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    /// Clicks in the last 24 hours.
    pub daily_visits: i64,
    /// Clicks in the last 7 days.
    pub weekly_visits: i64,
    /// Clicks in the last 30 days.
    pub monthly_visits: i64,
    pub most_viewed_products: Vec<ProductClickCount>,
    /// Oldest day first, one entry per day.
    pub sales_trend: Vec<DailySales>,
    pub wishlist_count: i64,
    pub cart_count: i64,
}
