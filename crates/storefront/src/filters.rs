//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount as dollars with two decimals.
///
/// Usage in templates: `{{ item.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&value.to_string()))
}

/// Formats a timestamp down to the minute.
///
/// Usage in templates: `{{ order.created_at|short_datetime }}`
#[askama::filter_fn]
pub fn short_datetime(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(truncate_to_minute(&value.to_string()).to_string())
}

fn truncate_to_minute(text: &str) -> &str {
    text.get(..16).unwrap_or(text)
}

fn format_money(amount: &str) -> String {
    match amount.parse::<rust_decimal::Decimal>() {
        Ok(decimal) => format!("${:.2}", decimal.round_dp(2)),
        Err(_) => format!("${amount}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("9.9"), "$9.90");
        assert_eq!(format_money("12"), "$12.00");
        assert_eq!(format_money("0.00"), "$0.00");
        assert_eq!(format_money("n/a"), "$n/a");
    }

    #[test]
    fn test_short_datetime_truncates_to_minute() {
        let at: chrono::DateTime<chrono::Utc> = "2026-03-10T12:34:56Z".parse().unwrap_or_default();
        assert_eq!(truncate_to_minute(&at.to_string()), "2026-03-10 12:34");
        assert_eq!(truncate_to_minute("short"), "short");
    }
}
