//! Display formatting for currency values, timestamps and the summary block.
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::config::{CURRENCY_PREFIX, TIMESTAMP_FORMAT};
use crate::model::{OptionChainSummary, PriceField, NOT_AVAILABLE};

/// `$` followed by two decimals, e.g. `$101.50` or `$-1.50`.
pub fn currency(value: f64) -> String {
    format!("{CURRENCY_PREFIX}{value:.2}")
}

/// Currency for a `PriceField`; `N/A` when unavailable.
pub fn currency_field(field: PriceField) -> String {
    field
        .value()
        .map_or_else(|| NOT_AVAILABLE.to_string(), currency)
}

/// `YYYY-MM-DD HH:MM:SS` in the timestamp's own offset.
pub fn timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Five-line summary text of an option chain.
pub fn summary_text(summary: &OptionChainSummary) -> String {
    format!(
        "Total Active Contracts: {}\nTotal Calls: {}\nTotal Puts: {}\nLargest Call: {}\nLargest Put: {}",
        summary.total_contracts,
        summary.total_calls,
        summary.total_puts,
        summary.largest_call_symbol,
        summary.largest_put_symbol
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionContractRow;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn currency_has_two_decimals_and_prefix() {
        assert_eq!(currency(100.0), "$100.00");
        assert_eq!(currency(101.504), "$101.50");
        assert_eq!(currency(1.5), "$1.50");
        assert_eq!(currency(-1.5), "$-1.50");
        assert_eq!(currency_field(PriceField::Unavailable), "N/A");
        assert_eq!(currency_field(PriceField::Value(3.0)), "$3.00");
    }

    #[test]
    fn timestamp_layout() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap();
        assert_eq!(timestamp(&at), "2024-03-05 09:07:01");
        let ny = at.with_timezone(&FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(timestamp(&ny), "2024-03-05 04:07:01");
    }

    #[test]
    fn summary_block_lines() {
        let calls = vec![OptionContractRow::new("C", 1.0, Some(5), Some(1), 10.0)];
        let text = summary_text(&OptionChainSummary::from_rows(&calls, &[]));
        assert_eq!(
            text,
            "Total Active Contracts: 1\nTotal Calls: 1\nTotal Puts: 0\nLargest Call: C\nLargest Put: N/A"
        );
    }
}
