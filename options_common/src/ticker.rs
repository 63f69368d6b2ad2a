//! Ticker symbols and the normalization rules applied to operator input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TICKER;
use crate::error::TrackerError;

/// Longest symbol accepted from the operator.
pub const MAX_TICKER_LEN: usize = 16;

/// Upper-cased ticker symbol such as `SPY`, `BRK-B` or `^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_symbol_char(c: char) -> bool {
        c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '^' | '=')
    }
}

impl FromStr for Ticker {
    type Err = TrackerError;

    /// Trims surrounding whitespace and upper-cases the input.
    ///
    /// Empty input, symbols longer than [`MAX_TICKER_LEN`] and symbols containing
    /// characters outside `A-Z 0-9 . - ^ =` are rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty()
            || normalized.len() > MAX_TICKER_LEN
            || !normalized.chars().all(Self::is_symbol_char)
        {
            return Err(TrackerError::InvalidTicker(raw.to_string()));
        }
        Ok(Ticker(normalized))
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for Ticker {
    /// The ticker tracked at startup, [`DEFAULT_TICKER`].
    fn default() -> Self {
        Ticker(DEFAULT_TICKER.to_string())
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let ticker: Ticker = "  aapl \n".parse().unwrap();
        assert_eq!(ticker.as_str(), "AAPL");
        assert_eq!(ticker.to_string(), "AAPL");
    }

    #[test]
    fn parse_accepts_index_and_class_symbols() {
        assert_eq!("^gspc".parse::<Ticker>().unwrap().as_str(), "^GSPC");
        assert_eq!("brk-b".parse::<Ticker>().unwrap().as_str(), "BRK-B");
        assert_eq!("eurusd=x".parse::<Ticker>().unwrap().as_str(), "EURUSD=X");
    }

    #[test]
    fn default_is_a_valid_symbol() {
        let default = Ticker::default();
        assert_eq!(default.as_str().parse::<Ticker>().unwrap(), default);
    }

    #[test]
    fn parse_rejects_empty_and_garbage() {
        assert!(matches!("   ".parse::<Ticker>(), Err(TrackerError::InvalidTicker(_))));
        assert!("AA PL".parse::<Ticker>().is_err());
        assert!("spy;rm".parse::<Ticker>().is_err());
        assert!("ABCDEFGHIJKLMNOPQ".parse::<Ticker>().is_err());
    }
}
