use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market state handed to every agent for one cycle.
///
/// Prices are probabilities in [0, 1]. The aggregator never reads this; it is
/// the agents' input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub yes_ask: Option<Decimal>,
    pub no_ask: Option<Decimal>,
    #[serde(default)]
    pub yes_bid: Option<Decimal>,
    #[serde(default)]
    pub no_bid: Option<Decimal>,
    pub volume_24h: Option<u64>,
    pub open_interest: Option<u64>,
    /// Resting liquidity in dollars.
    pub liquidity_dollars: Option<Decimal>,
    pub quote_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules_text: String,
}

/// An exchange quote with prices in integer cents (0-100).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketQuote {
    pub ticker: String,
    pub yes_ask: Option<i64>,
    pub yes_bid: Option<i64>,
    pub no_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub volume_24h: Option<u64>,
    pub open_interest: Option<u64>,
    pub liquidity_dollars: Option<Decimal>,
    pub updated_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules_primary: Option<String>,
    #[serde(default)]
    pub rules_secondary: Option<String>,
}

fn cents_to_probability(cents: Option<i64>) -> Option<Decimal> {
    cents.map(|c| Decimal::new(c, 2))
}

impl MarketSnapshot {
    /// Normalize an exchange quote: cents become probabilities and the two
    /// rules sections are joined into one text.
    pub fn from_cents(quote: MarketQuote) -> Self {
        let rules_text = [quote.rules_primary, quote.rules_secondary]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            ticker: quote.ticker,
            yes_ask: cents_to_probability(quote.yes_ask),
            no_ask: cents_to_probability(quote.no_ask),
            yes_bid: cents_to_probability(quote.yes_bid),
            no_bid: cents_to_probability(quote.no_bid),
            volume_24h: quote.volume_24h,
            open_interest: quote.open_interest,
            liquidity_dollars: quote.liquidity_dollars,
            quote_timestamp: quote.updated_time,
            rules_text,
        }
    }

    pub fn yes_spread(&self) -> Option<Decimal> {
        Some(self.yes_ask? - self.yes_bid?)
    }

    pub fn no_spread(&self) -> Option<Decimal> {
        Some(self.no_ask? - self.no_bid?)
    }

    /// How old the quote is relative to `now`. The clock is the caller's.
    pub fn quote_age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.quote_timestamp.map(|ts| now - ts)
    }
}
