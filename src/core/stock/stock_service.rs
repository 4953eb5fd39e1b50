// Stock quotes for the `stock` command.
//
// The service resolves nicknames, asks the provider for a quote and turns it
// into a display-ready summary. It has no idea where quotes come from.

use async_trait::async_trait;
use thiserror::Error;

/// Discord allows at most this many embeds per message.
pub const MAX_SYMBOLS_PER_REQUEST: usize = 10;

pub const COLOR_UP: u32 = 0xFF0000;
pub const COLOR_DOWN: u32 = 0x137333;
pub const COLOR_FLAT: u32 = 0x777777;

const ALIASES: &[(&str, &str)] = &[
    ("COVER", "5253.T"),
    ("ANYCOLOR", "5032.T"),
    ("TRENDMICRO", "4704.T"),
];

#[derive(Debug, Error)]
pub enum StockError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("No quote for {0}")]
    NotFound(String),

    #[error("Malformed quote for {symbol}: missing {field}")]
    Malformed { symbol: String, field: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    pub name: String,
    pub symbol: String,
    pub currency: String,
    pub previous_close: f64,
    pub last_price: f64,
}

/// A quote ready to be shown as an embed.
#[derive(Debug, Clone, PartialEq)]
pub struct StockSummary {
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
}

#[async_trait]
pub trait StockProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<StockQuote, StockError>;
}

pub struct StockService<P: StockProvider> {
    provider: P,
}

impl<P: StockProvider> StockService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Summaries for up to [`MAX_SYMBOLS_PER_REQUEST`] symbols. Symbols that
    /// fail are logged and left out.
    pub async fn summaries(&self, symbols: &[String]) -> Vec<StockSummary> {
        let mut summaries = Vec::new();

        for symbol in symbols.iter().take(MAX_SYMBOLS_PER_REQUEST) {
            match self.summary(symbol).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::warn!(symbol = %symbol, "Failed to get stock price: {}", e),
            }
        }

        summaries
    }

    pub async fn summary(&self, symbol: &str) -> Result<StockSummary, StockError> {
        let quote = self.provider.quote(&resolve_symbol(symbol)).await?;
        Ok(summarize(&quote))
    }
}

pub fn resolve_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, actual)| actual.to_string())
        .unwrap_or_else(|| symbol.to_string())
}

pub fn summarize(quote: &StockQuote) -> StockSummary {
    let delta = quote.last_price - quote.previous_close;
    let delta_percent = if quote.previous_close != 0.0 {
        delta / quote.previous_close * 100.0
    } else {
        0.0
    };

    let (color, prefix) = if delta > 0.0 {
        (COLOR_UP, "📈")
    } else if delta < 0.0 {
        (COLOR_DOWN, "📉")
    } else {
        (COLOR_FLAT, "")
    };

    StockSummary {
        title: format!("{} ({})", quote.name, quote.symbol),
        url: format!("https://finance.yahoo.com/quote/{}", quote.symbol),
        description: format!(
            "{} {} {} ({}) ({:+.2}%)",
            prefix,
            quote.currency,
            format_grouped(quote.last_price, false),
            format_grouped(delta, true),
            delta_percent
        ),
        color,
    }
}

/// Two decimals with thousands separators, e.g. `12,345.60` or `+1,000.00`.
pub fn format_grouped(value: f64, signed: bool) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && fixed != "0.00" {
        "-"
    } else if signed {
        "+"
    } else {
        ""
    };

    format!("{sign}{grouped}.{frac_part}")
}
