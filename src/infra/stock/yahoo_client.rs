use crate::core::stock::{StockError, StockProvider, StockQuote};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
// Yahoo answers 429 to requests without a browser-like user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) dakap_bot";

/// Quotes from Yahoo! Finance's public chart endpoint.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new() -> Result<Self, StockError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StockError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: CHART_URL.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

fn quote_from_meta(meta: ChartMeta) -> Result<StockQuote, StockError> {
    let missing = |field| StockError::Malformed {
        symbol: meta.symbol.clone(),
        field,
    };

    let last_price = meta
        .regular_market_price
        .ok_or_else(|| missing("regularMarketPrice"))?;
    let previous_close = meta
        .previous_close
        .or(meta.chart_previous_close)
        .ok_or_else(|| missing("previousClose"))?;
    let currency = meta.currency.clone().ok_or_else(|| missing("currency"))?;
    let name = meta
        .long_name
        .clone()
        .or_else(|| meta.short_name.clone())
        .unwrap_or_else(|| meta.symbol.clone());

    Ok(StockQuote {
        name,
        symbol: meta.symbol.clone(),
        currency,
        previous_close,
        last_price,
    })
}

#[async_trait]
impl StockProvider for YahooFinanceClient {
    async fn quote(&self, symbol: &str) -> Result<StockQuote, StockError> {
        let url = format!("{}/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| StockError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StockError::NotFound(symbol.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StockError::Request(format!(
                "Yahoo Finance API error: {} - {}",
                status, text
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| StockError::Request(e.to_string()))?;

        let meta = body
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|result| result.meta)
            .ok_or_else(|| StockError::NotFound(symbol.to_string()))?;

        quote_from_meta(meta)
    }
}
