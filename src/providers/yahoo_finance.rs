use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{ChartRange, Commodity, DataSource, FetchError, PricePoint, Quote};

const USER_AGENT: &str = "commodity-tracker/0.1";

#[derive(Deserialize, Debug)]
struct YahooQuoteResponse {
    #[serde(alias = "quoteResponse")]
    quote_response: QuoteResult,
}

#[derive(Deserialize, Debug)]
struct QuoteResult {
    #[serde(default)]
    result: Vec<QuoteItem>,
}

#[derive(Deserialize, Debug)]
struct QuoteItem {
    symbol: String,
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "regularMarketChange")]
    regular_market_change: Option<f64>,
    #[serde(alias = "regularMarketChangePercent")]
    regular_market_change_percent: Option<f64>,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<ChartQuote>,
}

#[derive(Deserialize, Debug)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

/// Picks the catalog commodities out of a quote response, in catalog order.
fn quotes_from_response(response: YahooQuoteResponse) -> Result<Vec<Quote>, FetchError> {
    let by_symbol: HashMap<String, QuoteItem> = response
        .quote_response
        .result
        .into_iter()
        .map(|item| (item.symbol.clone(), item))
        .collect();

    let quotes: Vec<Quote> = Commodity::ALL
        .into_iter()
        .filter_map(|commodity| {
            let item = by_symbol.get(commodity.symbol())?;
            Some(Quote {
                commodity,
                price: item.regular_market_price?,
                change: item.regular_market_change.unwrap_or(0.0),
                change_percent: item.regular_market_change_percent.unwrap_or(0.0),
                observed_at: item
                    .regular_market_time
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            })
        })
        .collect();

    if quotes.is_empty() {
        return Err(FetchError::EmptyPayload);
    }
    Ok(quotes)
}

/// Zips timestamps with closes, dropping entries without a price.
fn history_from_response(response: YahooChartResponse) -> Result<Vec<PricePoint>, FetchError> {
    let Some(item) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(FetchError::EmptyHistory);
    };

    let timestamps = item.timestamp.unwrap_or_default();
    let closes = item
        .indicators
        .and_then(|inds| inds.quote.into_iter().next())
        .and_then(|q| q.close)
        .unwrap_or_default();

    let mut points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            Some(PricePoint {
                timestamp: DateTime::from_timestamp(*ts, 0)?,
                price: (*close)?,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);

    if points.is_empty() {
        return Err(FetchError::EmptyHistory);
    }
    Ok(points)
}

pub struct YahooFinanceSource {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(YahooFinanceSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .map_err(|_| FetchError::InvalidResponse)?;
        debug!("Requesting {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            debug!(error = %e, "Request failed for {}", url);
            FetchError::from(e)
        })?;

        if !response.status().is_success() {
            debug!("HTTP error {} for {}", response.status(), url);
            return Err(FetchError::ServerError);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, "Failed to parse response from {}", url);
            FetchError::InvalidResponse
        })
    }
}

#[async_trait]
impl DataSource for YahooFinanceSource {
    #[instrument(name = "YahooQuoteFetch", skip(self))]
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, FetchError> {
        let symbols = Commodity::ALL.map(|c| c.symbol()).join(",");
        let response: YahooQuoteResponse = self
            .get_json("/v7/finance/quote", &[("symbols", symbols.as_str())])
            .await?;
        let quotes = quotes_from_response(response)?;
        debug!(count = quotes.len(), "Decoded quotes");
        Ok(quotes)
    }

    #[instrument(name = "YahooHistoryFetch", skip(self))]
    async fn fetch_history(
        &self,
        commodity: Commodity,
        range: ChartRange,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let path = format!("/v8/finance/chart/{}", commodity.symbol());
        let response: YahooChartResponse = self
            .get_json(
                &path,
                &[
                    ("range", range.query_range()),
                    ("interval", range.query_interval()),
                ],
            )
            .await?;
        let points = history_from_response(response)?;
        debug!(count = points.len(), "Decoded history");
        Ok(points)
    }
}
