use serde::{Deserialize, Serialize};

use crate::{AlphaVantageClient, QueryParams, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsSentimentParams {
    /// Comma-separated symbols, e.g. "AAPL,MSFT".
    pub tickers: String,
    pub topics: String,
    /// YYYYMMDDTHHMM
    pub time_from: String,
    /// YYYYMMDDTHHMM
    pub time_to: String,
    /// LATEST, EARLIEST or RELEVANCE
    pub sort: String,
    /// Upstream default is 50, max 1000.
    pub limit: Option<u32>,
}

impl NewsSentimentParams {
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::for_function("NEWS_SENTIMENT");
        params
            .insert("tickers", self.tickers.as_str())
            .insert("topics", self.topics.as_str())
            .insert("time_from", self.time_from.as_str())
            .insert("time_to", self.time_to.as_str())
            .insert("sort", self.sort.as_str());

        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params.insert("limit", limit.to_string());
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSentiment {
    /// Item count as reported by the upstream (a string).
    #[serde(rename = "items")]
    pub items_count: String,
    pub sentiment_score_definition: String,
    pub relevance_score_definition: String,
    pub feed: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedItem {
    pub title: String,
    pub url: String,
    pub time_published: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub banner_image: Option<String>,
    pub source: String,
    pub category_within_source: String,
    pub source_domain: String,
    pub topics: Vec<Topic>,
    pub overall_sentiment_score: f64,
    pub overall_sentiment_label: String,
    pub ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub topic: String,
    pub relevance_score: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerSentiment {
    pub ticker: String,
    pub relevance_score: String,
    pub ticker_sentiment_score: String,
    pub ticker_sentiment_label: String,
}

impl AlphaVantageClient {
    /// Get news articles with topic and per-ticker sentiment
    pub async fn get_news_sentiment(&self, params: &NewsSentimentParams) -> Result<NewsSentiment> {
        let news: NewsSentiment = self.get_typed(&params.to_query()).await?;
        tracing::debug!(tickers = %params.tickers, items = news.feed.len(), "Decoded news feed");
        Ok(news)
    }
}
