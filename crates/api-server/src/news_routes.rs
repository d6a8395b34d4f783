use alphavantage_client::{NewsSentiment, NewsSentimentParams};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{AppError, AppState, Envelope};

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub tickers: Option<String>,
    pub topics: Option<String>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    /// Feed items to skip, applied to the upstream result.
    pub offset: Option<String>,
}

impl NewsQuery {
    fn params(&self) -> NewsSentimentParams {
        NewsSentimentParams {
            tickers: self.tickers.clone().unwrap_or_default(),
            topics: self.topics.clone().unwrap_or_default(),
            time_from: self.time_from.clone().unwrap_or_default(),
            time_to: self.time_to.clone().unwrap_or_default(),
            sort: self.sort.clone().unwrap_or_default(),
            limit: parse_count(self.limit.as_deref()),
        }
    }

    fn offset(&self) -> usize {
        parse_count(self.offset.as_deref()).unwrap_or(0) as usize
    }
}

/// Unparseable counts are ignored rather than rejected.
fn parse_count(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

pub fn news_routes() -> Router<AppState> {
    Router::new().route("/news/sentiment", get(get_news_sentiment))
}

async fn get_news_sentiment(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Envelope<NewsSentiment>>, AppError> {
    let params = query.params();
    let mut news = state.client.get_news_sentiment(&params).await.map_err(|e| {
        tracing::warn!(
            tickers = %params.tickers,
            topics = %params.topics,
            "News sentiment request failed: {}",
            e
        );
        AppError::from(e)
    })?;

    let offset = query.offset();
    if offset > 0 {
        news.feed = news.feed.into_iter().skip(offset).collect();
    }

    Ok(Json(state.envelope(news)))
}
