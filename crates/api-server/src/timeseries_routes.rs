use alphavantage_client::{
    TimeSeries, TimeSeriesParams, DEFAULT_DATA_TYPE, DEFAULT_OUTPUT_SIZE, TIME_SERIES_DAILY,
    TIME_SERIES_INTRADAY,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{AppError, AppState, Envelope};

#[derive(Debug, Default, Deserialize)]
pub struct TimeSeriesQuery {
    pub function: Option<String>,
    pub outputsize: Option<String>,
    pub datatype: Option<String>,
    pub interval: Option<String>,
    pub extended_hours: Option<String>,
    pub adjusted: Option<String>,
    pub month: Option<String>,
}

pub fn timeseries_routes() -> Router<AppState> {
    Router::new()
        .route("/timeseries/:symbol", get(get_time_series))
        .route("/timeseries/:symbol/:interval", get(get_intraday))
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Lenient boolean: 1/t/true and 0/f/false in any case, otherwise `default`.
pub(crate) fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "t" | "true") => true,
        Some("0" | "f" | "false") => false,
        _ => default,
    }
}

impl TimeSeriesQuery {
    fn into_params(
        self,
        symbol: String,
        function: Option<&str>,
        interval: Option<String>,
    ) -> TimeSeriesParams {
        let function = match function {
            Some(forced) => forced.to_string(),
            None => or_default(self.function, TIME_SERIES_DAILY),
        };

        TimeSeriesParams {
            function,
            symbol,
            interval: interval.or(self.interval).unwrap_or_default(),
            output_size: or_default(self.outputsize, DEFAULT_OUTPUT_SIZE),
            data_type: or_default(self.datatype, DEFAULT_DATA_TYPE),
            adjusted: parse_flag(self.adjusted.as_deref(), true),
            extended_hours: parse_flag(self.extended_hours.as_deref(), false),
            month: self.month.unwrap_or_default(),
        }
    }
}

async fn fetch_series(
    state: &AppState,
    params: &TimeSeriesParams,
) -> Result<TimeSeries, AppError> {
    state.client.get_time_series(params).await.map_err(|e| {
        tracing::warn!(
            symbol = %params.symbol,
            function = %params.function,
            "Time series request failed: {}",
            e
        );
        AppError::from(e)
    })
}

async fn get_time_series(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<Envelope<TimeSeries>>, AppError> {
    let params = query.into_params(symbol, None, None);
    let series = fetch_series(&state, &params).await?;

    let mut envelope = state.envelope(series).with_symbol(params.symbol.clone());
    if params.is_intraday() && !params.interval.is_empty() {
        envelope = envelope.with_interval(params.interval.clone());
    }
    Ok(Json(envelope))
}

async fn get_intraday(
    State(state): State<AppState>,
    Path((symbol, interval)): Path<(String, String)>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<Envelope<TimeSeries>>, AppError> {
    let params = query.into_params(symbol, Some(TIME_SERIES_INTRADAY), Some(interval));
    let series = fetch_series(&state, &params).await?;

    Ok(Json(
        state
            .envelope(series)
            .with_symbol(params.symbol.clone())
            .with_interval(params.interval.clone()),
    ))
}
