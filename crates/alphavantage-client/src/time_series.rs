use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{decode_string_record, AlphaVantageClient, QueryParams, Result};

pub const TIME_SERIES_INTRADAY: &str = "TIME_SERIES_INTRADAY";
pub const TIME_SERIES_DAILY: &str = "TIME_SERIES_DAILY";

pub const DEFAULT_OUTPUT_SIZE: &str = "compact";
pub const DEFAULT_DATA_TYPE: &str = "json";

/// Request for one `TIME_SERIES_*` function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesParams {
    /// TIME_SERIES_INTRADAY, TIME_SERIES_DAILY, TIME_SERIES_WEEKLY, TIME_SERIES_MONTHLY, ...
    pub function: String,
    pub symbol: String,
    /// 1min, 5min, 15min, 30min, 60min. Intraday only.
    pub interval: String,
    /// compact or full
    pub output_size: String,
    /// json or csv
    pub data_type: String,
    pub adjusted: bool,
    pub extended_hours: bool,
    /// YYYY-MM, intraday history only.
    pub month: String,
}

impl TimeSeriesParams {
    pub fn daily(symbol: impl Into<String>) -> Self {
        Self {
            function: TIME_SERIES_DAILY.to_string(),
            symbol: symbol.into(),
            interval: String::new(),
            output_size: DEFAULT_OUTPUT_SIZE.to_string(),
            data_type: DEFAULT_DATA_TYPE.to_string(),
            adjusted: true,
            extended_hours: false,
            month: String::new(),
        }
    }

    pub fn intraday(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            function: TIME_SERIES_INTRADAY.to_string(),
            interval: interval.into(),
            ..Self::daily(symbol)
        }
    }

    pub fn is_intraday(&self) -> bool {
        self.function == TIME_SERIES_INTRADAY
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::for_function(&self.function);
        params
            .insert("symbol", self.symbol.as_str())
            .insert("outputsize", self.output_size.as_str())
            .insert("datatype", self.data_type.as_str());

        if self.is_intraday() {
            params
                .insert("interval", self.interval.as_str())
                .insert("month", self.month.as_str())
                .insert("extended_hours", self.extended_hours.to_string());
            // adjusted=true is the upstream default and is left off the wire
            if !self.adjusted {
                params.insert("adjusted", "false");
            }
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesMetaData {
    #[serde(rename(serialize = "information", deserialize = "1. Information"))]
    pub information: String,
    #[serde(rename(serialize = "symbol", deserialize = "2. Symbol"))]
    pub symbol: String,
    #[serde(rename(serialize = "lastRefreshed", deserialize = "3. Last Refreshed"))]
    pub last_refreshed: String,
    #[serde(
        rename(serialize = "interval", deserialize = "4. Interval"),
        skip_serializing_if = "String::is_empty"
    )]
    pub interval: String,
    #[serde(
        rename(serialize = "outputSize", deserialize = "5. Output Size"),
        alias = "4. Output Size"
    )]
    pub output_size: String,
    #[serde(
        rename(serialize = "timeZone", deserialize = "6. Time Zone"),
        alias = "5. Time Zone",
        alias = "4. Time Zone"
    )]
    pub time_zone: String,
}

/// One bar. Adjusted series fill the three trailing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ohlcv {
    #[serde(rename(serialize = "open", deserialize = "1. open"))]
    pub open: String,
    #[serde(rename(serialize = "high", deserialize = "2. high"))]
    pub high: String,
    #[serde(rename(serialize = "low", deserialize = "3. low"))]
    pub low: String,
    #[serde(rename(serialize = "close", deserialize = "4. close"))]
    pub close: String,
    #[serde(
        rename(serialize = "volume", deserialize = "5. volume"),
        alias = "6. volume"
    )]
    pub volume: String,
    #[serde(
        rename(serialize = "adjustedClose", deserialize = "5. adjusted close"),
        skip_serializing_if = "String::is_empty"
    )]
    pub adjusted_close: String,
    #[serde(
        rename(serialize = "dividendAmount", deserialize = "7. dividend amount"),
        skip_serializing_if = "String::is_empty"
    )]
    pub dividend_amount: String,
    #[serde(
        rename(serialize = "splitCoefficient", deserialize = "8. split coefficient"),
        skip_serializing_if = "String::is_empty"
    )]
    pub split_coefficient: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries {
    pub meta_data: TimeSeriesMetaData,
    /// Upstream name of the series block, e.g. "Time Series (5min)".
    pub series_name: String,
    /// Bars keyed by upstream timestamp.
    pub time_series: BTreeMap<String, Ohlcv>,
}

impl TimeSeries {
    /// Pick the metadata block and whichever series block the function
    /// produced ("Time Series (Daily)", "Weekly Adjusted Time Series", ...).
    pub fn from_payload(payload: Map<String, Value>) -> Result<Self> {
        let mut series = Self::default();

        for (key, value) in payload {
            let Value::Object(block) = value else {
                continue;
            };
            if key == "Meta Data" {
                series.meta_data = decode_string_record(block)?;
            } else if key.contains("Time Series") {
                series.time_series = decode_string_record(block)?;
                series.series_name = key;
            }
        }
        Ok(series)
    }
}

impl AlphaVantageClient {
    /// Get a daily/weekly/monthly/intraday time series
    pub async fn get_time_series(&self, params: &TimeSeriesParams) -> Result<TimeSeries> {
        let payload = self.get_json(&params.to_query()).await?;
        let series = TimeSeries::from_payload(payload)?;

        tracing::debug!(
            symbol = %params.symbol,
            function = %params.function,
            bars = series.time_series.len(),
            "Decoded time series"
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_daily_defaults() {
        let query = TimeSeriesParams::daily("AAPL").to_query();

        assert_eq!(query.get("function"), Some("TIME_SERIES_DAILY"));
        assert_eq!(query.get("outputsize"), Some("compact"));
        assert_eq!(query.get("datatype"), Some("json"));
        assert!(!query.contains("interval"));
        assert!(!query.contains("adjusted"));
        assert!(!query.contains("extended_hours"));
        assert_eq!(query.len(), 4);
    }

    #[test]
    fn test_interval_dropped_for_non_intraday() {
        let mut params = TimeSeriesParams::daily("AAPL");
        params.interval = "5min".to_string();
        params.month = "2024-01".to_string();
        params.adjusted = false;

        let query = params.to_query();
        assert!(!query.contains("interval"));
        assert!(!query.contains("month"));
        assert!(!query.contains("adjusted"));
    }

    #[test]
    fn test_intraday_adjusted_only_when_false() {
        let mut params = TimeSeriesParams::intraday("IBM", "5min");
        let query = params.to_query();
        assert_eq!(query.get("interval"), Some("5min"));
        assert_eq!(query.get("extended_hours"), Some("false"));
        assert!(!query.contains("adjusted"));
        assert!(!query.contains("month"));

        params.adjusted = false;
        params.extended_hours = true;
        params.month = "2009-01".to_string();
        let query = params.to_query();
        assert_eq!(query.get("adjusted"), Some("false"));
        assert_eq!(query.get("extended_hours"), Some("true"));
        assert_eq!(query.get("month"), Some("2009-01"));
    }

    #[test]
    fn test_from_payload_intraday() {
        let payload = json!({
            "Meta Data": {
                "1. Information": "Intraday (5min) open, high, low, close prices and volume",
                "2. Symbol": "IBM",
                "3. Last Refreshed": "2024-05-10 19:55:00",
                "4. Interval": "5min",
                "5. Output Size": "Compact",
                "6. Time Zone": "US/Eastern"
            },
            "Time Series (5min)": {
                "2024-05-10 19:55:00": {
                    "1. open": "167.1500",
                    "2. high": "167.1500",
                    "3. low": "167.1000",
                    "4. close": "167.1000",
                    "5. volume": "92"
                }
            }
        });

        let series = TimeSeries::from_payload(payload.as_object().unwrap().clone()).unwrap();
        assert_eq!(series.meta_data.symbol, "IBM");
        assert_eq!(series.meta_data.interval, "5min");
        assert_eq!(series.meta_data.time_zone, "US/Eastern");
        assert_eq!(series.series_name, "Time Series (5min)");

        let bar = &series.time_series["2024-05-10 19:55:00"];
        assert_eq!(bar.open, "167.1500");
        assert_eq!(bar.volume, "92");
        assert_eq!(bar.adjusted_close, "");
    }

    #[test]
    fn test_from_payload_weekly_adjusted() {
        let payload = json!({
            "Meta Data": {
                "1. Information": "Weekly Adjusted Prices and Volumes",
                "2. Symbol": "IBM",
                "3. Last Refreshed": "2024-05-10",
                "4. Time Zone": "US/Eastern"
            },
            "Weekly Adjusted Time Series": {
                "2024-05-10": {
                    "1. open": "166.5",
                    "2. high": "169.5",
                    "3. low": "165.6",
                    "4. close": "167.15",
                    "5. adjusted close": "167.15",
                    "6. volume": "17498780",
                    "7. dividend amount": "1.6700"
                }
            }
        });

        let series = TimeSeries::from_payload(payload.as_object().unwrap().clone()).unwrap();
        assert_eq!(series.meta_data.time_zone, "US/Eastern");
        assert_eq!(series.meta_data.output_size, "");

        let bar = &series.time_series["2024-05-10"];
        assert_eq!(bar.volume, "17498780");
        assert_eq!(bar.adjusted_close, "167.15");
        assert_eq!(bar.dividend_amount, "1.6700");

        let out = serde_json::to_value(&series).unwrap();
        assert_eq!(out["timeSeries"]["2024-05-10"]["adjustedClose"], "167.15");
        assert!(out["timeSeries"]["2024-05-10"].get("splitCoefficient").is_none());
        assert!(out["metaData"].get("interval").is_none());
    }

    #[tokio::test]
    async fn test_get_time_series_sends_intraday_params() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/query")
                    .query_param("function", "TIME_SERIES_INTRADAY")
                    .query_param("symbol", "IBM")
                    .query_param("interval", "15min")
                    .query_param("adjusted", "false")
                    .query_param("extended_hours", "false");
                then.status(200).json_body(json!({
                    "Meta Data": {"2. Symbol": "IBM"},
                    "Time Series (15min)": {}
                }));
            })
            .await;

        let client =
            AlphaVantageClient::new(server.url("/query"), "demo", Duration::from_secs(5)).unwrap();
        let mut params = TimeSeriesParams::intraday("IBM", "15min");
        params.adjusted = false;

        let series = client.get_time_series(&params).await.unwrap();
        mock.assert_async().await;
        assert_eq!(series.series_name, "Time Series (15min)");
        assert!(series.time_series.is_empty());
    }
}
