use alphavantage_client::{
    AlphaVantageError, BalanceSheet, CashFlow, CompanyOverview, IncomeStatement,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{AppError, AppState, Envelope};

pub fn fundamental_routes() -> Router<AppState> {
    Router::new()
        .route("/fundamental/balance-sheet/:symbol", get(get_balance_sheet))
        .route("/fundamental/cash-flow/:symbol", get(get_cash_flow))
        .route("/fundamental/income-statement/:symbol", get(get_income_statement))
        .route("/fundamental/company-overview/:symbol", get(get_company_overview))
}

fn upstream_err<'a>(
    report: &'static str,
    symbol: &'a str,
) -> impl FnOnce(AlphaVantageError) -> AppError + 'a {
    move |e| {
        tracing::warn!(report, symbol, "Fundamental data request failed: {}", e);
        AppError::from(e)
    }
}

async fn get_balance_sheet(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Envelope<BalanceSheet>>, AppError> {
    let data = state
        .client
        .get_balance_sheet(&symbol)
        .await
        .map_err(upstream_err("balance_sheet", &symbol))?;

    Ok(Json(state.envelope(data).with_symbol(symbol)))
}

async fn get_cash_flow(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Envelope<CashFlow>>, AppError> {
    let data = state
        .client
        .get_cash_flow(&symbol)
        .await
        .map_err(upstream_err("cash_flow", &symbol))?;

    Ok(Json(state.envelope(data).with_symbol(symbol)))
}

async fn get_income_statement(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Envelope<IncomeStatement>>, AppError> {
    let data = state
        .client
        .get_income_statement(&symbol)
        .await
        .map_err(upstream_err("income_statement", &symbol))?;

    Ok(Json(state.envelope(data).with_symbol(symbol)))
}

async fn get_company_overview(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Envelope<CompanyOverview>>, AppError> {
    let data = state
        .client
        .get_company_overview(&symbol)
        .await
        .map_err(upstream_err("company_overview", &symbol))?;

    Ok(Json(state.envelope(data).with_symbol(symbol)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_income_statement_route() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/query")
                    .query_param("function", "INCOME_STATEMENT")
                    .query_param("symbol", "IBM");
                then.status(200).json_body(json!({
                    "symbol": "IBM",
                    "annualReports": [{
                        "fiscalDateEnding": "2023-12-31",
                        "reportedCurrency": "USD",
                        "totalRevenue": 61860000000_i64,
                        "netIncome": "7502000000",
                        "ebitda": null
                    }],
                    "quarterlyReports": []
                }));
            })
            .await;

        let (status, body) = get_json(
            test_app(server.url("/query")),
            "/api/v1/fundamental/income-statement/IBM",
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "IBM");

        let report = &body["data"]["annualReports"][0];
        assert_eq!(report["fiscalDateEnding"], "2023-12-31");
        assert_eq!(report["totalRevenue"], "61860000000");
        assert_eq!(report["netIncome"], "7502000000");
        assert_eq!(report["ebitda"], "");
        assert_eq!(report["grossProfit"], "");
    }

    #[tokio::test]
    async fn test_company_overview_route() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/query")
                    .query_param("function", "OVERVIEW")
                    .query_param("symbol", "IBM");
                then.status(200).json_body(json!({
                    "Symbol": "IBM",
                    "Name": "International Business Machines",
                    "PERatio": "22.5",
                    "52WeekHigh": "199.18"
                }));
            })
            .await;

        let (status, body) = get_json(
            test_app(server.url("/query")),
            "/v1/fundamental/company-overview/IBM",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "International Business Machines");
        assert_eq!(body["data"]["peRatio"], "22.5");
        assert_eq!(body["data"]["52WeekHigh"], "199.18");
    }

    #[tokio::test]
    async fn test_rate_limit_notice_is_500() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/query");
                then.status(200).json_body(json!({
                    "Information": "Thank you for using Alpha Vantage! \
                                    Our standard API rate limit is 25 requests per day."
                }));
            })
            .await;

        let (status, body) = get_json(
            test_app(server.url("/query")),
            "/api/v1/fundamental/balance-sheet/IBM",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("rate limit"));
    }
}
