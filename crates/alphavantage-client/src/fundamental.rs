//! Fundamental data: balance sheet, cash flow, income statement and
//! company overview.
//!
//! Every figure stays the string the upstream sent. Reports come back in the
//! order the upstream lists them.

use serde::{Deserialize, Serialize};

use crate::{AlphaVantageClient, QueryParams, Result};

/// Annual and quarterly reports for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialStatement<R> {
    pub symbol: String,
    pub annual_reports: Vec<R>,
    pub quarterly_reports: Vec<R>,
}

pub type BalanceSheet = FinancialStatement<BalanceSheetReport>;
pub type CashFlow = FinancialStatement<CashFlowReport>;
pub type IncomeStatement = FinancialStatement<IncomeStatementReport>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceSheetReport {
    pub fiscal_date_ending: String,
    pub reported_currency: String,
    pub total_assets: String,
    pub total_current_assets: String,
    pub cash_and_cash_equivalents_at_carrying_value: String,
    pub cash_and_short_term_investments: String,
    pub inventory: String,
    pub current_net_receivables: String,
    pub total_non_current_assets: String,
    pub property_plant_equipment: String,
    #[serde(rename = "accumulatedDepreciationAmortizationPPE")]
    pub accumulated_depreciation_amortization_ppe: String,
    pub intangible_assets: String,
    pub intangible_assets_excluding_goodwill: String,
    pub goodwill: String,
    pub investments: String,
    pub long_term_investments: String,
    pub short_term_investments: String,
    pub other_current_assets: String,
    pub other_non_current_assets: String,
    pub total_liabilities: String,
    pub total_current_liabilities: String,
    pub current_accounts_payable: String,
    pub deferred_revenue: String,
    pub current_debt: String,
    pub short_term_debt: String,
    pub total_non_current_liabilities: String,
    pub capital_lease_obligations: String,
    pub long_term_debt: String,
    pub current_long_term_debt: String,
    pub long_term_debt_noncurrent: String,
    pub short_long_term_debt_total: String,
    pub other_current_liabilities: String,
    pub other_non_current_liabilities: String,
    pub total_shareholder_equity: String,
    pub treasury_stock: String,
    pub retained_earnings: String,
    pub common_stock: String,
    pub common_stock_shares_outstanding: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashFlowReport {
    pub fiscal_date_ending: String,
    pub reported_currency: String,
    pub operating_cashflow: String,
    pub payments_for_operating_activities: String,
    pub proceeds_from_operating_activities: String,
    pub change_in_operating_liabilities: String,
    pub change_in_operating_assets: String,
    pub depreciation_depletion_and_amortization: String,
    pub capital_expenditures: String,
    pub change_in_receivables: String,
    pub change_in_inventory: String,
    pub profit_loss: String,
    pub cashflow_from_investment: String,
    pub cashflow_from_financing: String,
    pub proceeds_from_repayments_of_short_term_debt: String,
    pub payments_for_repurchase_of_common_stock: String,
    pub payments_for_repurchase_of_equity: String,
    pub payments_for_repurchase_of_preferred_stock: String,
    pub dividend_payout: String,
    pub dividend_payout_common_stock: String,
    pub dividend_payout_preferred_stock: String,
    pub proceeds_from_issuance_of_common_stock: String,
    pub proceeds_from_issuance_of_long_term_debt_and_capital_securities_net: String,
    pub proceeds_from_issuance_of_preferred_stock: String,
    pub proceeds_from_repurchase_of_equity: String,
    pub proceeds_from_sale_of_treasury_stock: String,
    pub change_in_cash_and_cash_equivalents: String,
    pub change_in_exchange_rate: String,
    pub net_income: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeStatementReport {
    pub fiscal_date_ending: String,
    pub reported_currency: String,
    pub gross_profit: String,
    pub total_revenue: String,
    pub cost_of_revenue: String,
    pub costof_goods_and_services_sold: String,
    pub operating_income: String,
    pub selling_general_and_administrative: String,
    pub research_and_development: String,
    pub operating_expenses: String,
    pub investment_income_net: String,
    pub net_interest_income: String,
    pub interest_income: String,
    pub interest_expense: String,
    pub non_interest_income: String,
    pub other_non_operating_income: String,
    pub depreciation: String,
    pub depreciation_and_amortization: String,
    pub income_before_tax: String,
    pub income_tax_expense: String,
    pub interest_and_debt_expense: String,
    pub net_income_from_continuing_operations: String,
    pub comprehensive_income_net_of_tax: String,
    pub ebit: String,
    pub ebitda: String,
    pub net_income: String,
}

/// Company profile and valuation snapshot.
///
/// Read from the upstream's PascalCase keys, written out in camelCase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"), default)]
pub struct CompanyOverview {
    pub symbol: String,
    pub asset_type: String,
    pub name: String,
    pub description: String,
    #[serde(rename(serialize = "cik", deserialize = "CIK"))]
    pub cik: String,
    pub exchange: String,
    pub currency: String,
    pub country: String,
    pub sector: String,
    pub industry: String,
    pub address: String,
    pub official_site: String,
    pub fiscal_year_end: String,
    pub latest_quarter: String,
    pub market_capitalization: String,
    #[serde(rename(serialize = "ebitda", deserialize = "EBITDA"))]
    pub ebitda: String,
    #[serde(rename(serialize = "peRatio", deserialize = "PERatio"))]
    pub pe_ratio: String,
    #[serde(rename(serialize = "pegRatio", deserialize = "PEGRatio"))]
    pub peg_ratio: String,
    pub book_value: String,
    pub dividend_per_share: String,
    pub dividend_yield: String,
    #[serde(rename(serialize = "eps", deserialize = "EPS"))]
    pub eps: String,
    #[serde(rename(serialize = "revenuePerShareTTM", deserialize = "RevenuePerShareTTM"))]
    pub revenue_per_share_ttm: String,
    pub profit_margin: String,
    #[serde(rename(serialize = "operatingMarginTTM", deserialize = "OperatingMarginTTM"))]
    pub operating_margin_ttm: String,
    #[serde(rename(serialize = "returnOnAssetsTTM", deserialize = "ReturnOnAssetsTTM"))]
    pub return_on_assets_ttm: String,
    #[serde(rename(serialize = "returnOnEquityTTM", deserialize = "ReturnOnEquityTTM"))]
    pub return_on_equity_ttm: String,
    #[serde(rename(serialize = "revenueTTM", deserialize = "RevenueTTM"))]
    pub revenue_ttm: String,
    #[serde(rename(serialize = "grossProfitTTM", deserialize = "GrossProfitTTM"))]
    pub gross_profit_ttm: String,
    #[serde(rename(serialize = "dilutedEPSTTM", deserialize = "DilutedEPSTTM"))]
    pub diluted_eps_ttm: String,
    #[serde(rename(
        serialize = "quarterlyEarningsGrowthYOY",
        deserialize = "QuarterlyEarningsGrowthYOY"
    ))]
    pub quarterly_earnings_growth_yoy: String,
    #[serde(rename(
        serialize = "quarterlyRevenueGrowthYOY",
        deserialize = "QuarterlyRevenueGrowthYOY"
    ))]
    pub quarterly_revenue_growth_yoy: String,
    pub analyst_target_price: String,
    #[serde(rename(serialize = "trailingPE", deserialize = "TrailingPE"))]
    pub trailing_pe: String,
    #[serde(rename(serialize = "forwardPE", deserialize = "ForwardPE"))]
    pub forward_pe: String,
    #[serde(rename(serialize = "priceToSalesRatioTTM", deserialize = "PriceToSalesRatioTTM"))]
    pub price_to_sales_ratio_ttm: String,
    pub price_to_book_ratio: String,
    #[serde(rename(serialize = "evToRevenue", deserialize = "EVToRevenue"))]
    pub ev_to_revenue: String,
    #[serde(rename(serialize = "evToEBITDA", deserialize = "EVToEBITDA"))]
    pub ev_to_ebitda: String,
    pub beta: String,
    #[serde(rename = "52WeekHigh")]
    pub week_high_52: String,
    #[serde(rename = "52WeekLow")]
    pub week_low_52: String,
    #[serde(rename = "50DayMovingAverage")]
    pub day_moving_average_50: String,
    #[serde(rename = "200DayMovingAverage")]
    pub day_moving_average_200: String,
    pub shares_outstanding: String,
    pub shares_float: String,
    pub shares_short: String,
    pub shares_short_prior_month: String,
    pub short_ratio: String,
    pub short_percent_outstanding: String,
    pub short_percent_float: String,
    pub percent_insiders: String,
    pub percent_institutions: String,
    pub forward_annual_dividend_rate: String,
    pub forward_annual_dividend_yield: String,
    pub payout_ratio: String,
    pub dividend_date: String,
    pub ex_dividend_date: String,
    pub last_split_factor: String,
    pub last_split_date: String,
}

fn symbol_params(function: &str, symbol: &str) -> QueryParams {
    let mut params = QueryParams::for_function(function);
    params.insert("symbol", symbol);
    params
}

impl AlphaVantageClient {
    async fn get_statement<R>(&self, function: &str, symbol: &str) -> Result<FinancialStatement<R>>
    where
        R: serde::de::DeserializeOwned + Default,
    {
        let mut statement: FinancialStatement<R> = self
            .get_string_record(&symbol_params(function, symbol))
            .await?;

        if statement.symbol.is_empty() {
            statement.symbol = symbol.to_string();
        }

        tracing::debug!(
            symbol,
            function,
            annual = statement.annual_reports.len(),
            quarterly = statement.quarterly_reports.len(),
            "Decoded financial statement"
        );
        Ok(statement)
    }

    /// Get balance sheet reports for a symbol
    pub async fn get_balance_sheet(&self, symbol: &str) -> Result<BalanceSheet> {
        self.get_statement("BALANCE_SHEET", symbol).await
    }

    /// Get cash flow reports for a symbol
    pub async fn get_cash_flow(&self, symbol: &str) -> Result<CashFlow> {
        self.get_statement("CASH_FLOW", symbol).await
    }

    /// Get income statement reports for a symbol
    pub async fn get_income_statement(&self, symbol: &str) -> Result<IncomeStatement> {
        self.get_statement("INCOME_STATEMENT", symbol).await
    }

    /// Get the company overview for a symbol
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let mut overview: CompanyOverview = self
            .get_string_record(&symbol_params("OVERVIEW", symbol))
            .await?;

        if overview.symbol.is_empty() {
            overview.symbol = symbol.to_string();
        }
        Ok(overview)
    }
}
