//! Canonical line-item names
//!
//! Upstream ingestion normalizes every statement to these keys. Strategies
//! look values up by these names only.

// Income statement
pub const REVENUE: &str = "revenue";
pub const COST_OF_GOODS_SOLD: &str = "cost_of_goods_sold";
pub const OPERATING_EXPENSES: &str = "operating_expenses";
pub const OPERATING_INCOME: &str = "operating_income";
pub const INTEREST_EXPENSE: &str = "interest_expense";
pub const NET_INCOME: &str = "net_income";

// Balance sheet
pub const CURRENT_ASSETS: &str = "current_assets";
pub const CASH: &str = "cash";
pub const INVENTORY: &str = "inventory";
pub const RECEIVABLES: &str = "receivables";
pub const TOTAL_ASSETS: &str = "total_assets";
pub const CURRENT_LIABILITIES: &str = "current_liabilities";
pub const TOTAL_LIABILITIES: &str = "total_liabilities";
pub const LONG_TERM_DEBT: &str = "long_term_debt";
pub const SHAREHOLDERS_EQUITY: &str = "shareholders_equity";
pub const SHARES_OUTSTANDING: &str = "shares_outstanding";
pub const SHARE_PRICE: &str = "share_price";

// Cash-flow statement
pub const OPERATING_CASH_FLOW: &str = "operating_cash_flow";
pub const CAPITAL_EXPENDITURE: &str = "capital_expenditure";
pub const DIVIDENDS_PAID: &str = "dividends_paid";
