//! Local ratio calculator
//!
//! Computes the classic ratio families (liquidity, profitability, leverage,
//! efficiency, market) on the latest period, plus a three-factor DuPont
//! decomposition over the last two periods.

use super::{CalcError, ComputationStrategy, ExecutionContext, divide, round4};
use async_trait::async_trait;
use finsight_core::items::{
    CASH, COST_OF_GOODS_SOLD, CURRENT_ASSETS, CURRENT_LIABILITIES, DIVIDENDS_PAID,
    INTEREST_EXPENSE, INVENTORY, NET_INCOME, OPERATING_CASH_FLOW, OPERATING_INCOME, RECEIVABLES,
    REVENUE, SHARE_PRICE, SHAREHOLDERS_EQUITY, SHARES_OUTSTANDING, TOTAL_ASSETS,
    TOTAL_LIABILITIES,
};
use finsight_core::{
    AnalysisDefinition, FinancialDataset, Language, Statement, StrategyOutcome, StrategyTag,
};
use serde_json::{Map, Value, json};
use std::time::Instant;

type Ratios = Vec<(&'static str, f64)>;

/// Deterministic ratio strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioStrategy;

impl RatioStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ComputationStrategy for RatioStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::LocalRatio
    }

    async fn execute(
        &self,
        dataset: &FinancialDataset,
        definition: &AnalysisDefinition,
        ctx: &ExecutionContext,
    ) -> StrategyOutcome {
        let started = Instant::now();
        match compute(dataset, definition.id(), ctx.language) {
            Ok(payload) => StrategyOutcome::success(
                payload,
                self.tag().as_str(),
                started.elapsed().as_millis() as u64,
            ),
            Err(e) => e.into_outcome(),
        }
    }
}

fn compute(
    dataset: &FinancialDataset,
    analysis: &str,
    language: Language,
) -> Result<Value, CalcError> {
    if analysis == "dupont_analysis" {
        return dupont(dataset, language);
    }

    let period = Period::latest(dataset)?;
    let ratios = match analysis {
        "liquidity_ratios" => liquidity(&period)?,
        "profitability_ratios" => profitability(&period)?,
        "leverage_ratios" => leverage(&period)?,
        "efficiency_ratios" => efficiency(&period)?,
        "market_ratios" => market(&period)?,
        other => return Err(CalcError::Unsupported(other.to_string())),
    };

    Ok(render(analysis, &period.label, &ratios, language))
}

/// Line-item reader for one reporting period
struct Period<'a> {
    dataset: &'a FinancialDataset,
    index: usize,
    label: String,
}

impl<'a> Period<'a> {
    fn at(dataset: &'a FinancialDataset, index: usize) -> Self {
        let label = dataset
            .periods()
            .get(index)
            .map(ToString::to_string)
            .unwrap_or_default();
        Self {
            dataset,
            index,
            label,
        }
    }

    fn latest(dataset: &'a FinancialDataset) -> Result<Self, CalcError> {
        match dataset.period_count() {
            0 => Err(CalcError::Insufficient(
                "dataset has no reporting periods".to_string(),
            )),
            n => Ok(Self::at(dataset, n - 1)),
        }
    }

    fn require(&self, statement: Statement, item: &'static str) -> Result<f64, CalcError> {
        self.optional(statement, item)
            .ok_or_else(|| CalcError::Missing {
                statement,
                item,
                period: self.label.clone(),
            })
    }

    fn optional(&self, statement: Statement, item: &str) -> Option<f64> {
        self.dataset.value(statement, self.index, item)
    }
}

fn liquidity(p: &Period<'_>) -> Result<Ratios, CalcError> {
    let current_assets = p.require(Statement::Balance, CURRENT_ASSETS)?;
    let current_liabilities = p.require(Statement::Balance, CURRENT_LIABILITIES)?;
    let inventory = p.optional(Statement::Balance, INVENTORY).unwrap_or(0.0);

    let mut ratios = vec![
        (
            "current_ratio",
            divide("current_ratio", current_assets, current_liabilities)?,
        ),
        (
            "quick_ratio",
            divide("quick_ratio", current_assets - inventory, current_liabilities)?,
        ),
    ];
    if let Some(cash) = p.optional(Statement::Balance, CASH) {
        ratios.push(("cash_ratio", cash / current_liabilities));
    }
    if let Some(ocf) = p.optional(Statement::CashFlow, OPERATING_CASH_FLOW) {
        ratios.push(("operating_cash_flow_ratio", ocf / current_liabilities));
    }
    Ok(ratios)
}

fn profitability(p: &Period<'_>) -> Result<Ratios, CalcError> {
    let revenue = p.require(Statement::Income, REVENUE)?;
    let net_income = p.require(Statement::Income, NET_INCOME)?;
    let total_assets = p.require(Statement::Balance, TOTAL_ASSETS)?;
    let equity = p.require(Statement::Balance, SHAREHOLDERS_EQUITY)?;

    let mut ratios = Vec::new();
    if let Some(cogs) = p.optional(Statement::Income, COST_OF_GOODS_SOLD) {
        ratios.push(("gross_margin", divide("gross_margin", revenue - cogs, revenue)?));
    }
    if let Some(operating_income) = p.optional(Statement::Income, OPERATING_INCOME) {
        ratios.push((
            "operating_margin",
            divide("operating_margin", operating_income, revenue)?,
        ));
    }
    ratios.push(("net_margin", divide("net_margin", net_income, revenue)?));
    ratios.push((
        "return_on_assets",
        divide("return_on_assets", net_income, total_assets)?,
    ));
    ratios.push((
        "return_on_equity",
        divide("return_on_equity", net_income, equity)?,
    ));
    Ok(ratios)
}

fn leverage(p: &Period<'_>) -> Result<Ratios, CalcError> {
    let total_liabilities = p.require(Statement::Balance, TOTAL_LIABILITIES)?;
    let total_assets = p.require(Statement::Balance, TOTAL_ASSETS)?;
    let equity = p.require(Statement::Balance, SHAREHOLDERS_EQUITY)?;

    let mut ratios = vec![
        (
            "debt_to_equity",
            divide("debt_to_equity", total_liabilities, equity)?,
        ),
        ("debt_ratio", divide("debt_ratio", total_liabilities, total_assets)?),
        (
            "equity_multiplier",
            divide("equity_multiplier", total_assets, equity)?,
        ),
    ];

    let operating_income = p.optional(Statement::Income, OPERATING_INCOME);
    let interest = p.optional(Statement::Income, INTEREST_EXPENSE);
    if let (Some(operating_income), Some(interest)) = (operating_income, interest) {
        // No interest expense means there is nothing to cover
        if interest != 0.0 {
            ratios.push(("interest_coverage", operating_income / interest.abs()));
        }
    }
    Ok(ratios)
}

fn efficiency(p: &Period<'_>) -> Result<Ratios, CalcError> {
    let revenue = p.require(Statement::Income, REVENUE)?;
    let total_assets = p.require(Statement::Balance, TOTAL_ASSETS)?;

    let mut ratios = vec![(
        "asset_turnover",
        divide("asset_turnover", revenue, total_assets)?,
    )];

    let cogs = p.optional(Statement::Income, COST_OF_GOODS_SOLD);
    let inventory = p.optional(Statement::Balance, INVENTORY);
    if let (Some(cogs), Some(inventory)) = (cogs, inventory) {
        if inventory != 0.0 {
            ratios.push(("inventory_turnover", cogs / inventory));
        }
    }

    if let Some(receivables) = p.optional(Statement::Balance, RECEIVABLES) {
        if receivables != 0.0 && revenue != 0.0 {
            let turnover = revenue / receivables;
            ratios.push(("receivables_turnover", turnover));
            ratios.push(("days_sales_outstanding", 365.0 / turnover));
        }
    }
    Ok(ratios)
}

fn market(p: &Period<'_>) -> Result<Ratios, CalcError> {
    let net_income = p.require(Statement::Income, NET_INCOME)?;
    let shares = p.require(Statement::Balance, SHARES_OUTSTANDING)?;
    let price = p.require(Statement::Balance, SHARE_PRICE)?;

    let eps = divide("earnings_per_share", net_income, shares)?;
    let mut ratios = vec![
        ("earnings_per_share", eps),
        ("price_to_earnings", divide("price_to_earnings", price, eps)?),
    ];

    if let Some(equity) = p.optional(Statement::Balance, SHAREHOLDERS_EQUITY) {
        let book_value_per_share = equity / shares;
        ratios.push((
            "price_to_book",
            divide("price_to_book", price, book_value_per_share)?,
        ));
    }
    if let Some(dividends) = p.optional(Statement::CashFlow, DIVIDENDS_PAID) {
        // Cash-flow statements report dividends as an outflow
        let per_share = dividends.abs() / shares;
        ratios.push(("dividend_yield", divide("dividend_yield", per_share, price)?));
    }
    Ok(ratios)
}

struct DuPont {
    net_margin: f64,
    asset_turnover: f64,
    equity_multiplier: f64,
}

impl DuPont {
    fn of(p: &Period<'_>) -> Result<Self, CalcError> {
        let revenue = p.require(Statement::Income, REVENUE)?;
        let net_income = p.require(Statement::Income, NET_INCOME)?;
        let total_assets = p.require(Statement::Balance, TOTAL_ASSETS)?;
        let equity = p.require(Statement::Balance, SHAREHOLDERS_EQUITY)?;

        Ok(Self {
            net_margin: divide("net_margin", net_income, revenue)?,
            asset_turnover: divide("asset_turnover", revenue, total_assets)?,
            equity_multiplier: divide("equity_multiplier", total_assets, equity)?,
        })
    }

    fn roe(&self) -> f64 {
        self.net_margin * self.asset_turnover * self.equity_multiplier
    }

    fn factors(&self) -> [(&'static str, f64); 3] {
        [
            ("net_margin", self.net_margin),
            ("asset_turnover", self.asset_turnover),
            ("equity_multiplier", self.equity_multiplier),
        ]
    }

    fn to_json(&self) -> Value {
        json!({
            "net_margin": round4(self.net_margin),
            "asset_turnover": round4(self.asset_turnover),
            "equity_multiplier": round4(self.equity_multiplier),
            "return_on_equity": round4(self.roe()),
        })
    }
}

fn dupont(dataset: &FinancialDataset, language: Language) -> Result<Value, CalcError> {
    let count = dataset.period_count();
    if count < 2 {
        return Err(CalcError::Insufficient(format!(
            "DuPont analysis needs two periods, dataset has {count}"
        )));
    }

    let previous_period = Period::at(dataset, count - 2);
    let current_period = Period::at(dataset, count - 1);
    let previous = DuPont::of(&previous_period)?;
    let current = DuPont::of(&current_period)?;

    // Factor with the largest relative move explains most of the ROE change
    let driver = previous
        .factors()
        .iter()
        .zip(current.factors())
        .filter(|((_, before), _)| *before != 0.0)
        .map(|((name, before), (_, after))| (*name, (after / before - 1.0).abs()))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(name, _)| name);

    let roe_change = current.roe() - previous.roe();
    let mut insights = vec![match language {
        Language::En => format!(
            "ROE moved from {:.2}% to {:.2}%",
            previous.roe() * 100.0,
            current.roe() * 100.0
        ),
        Language::Ar => format!(
            "تغير العائد على حقوق الملكية من {:.2}% إلى {:.2}%",
            previous.roe() * 100.0,
            current.roe() * 100.0
        ),
    }];
    if let Some(driver) = driver {
        insights.push(match language {
            Language::En => format!("Main driver: {}", label(driver, language)),
            Language::Ar => format!("المحرك الرئيسي: {}", label(driver, language)),
        });
    }

    let interpretation = match (language, roe_change >= 0.0) {
        (Language::En, true) => "Return on equity improved over the last period.",
        (Language::En, false) => "Return on equity declined over the last period.",
        (Language::Ar, true) => "تحسن العائد على حقوق الملكية خلال الفترة الأخيرة.",
        (Language::Ar, false) => "تراجع العائد على حقوق الملكية خلال الفترة الأخيرة.",
    };

    let mut periods = Map::new();
    periods.insert(previous_period.label.clone(), previous.to_json());
    periods.insert(current_period.label.clone(), current.to_json());

    Ok(json!({
        "analysis": "dupont_analysis",
        "periods": periods,
        "roe_change": round4(roe_change),
        "primary_driver": driver,
        "interpretation": interpretation,
        "insights": insights,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rating {
    Strong,
    Adequate,
    Weak,
}

impl Rating {
    fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Rating::Strong, Language::En) => "strong",
            (Rating::Adequate, Language::En) => "adequate",
            (Rating::Weak, Language::En) => "weak",
            (Rating::Strong, Language::Ar) => "قوي",
            (Rating::Adequate, Language::Ar) => "مقبول",
            (Rating::Weak, Language::Ar) => "ضعيف",
        }
    }

    fn score(self) -> u32 {
        match self {
            Rating::Strong => 2,
            Rating::Adequate => 1,
            Rating::Weak => 0,
        }
    }
}

/// Rate a ratio against rule-of-thumb thresholds
fn rate(ratio: &str, value: f64) -> Option<Rating> {
    // (strong, adequate); thresholds descend when lower values are better
    let (strong, adequate, higher_is_better) = match ratio {
        "current_ratio" => (2.0, 1.0, true),
        "quick_ratio" => (1.0, 0.5, true),
        "cash_ratio" => (0.5, 0.2, true),
        "gross_margin" => (0.4, 0.2, true),
        "operating_margin" => (0.15, 0.05, true),
        "net_margin" => (0.10, 0.03, true),
        "return_on_assets" => (0.05, 0.02, true),
        "return_on_equity" => (0.15, 0.08, true),
        "interest_coverage" => (5.0, 1.5, true),
        "asset_turnover" => (1.0, 0.5, true),
        "debt_to_equity" => (1.0, 2.0, false),
        "debt_ratio" => (0.4, 0.6, false),
        _ => return None,
    };

    let rating = if higher_is_better {
        if value >= strong {
            Rating::Strong
        } else if value >= adequate {
            Rating::Adequate
        } else {
            Rating::Weak
        }
    } else if value <= strong {
        Rating::Strong
    } else if value <= adequate {
        Rating::Adequate
    } else {
        Rating::Weak
    };
    Some(rating)
}

fn label(ratio: &'static str, language: Language) -> &'static str {
    if language == Language::En {
        return match ratio {
            "current_ratio" => "Current ratio",
            "quick_ratio" => "Quick ratio",
            "cash_ratio" => "Cash ratio",
            "gross_margin" => "Gross margin",
            "operating_margin" => "Operating margin",
            "net_margin" => "Net margin",
            "return_on_assets" => "Return on assets",
            "return_on_equity" => "Return on equity",
            "debt_to_equity" => "Debt to equity",
            "debt_ratio" => "Debt ratio",
            "equity_multiplier" => "Equity multiplier",
            "interest_coverage" => "Interest coverage",
            "asset_turnover" => "Asset turnover",
            other => other,
        };
    }

    match ratio {
        "current_ratio" => "نسبة التداول",
        "quick_ratio" => "نسبة السيولة السريعة",
        "cash_ratio" => "نسبة النقدية",
        "gross_margin" => "هامش الربح الإجمالي",
        "operating_margin" => "هامش الربح التشغيلي",
        "net_margin" => "هامش صافي الربح",
        "return_on_assets" => "العائد على الأصول",
        "return_on_equity" => "العائد على حقوق الملكية",
        "debt_to_equity" => "نسبة الدين إلى حقوق الملكية",
        "debt_ratio" => "نسبة المديونية",
        "equity_multiplier" => "مضاعف حقوق الملكية",
        "interest_coverage" => "نسبة تغطية الفوائد",
        "asset_turnover" => "معدل دوران الأصول",
        other => other,
    }
}

fn render(analysis: &str, period: &str, ratios: &Ratios, language: Language) -> Value {
    let mut values = Map::new();
    let mut ratings = Map::new();
    let mut insights = Vec::new();
    let mut total_score = 0;

    for &(name, value) in ratios {
        values.insert(name.to_string(), json!(round4(value)));
        if let Some(rating) = rate(name, value) {
            ratings.insert(name.to_string(), json!(rating.label(Language::En)));
            insights.push(format!(
                "{}: {value:.2} ({})",
                label(name, language),
                rating.label(language)
            ));
            total_score += rating.score();
        }
    }

    let rated = ratings.len();
    let interpretation = if rated == 0 {
        match language {
            Language::En => format!("No benchmarked ratios available for {period}."),
            Language::Ar => format!("لا توجد نسب معيارية متاحة للفترة {period}."),
        }
    } else {
        let average = f64::from(total_score) / rated as f64;
        let overall = if average >= 1.5 {
            Rating::Strong
        } else if average >= 0.75 {
            Rating::Adequate
        } else {
            Rating::Weak
        };
        match language {
            Language::En => format!(
                "Overall position for {period} is {} across {rated} benchmarked ratios.",
                overall.label(language)
            ),
            Language::Ar => format!(
                "الوضع العام للفترة {period} {} استناداً إلى {rated} من النسب المعيارية.",
                overall.label(language)
            ),
        }
    };

    json!({
        "analysis": analysis,
        "period": period,
        "ratios": values,
        "ratings": ratings,
        "interpretation": interpretation,
        "insights": insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::fixtures::three_year_dataset;
    use finsight_core::{FailureKind, PeriodValues, items};

    fn payload(analysis: &str) -> Value {
        compute(&three_year_dataset(), analysis, Language::En).unwrap()
    }

    fn ratio(payload: &Value, name: &str) -> f64 {
        payload["ratios"][name].as_f64().unwrap()
    }

    #[test]
    fn test_liquidity_ratios() {
        let p = payload("liquidity_ratios");
        assert_eq!(p["period"], "2023");
        assert_eq!(ratio(&p, "current_ratio"), 2.0);
        assert!((ratio(&p, "quick_ratio") - 1.3333).abs() < 1e-4);
        assert_eq!(ratio(&p, "cash_ratio"), 0.5);
        assert_eq!(p["ratings"]["current_ratio"], "strong");
    }

    #[test]
    fn test_profitability_ratios() {
        let p = payload("profitability_ratios");
        assert_eq!(ratio(&p, "net_margin"), 0.1);
        assert_eq!(ratio(&p, "gross_margin"), 0.4);
        assert_eq!(ratio(&p, "return_on_equity"), 0.11);
        assert_eq!(p["ratings"]["return_on_equity"], "adequate");
    }

    #[test]
    fn test_leverage_ratios() {
        let p = payload("leverage_ratios");
        assert_eq!(ratio(&p, "debt_to_equity"), 1.0);
        assert_eq!(ratio(&p, "equity_multiplier"), 2.0);
        assert!((ratio(&p, "interest_coverage") - 9.075).abs() < 1e-9);
    }

    #[test]
    fn test_market_ratios() {
        let p = payload("market_ratios");
        assert_eq!(ratio(&p, "earnings_per_share"), 1.21);
        assert!((ratio(&p, "price_to_earnings") - 12.3967).abs() < 1e-4);
        assert_eq!(ratio(&p, "dividend_yield"), 0.02);
    }

    #[test]
    fn test_dupont_decomposition() {
        let p = payload("dupont_analysis");
        let current = &p["periods"]["2023"];
        let roe = current["return_on_equity"].as_f64().unwrap();
        assert!((roe - 0.11).abs() < 1e-4);
        assert!(p["roe_change"].as_f64().unwrap() > 0.0);
        assert_eq!(p["primary_driver"], "net_margin");
    }

    #[test]
    fn test_arabic_text() {
        let p = compute(&three_year_dataset(), "liquidity_ratios", Language::Ar).unwrap();
        let insights = p["insights"].as_array().unwrap();
        assert!(insights[0].as_str().unwrap().contains("نسبة التداول"));
        // Machine-readable ratings stay in English
        assert_eq!(p["ratings"]["current_ratio"], "strong");
    }

    #[test]
    fn test_missing_item_is_insufficient_data() {
        let dataset = FinancialDataset::new()
            .with_balance(PeriodValues::new("2023").with(items::CURRENT_ASSETS, 100.0));
        let err = compute(&dataset, "liquidity_ratios", Language::En).unwrap_err();
        assert_eq!(
            err.into_outcome().failure_kind(),
            Some(FailureKind::InsufficientData)
        );
    }

    #[test]
    fn test_zero_denominator_is_computation_error() {
        let dataset = FinancialDataset::new().with_balance(
            PeriodValues::new("2023")
                .with(items::CURRENT_ASSETS, 100.0)
                .with(items::CURRENT_LIABILITIES, 0.0),
        );
        let err = compute(&dataset, "liquidity_ratios", Language::En).unwrap_err();
        assert_eq!(
            err.into_outcome().failure_kind(),
            Some(FailureKind::ComputationError)
        );
    }

    #[test]
    fn test_unknown_analysis_is_computation_error() {
        let err = compute(&three_year_dataset(), "pca_analysis", Language::En).unwrap_err();
        assert!(matches!(err, CalcError::Unsupported(_)));
    }

    #[test]
    fn test_rating_direction() {
        assert_eq!(rate("debt_to_equity", 0.5), Some(Rating::Strong));
        assert_eq!(rate("debt_to_equity", 3.0), Some(Rating::Weak));
        assert_eq!(rate("current_ratio", 1.2), Some(Rating::Adequate));
        assert_eq!(rate("price_to_earnings", 12.0), None);
    }

    #[tokio::test]
    async fn test_execute_reports_provider() {
        let definition = crate::AnalysisRegistry::builtin()
            .unwrap()
            .find_by_id("leverage_ratios")
            .cloned()
            .unwrap();
        let outcome = RatioStrategy::new()
            .execute(
                &three_year_dataset(),
                &definition,
                &ExecutionContext::default(),
            )
            .await;

        match outcome {
            StrategyOutcome::Success { provider, .. } => assert_eq!(provider, "local-ratio"),
            StrategyOutcome::Failure { message, .. } => panic!("unexpected failure: {message}"),
        }
    }
}
