//! Local statistical calculator
//!
//! Supports `advanced_time_series` (descriptive statistics, growth, CAGR and a
//! least-squares trend for the headline line items) and
//! `multiple_regression_analysis` (net income regressed on revenue).

use super::{CalcError, ComputationStrategy, ExecutionContext, round4};
use async_trait::async_trait;
use finsight_core::items::{NET_INCOME, REVENUE, TOTAL_ASSETS};
use finsight_core::{
    AnalysisDefinition, FinancialDataset, Language, Statement, StrategyOutcome, StrategyTag,
};
use serde_json::{Map, Value, json};
use std::time::Instant;

/// Line items covered by the time-series analysis
const TREND_ITEMS: [(Statement, &str); 3] = [
    (Statement::Income, REVENUE),
    (Statement::Income, NET_INCOME),
    (Statement::Balance, TOTAL_ASSETS),
];

/// Below this slope (relative to the mean) a series counts as flat
const FLAT_THRESHOLD: f64 = 0.005;

/// Deterministic statistics strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalStrategy;

impl StatisticalStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ComputationStrategy for StatisticalStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::LocalStatistical
    }

    async fn execute(
        &self,
        dataset: &FinancialDataset,
        definition: &AnalysisDefinition,
        ctx: &ExecutionContext,
    ) -> StrategyOutcome {
        let started = Instant::now();
        let min_points = (definition.required_years() as usize).max(2);
        let result = match definition.id() {
            "advanced_time_series" => time_series(dataset, min_points, ctx.language),
            "multiple_regression_analysis" => regression(dataset, min_points.max(3), ctx.language),
            other => Err(CalcError::Unsupported(other.to_string())),
        };

        match result {
            Ok(payload) => StrategyOutcome::success(
                payload,
                self.tag().as_str(),
                started.elapsed().as_millis() as u64,
            ),
            Err(e) => e.into_outcome(),
        }
    }
}

/// Values of a line item across all periods, only if every period has one
fn complete_series(
    dataset: &FinancialDataset,
    statement: Statement,
    item: &str,
) -> Option<Vec<f64>> {
    let series: Option<Vec<f64>> = dataset.series(statement, item).into_iter().collect();
    series.filter(|values| !values.is_empty())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1)
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Adjusted Fisher-Pearson skewness; None when undefined
fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len() as f64;
    let sd = std_dev(values);
    if values.len() < 3 || sd == 0.0 {
        return None;
    }
    let m = mean(values);
    let cubed = values.iter().map(|v| ((v - m) / sd).powi(3)).sum::<f64>();
    Some(n / ((n - 1.0) * (n - 2.0)) * cubed)
}

struct Fit {
    slope: f64,
    intercept: f64,
    r_squared: f64,
}

/// Ordinary least squares of `ys` on `xs`
fn linear_fit(xs: &[f64], ys: &[f64]) -> Result<Fit, CalcError> {
    let (mx, my) = (mean(xs), mean(ys));
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return Err(CalcError::Degenerate(
            "independent variable has no variance".to_string(),
        ));
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    let intercept = my - slope * mx;

    let sst: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
    let sse: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    // A constant series is fitted exactly by a flat line
    let r_squared = if sst == 0.0 { 1.0 } else { 1.0 - sse / sst };

    Ok(Fit {
        slope,
        intercept,
        r_squared,
    })
}

fn item_label(item: &str, language: Language) -> &str {
    match (item, language) {
        (REVENUE, Language::En) => "Revenue",
        (NET_INCOME, Language::En) => "Net income",
        (TOTAL_ASSETS, Language::En) => "Total assets",
        (REVENUE, Language::Ar) => "الإيرادات",
        (NET_INCOME, Language::Ar) => "صافي الدخل",
        (TOTAL_ASSETS, Language::Ar) => "إجمالي الأصول",
        (other, _) => other,
    }
}

fn direction(slope: f64, mean: f64, language: Language) -> &'static str {
    let relative = if mean == 0.0 { slope } else { slope / mean.abs() };
    match (relative, language) {
        (r, Language::En) if r > FLAT_THRESHOLD => "rising",
        (r, Language::En) if r < -FLAT_THRESHOLD => "falling",
        (_, Language::En) => "flat",
        (r, Language::Ar) if r > FLAT_THRESHOLD => "صاعد",
        (r, Language::Ar) if r < -FLAT_THRESHOLD => "هابط",
        (_, Language::Ar) => "مستقر",
    }
}

fn describe(values: &[f64]) -> Value {
    let m = mean(values);
    let sd = std_dev(values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    json!({
        "mean": round4(m),
        "std_dev": round4(sd),
        "coefficient_of_variation": (m != 0.0).then(|| round4(sd / m.abs())),
        "min": min,
        "max": max,
        "skewness": skewness(values).map(round4),
    })
}

/// Period-over-period growth; None where the base is zero
fn growth(values: &[f64]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|w| (w[0] != 0.0).then(|| round4((w[1] - w[0]) / w[0].abs())))
        .collect()
}

/// Compound annual growth; only defined for positive endpoints
fn cagr(values: &[f64]) -> Option<f64> {
    let (first, last) = (*values.first()?, *values.last()?);
    let years = values.len().checked_sub(1).filter(|&n| n > 0)? as f64;
    (first > 0.0 && last > 0.0).then(|| round4((last / first).powf(1.0 / years) - 1.0))
}

fn time_series(
    dataset: &FinancialDataset,
    min_points: usize,
    language: Language,
) -> Result<Value, CalcError> {
    let mut series = Map::new();
    let mut insights = Vec::new();

    for (statement, item) in TREND_ITEMS {
        let Some(values) = complete_series(dataset, statement, item) else {
            continue;
        };
        if values.len() < min_points {
            return Err(CalcError::Insufficient(format!(
                "time-series analysis needs {min_points} periods, dataset has {}",
                values.len()
            )));
        }

        let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        let fit = linear_fit(&xs, &values)?;
        let projection = fit.intercept + fit.slope * values.len() as f64;

        insights.push(match language {
            Language::En => format!(
                "{} trend is {} ({:+.2} per period, R² {:.2})",
                item_label(item, language),
                direction(fit.slope, mean(&values), language),
                fit.slope,
                fit.r_squared
            ),
            Language::Ar => format!(
                "اتجاه {} {} ({:+.2} لكل فترة، R² {:.2})",
                item_label(item, language),
                direction(fit.slope, mean(&values), language),
                fit.slope,
                fit.r_squared
            ),
        });

        series.insert(
            item.to_string(),
            json!({
                "values": values,
                "statistics": describe(&values),
                "growth": growth(&values),
                "cagr": cagr(&values),
                "trend": {
                    "slope": round4(fit.slope),
                    "intercept": round4(fit.intercept),
                    "r_squared": round4(fit.r_squared),
                    "next_period_projection": round4(projection),
                },
            }),
        );
    }

    if !series.contains_key(REVENUE) {
        return Err(CalcError::Missing {
            statement: Statement::Income,
            item: REVENUE,
            period: "every period".to_string(),
        });
    }

    let interpretation = match language {
        Language::En => format!("Trend analysis over {} periods.", dataset.period_count()),
        Language::Ar => format!("تحليل الاتجاه على مدى {} فترات.", dataset.period_count()),
    };

    Ok(json!({
        "analysis": "advanced_time_series",
        "periods": dataset.periods(),
        "series": series,
        "interpretation": interpretation,
        "insights": insights,
    }))
}

fn regression(
    dataset: &FinancialDataset,
    min_points: usize,
    language: Language,
) -> Result<Value, CalcError> {
    let require = |item: &'static str| {
        complete_series(dataset, Statement::Income, item).ok_or(CalcError::Missing {
            statement: Statement::Income,
            item,
            period: "every period".to_string(),
        })
    };
    let revenue = require(REVENUE)?;
    let net_income = require(NET_INCOME)?;

    if revenue.len() < min_points {
        return Err(CalcError::Insufficient(format!(
            "regression needs {min_points} observations, dataset has {}",
            revenue.len()
        )));
    }

    let fit = linear_fit(&revenue, &net_income)?;
    let pearson_r = if std_dev(&net_income) == 0.0 {
        0.0
    } else {
        fit.r_squared.max(0.0).sqrt().copysign(fit.slope)
    };

    let strength = match (pearson_r.abs(), language) {
        (r, Language::En) if r >= 0.8 => "strong",
        (r, Language::En) if r >= 0.5 => "moderate",
        (_, Language::En) => "weak",
        (r, Language::Ar) if r >= 0.8 => "قوية",
        (r, Language::Ar) if r >= 0.5 => "متوسطة",
        (_, Language::Ar) => "ضعيفة",
    };

    let interpretation = match language {
        Language::En => format!(
            "Net income has a {strength} linear relationship with revenue; each additional unit of revenue adds {:.4} to net income.",
            fit.slope
        ),
        Language::Ar => format!(
            "العلاقة الخطية بين صافي الدخل والإيرادات {strength}؛ كل وحدة إضافية من الإيرادات تضيف {:.4} إلى صافي الدخل.",
            fit.slope
        ),
    };

    Ok(json!({
        "analysis": "multiple_regression_analysis",
        "dependent": NET_INCOME,
        "independent": [REVENUE],
        "observations": revenue.len(),
        "coefficients": {
            "intercept": round4(fit.intercept),
            "revenue": round4(fit.slope),
        },
        "r_squared": round4(fit.r_squared),
        "pearson_r": round4(pearson_r),
        "interpretation": interpretation,
        "insights": [format!("R² = {:.4}", fit.r_squared)],
    }))
}
