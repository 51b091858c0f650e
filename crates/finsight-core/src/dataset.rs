//! Multi-period financial dataset

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// The three statements a dataset carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Income,
    Balance,
    CashFlow,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Income => write!(f, "income statement"),
            Statement::Balance => write!(f, "balance sheet"),
            Statement::CashFlow => write!(f, "cash-flow statement"),
        }
    }
}

/// Line items of one statement for one reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValues {
    /// Reporting period label (e.g. "2023" or "2023-Q4")
    pub period: String,
    /// Named line items
    #[serde(default)]
    pub items: BTreeMap<String, f64>,
}

impl PeriodValues {
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn with(mut self, item: impl Into<String>, value: f64) -> Self {
        self.items.insert(item.into(), value);
        self
    }
}

/// Normalized input consumed by every analysis.
///
/// Each statement is a list of periods ordered oldest first. A statement may
/// be left empty when the upstream source did not supply it; every non-empty
/// statement must cover the same periods in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDataset {
    #[serde(default)]
    pub income_statement: Vec<PeriodValues>,
    #[serde(default)]
    pub balance_sheet: Vec<PeriodValues>,
    #[serde(default)]
    pub cash_flow_statement: Vec<PeriodValues>,
}

impl FinancialDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dataset from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_income(mut self, period: PeriodValues) -> Self {
        self.income_statement.push(period);
        self
    }

    pub fn with_balance(mut self, period: PeriodValues) -> Self {
        self.balance_sheet.push(period);
        self
    }

    pub fn with_cash_flow(mut self, period: PeriodValues) -> Self {
        self.cash_flow_statement.push(period);
        self
    }

    pub fn statement(&self, statement: Statement) -> &[PeriodValues] {
        match statement {
            Statement::Income => &self.income_statement,
            Statement::Balance => &self.balance_sheet,
            Statement::CashFlow => &self.cash_flow_statement,
        }
    }

    fn supplied(&self) -> impl Iterator<Item = (Statement, &[PeriodValues])> {
        [Statement::Income, Statement::Balance, Statement::CashFlow]
            .into_iter()
            .map(|s| (s, self.statement(s)))
            .filter(|(_, periods)| !periods.is_empty())
    }

    /// Number of reporting periods exposed by the dataset.
    ///
    /// Only meaningful after [`validate`](Self::validate) succeeded.
    pub fn period_count(&self) -> usize {
        self.supplied()
            .map(|(_, periods)| periods.len())
            .max()
            .unwrap_or(0)
    }

    /// Period labels, oldest first
    pub fn periods(&self) -> Vec<&str> {
        self.supplied()
            .next()
            .map(|(_, periods)| periods.iter().map(|p| p.period.as_str()).collect())
            .unwrap_or_default()
    }

    /// Check that the dataset shape can be interpreted at all
    pub fn validate(&self) -> Result<()> {
        let mut supplied = self.supplied().peekable();

        let Some((first, reference)) = supplied.peek().copied() else {
            return Err(EngineError::MalformedDataset(
                "dataset contains no reporting periods".to_string(),
            ));
        };

        let mut seen = HashSet::new();
        for period in reference {
            if !seen.insert(period.period.as_str()) {
                return Err(EngineError::MalformedDataset(format!(
                    "period '{}' appears more than once in the {first}",
                    period.period
                )));
            }
        }

        for (statement, periods) in supplied {
            let aligned = periods.len() == reference.len()
                && periods
                    .iter()
                    .zip(reference)
                    .all(|(a, b)| a.period == b.period);
            if !aligned {
                return Err(EngineError::MalformedDataset(format!(
                    "{statement} periods do not match the {first}"
                )));
            }

            for period in periods {
                if let Some((item, _)) = period.items.iter().find(|(_, v)| !v.is_finite()) {
                    return Err(EngineError::MalformedDataset(format!(
                        "non-finite value for '{item}' in the {statement} ({})",
                        period.period
                    )));
                }
            }
        }

        Ok(())
    }

    /// Value of a line item in a given period (0 = oldest)
    pub fn value(&self, statement: Statement, period_index: usize, item: &str) -> Option<f64> {
        self.statement(statement)
            .get(period_index)
            .and_then(|p| p.items.get(item))
            .copied()
    }

    /// Value of a line item in the most recent period
    pub fn latest(&self, statement: Statement, item: &str) -> Option<f64> {
        self.statement(statement)
            .last()
            .and_then(|p| p.items.get(item))
            .copied()
    }

    /// All values of a line item across periods, oldest first
    pub fn series(&self, statement: Statement, item: &str) -> Vec<Option<f64>> {
        self.statement(statement)
            .iter()
            .map(|p| p.items.get(item).copied())
            .collect()
    }
}
