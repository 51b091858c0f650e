//! Built-in analysis catalog
//!
//! Level, complexity and required history follow from the category; the
//! strategy tag decides whether an analysis is computed locally or delegated.

use finsight_core::{
    AnalysisDefinition, Category, Complexity, Level, LocalizedName, Result, StrategyTag,
};

use Category::{
    AdvancedModeling, AppliedPerformance, BasicRatios, IntelligentDetection, PortfolioRisk,
    StatisticalQuantitative,
};
use StrategyTag::{
    LocalRatio, LocalStatistical, RemoteInferenceHybrid, RemoteInferencePrimary,
    RemoteInferenceSecondary,
};

type Entry = (&'static str, &'static str, &'static str, Category, StrategyTag);

#[rustfmt::skip]
const CATALOG: &[Entry] = &[
    ("liquidity_ratios", "Liquidity Ratios", "نسب السيولة", BasicRatios, LocalRatio),
    ("profitability_ratios", "Profitability Ratios", "نسب الربحية", BasicRatios, LocalRatio),
    ("leverage_ratios", "Leverage Ratios", "نسب الرافعة المالية", BasicRatios, LocalRatio),
    ("efficiency_ratios", "Efficiency Ratios", "نسب الكفاءة", BasicRatios, LocalRatio),
    ("market_ratios", "Market Ratios", "نسب السوق", BasicRatios, LocalRatio),
    ("dupont_analysis", "DuPont Analysis", "تحليل دوبونت", AppliedPerformance, LocalRatio),
    ("productivity_analysis", "Productivity Analysis", "تحليل الإنتاجية", AppliedPerformance, RemoteInferencePrimary),
    ("operational_efficiency", "Operational Efficiency", "الكفاءة التشغيلية", AppliedPerformance, RemoteInferencePrimary),
    ("value_chain_analysis", "Value Chain Analysis", "تحليل سلسلة القيمة", AppliedPerformance, RemoteInferencePrimary),
    ("abc_analysis", "Activity-Based Costing", "تحليل التكاليف على أساس الأنشطة", AppliedPerformance, RemoteInferencePrimary),
    ("advanced_scenario_analysis", "Advanced Scenario Analysis", "تحليل السيناريوهات المتقدم", AdvancedModeling, RemoteInferenceSecondary),
    ("monte_carlo_simulation", "Monte Carlo Simulation", "تحليل مونت كارلو", AdvancedModeling, RemoteInferenceSecondary),
    ("complex_financial_modeling", "Complex Financial Modeling", "النمذجة المالية المعقدة", AdvancedModeling, RemoteInferenceSecondary),
    ("multi_variable_sensitivity", "Multi-Variable Sensitivity Analysis", "تحليل الحساسية متعدد المتغيرات", AdvancedModeling, RemoteInferenceSecondary),
    ("decision_tree_analysis", "Decision Tree Analysis", "تحليل شجرة القرار", AdvancedModeling, RemoteInferenceSecondary),
    ("multiple_regression_analysis", "Multiple Regression Analysis", "تحليل الانحدار المتعدد", StatisticalQuantitative, LocalStatistical),
    ("advanced_time_series", "Advanced Time Series Analysis", "تحليل السلاسل الزمنية المتقدم", StatisticalQuantitative, LocalStatistical),
    ("arima_models", "ARIMA Models", "نماذج ARIMA للتنبؤ", StatisticalQuantitative, RemoteInferenceSecondary),
    ("garch_models", "GARCH Models", "نماذج GARCH للتقلبات", StatisticalQuantitative, RemoteInferenceSecondary),
    ("pca_analysis", "Principal Component Analysis", "تحليل المكونات الرئيسية", StatisticalQuantitative, RemoteInferenceSecondary),
    ("modern_portfolio_theory", "Modern Portfolio Theory", "نظرية المحفظة الحديثة", PortfolioRisk, RemoteInferenceHybrid),
    ("capm_analysis", "CAPM Analysis", "نموذج تسعير الأصول الرأسمالية", PortfolioRisk, RemoteInferenceHybrid),
    ("var_analysis", "Value at Risk (VaR)", "القيمة المعرضة للخطر", PortfolioRisk, RemoteInferenceHybrid),
    ("stress_testing", "Stress Testing", "اختبارات الإجهاد", PortfolioRisk, RemoteInferenceHybrid),
    ("operational_risk_analysis", "Operational Risk Analysis", "تحليل المخاطر التشغيلية", PortfolioRisk, RemoteInferenceHybrid),
    ("ai_fraud_detection", "AI Fraud Detection", "كشف الاحتيال بالذكاء الاصطناعي", IntelligentDetection, RemoteInferenceSecondary),
    ("money_laundering_detection", "Money Laundering Detection", "كشف غسيل الأموال", IntelligentDetection, RemoteInferenceSecondary),
    ("market_manipulation_detection", "Market Manipulation Detection", "كشف التلاعب في السوق", IntelligentDetection, RemoteInferenceSecondary),
    ("advanced_bankruptcy_prediction", "Advanced Bankruptcy Prediction", "التنبؤ بالإفلاس المتقدم", IntelligentDetection, RemoteInferenceSecondary),
    ("real_time_anomaly_detection", "Real-time Anomaly Detection", "كشف الشذوذ في الوقت الفعلي", IntelligentDetection, RemoteInferenceSecondary),
];

/// Level, complexity and required periods of a category
fn tier(category: Category) -> (Level, Complexity, u32) {
    match category {
        BasicRatios => (Level::Basic, Complexity::Simple, 1),
        AppliedPerformance => (Level::Applied, Complexity::Moderate, 2),
        AdvancedModeling | StatisticalQuantitative | PortfolioRisk => {
            (Level::Advanced, Complexity::Complex, 3)
        }
        IntelligentDetection => (Level::Advanced, Complexity::Complex, 2),
    }
}

/// Build the shipped catalog in its canonical order
pub fn builtin_definitions() -> Result<Vec<AnalysisDefinition>> {
    CATALOG
        .iter()
        .map(|&(id, en, ar, category, strategy)| {
            let (level, complexity, required_years) = tier(category);
            AnalysisDefinition::new(
                id,
                LocalizedName::new(en, ar),
                category,
                level,
                complexity,
                required_years,
                strategy,
            )
        })
        .collect()
}
