use super::money::{serialize_as_f64, serialize_option_as_f64};
use super::reconciled::Classification;
use bigdecimal::BigDecimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// 汇总统计 (含看板 KPI)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconSummary {
    pub total_records: usize,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_variance: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub positive_variance: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_net_receipts: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_so_revenue: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_actual_deductions: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_expected_deductions: BigDecimal,
    /// 只包含实际出现的结论
    pub classification_breakdown: BTreeMap<Classification, usize>,
    /// 无记录时为 null
    #[serde(serialize_with = "serialize_option_as_f64")]
    pub average_variance: Option<BigDecimal>,
    pub disputable_count: usize,
    pub under_applied_count: usize,
    pub confirmed_valid_count: usize,
    #[serde(serialize_with = "serialize_as_f64")]
    pub total_deductions: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub recoverable_amount: BigDecimal,
    #[serde(serialize_with = "serialize_as_f64")]
    pub recoverable_share: BigDecimal,
}

/// 月度扣款趋势
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// YYYY-MM
    pub month: String,
    #[serde(rename = "Actual Deductions", serialize_with = "serialize_as_f64")]
    pub actual_deductions: BigDecimal,
    #[serde(rename = "Expected Deductions", serialize_with = "serialize_as_f64")]
    pub expected_deductions: BigDecimal,
}

/// 图表数据点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationFigure {
    pub name: Classification,
    #[serde(serialize_with = "serialize_as_f64")]
    pub value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarianceByClassification {
    pub confirmed_valid: BigDecimal,
    pub disputable: BigDecimal,
    pub under_applied: BigDecimal,
}

impl VarianceByClassification {
    pub fn figures(&self) -> Vec<ClassificationFigure> {
        vec![
            ClassificationFigure {
                name: Classification::ConfirmedValid,
                value: self.confirmed_valid.clone(),
            },
            ClassificationFigure {
                name: Classification::Disputable,
                value: self.disputable.clone(),
            },
            ClassificationFigure {
                name: Classification::UnderApplied,
                value: self.under_applied.clone(),
            },
        ]
    }

    /// 以结论名为键的合计
    pub fn totals(&self) -> BTreeMap<&'static str, f64> {
        use bigdecimal::ToPrimitive;
        self.figures()
            .into_iter()
            .map(|f| (f.name.as_str(), f.value.to_f64().unwrap_or(0.0)))
            .collect()
    }
}

/// 行级过滤条件, 各条件之间为"与"关系
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub classification: Option<Classification>,
    pub min_variance: Option<BigDecimal>,
    pub max_variance: Option<BigDecimal>,
    pub purchase_order: Option<String>,
    pub upc: Option<String>,
}
