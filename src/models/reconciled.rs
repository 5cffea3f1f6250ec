use super::money::{serialize_as_f64, DEDUCTION_DIVISOR};
use super::receipt::SourceCounts;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 对账结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Disputable")]
    Disputable,
    #[serde(rename = "Under-Applied")]
    UnderApplied,
    #[serde(rename = "Confirmed Valid")]
    ConfirmedValid,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::ConfirmedValid,
        Classification::Disputable,
        Classification::UnderApplied,
    ];

    /// 仅由差异符号决定, 与零精确比较
    pub fn from_variance(variance: &BigDecimal) -> Self {
        let zero = BigDecimal::zero();
        if *variance > zero {
            Classification::Disputable
        } else if *variance < zero {
            Classification::UnderApplied
        } else {
            Classification::ConfirmedValid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Disputable => "Disputable",
            Classification::UnderApplied => "Under-Applied",
            Classification::ConfirmedValid => "Confirmed Valid",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClassification(pub String);

impl fmt::Display for UnknownClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown classification '{}', expected one of: Disputable, Under-Applied, Confirmed Valid",
            self.0
        )
    }
}

impl std::error::Error for UnknownClassification {}

impl FromStr for Classification {
    type Err = UnknownClassification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownClassification(s.to_string()))
    }
}

/// 按 (PO, UPC) 汇总后的对账行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedReceipt {
    #[serde(rename = "Purchase Order")]
    pub order_id: String,
    #[serde(rename = "UPC")]
    pub product_id: String,
    #[serde(rename = "Amazon Invoice ID")]
    pub invoice_id: Option<String>,
    #[serde(rename = "Receive Date")]
    pub receive_date: Option<NaiveDate>,
    #[serde(rename = "Quantity", serialize_with = "serialize_as_f64")]
    pub quantity: BigDecimal,
    #[serde(rename = "Net Receipts", serialize_with = "serialize_as_f64")]
    pub net_receipts: BigDecimal,
    #[serde(rename = "SO Reference Number")]
    pub so_reference: Option<String>,
    #[serde(rename = "SO Item: UPC Code")]
    pub so_item_code: Option<String>,
    #[serde(rename = "SO Total Revenue", serialize_with = "serialize_as_f64")]
    pub so_total_revenue: BigDecimal,
    #[serde(rename = "Variance", serialize_with = "serialize_as_f64")]
    pub variance: BigDecimal,
    #[serde(rename = "Actual Deductions", serialize_with = "serialize_as_f64")]
    pub actual_deductions: BigDecimal,
    #[serde(rename = "Expected Deductions", serialize_with = "serialize_as_f64")]
    pub expected_deductions: BigDecimal,
    #[serde(rename = "Classification")]
    pub classification: Classification,
}

impl AggregatedReceipt {
    /// 是否存在有效的物料映射 (空串视同缺失)
    pub fn has_item_mapping(&self) -> bool {
        self.so_item_code.as_deref().is_some_and(|code| !code.is_empty())
    }
}

/// 计算差异: 先相减再除, 无物料映射时强制为 0
pub fn compute_variance(
    net_receipts: &BigDecimal,
    so_total_revenue: &BigDecimal,
    so_item_code: Option<&str>,
) -> BigDecimal {
    match so_item_code {
        Some(code) if !code.is_empty() => {
            (net_receipts - so_total_revenue) / BigDecimal::from(DEDUCTION_DIVISOR)
        }
        _ => BigDecimal::zero(),
    }
}

fn serialize_display_date<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(date) => serializer.serialize_str(&date.format("%b %d, %Y").to_string()),
        None => serializer.serialize_none(),
    }
}

/// 按发票汇总的展示行 (差异保持带符号)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceSummary {
    #[serde(rename = "Amazon Invoice ID")]
    pub invoice_id: String,
    #[serde(rename = "Purchase Order")]
    pub order_id: String,
    #[serde(rename = "UPC")]
    pub product_id: String,
    #[serde(rename = "Receive Date", serialize_with = "serialize_display_date")]
    pub receive_date: Option<NaiveDate>,
    #[serde(rename = "Quantity", serialize_with = "serialize_as_f64")]
    pub quantity: BigDecimal,
    #[serde(rename = "Net Receipts", serialize_with = "serialize_as_f64")]
    pub net_receipts: BigDecimal,
    #[serde(rename = "SO Reference Number")]
    pub so_reference: Option<String>,
    #[serde(rename = "SO Item: UPC Code")]
    pub so_item_code: Option<String>,
    #[serde(rename = "SO Total Revenue", serialize_with = "serialize_as_f64")]
    pub so_total_revenue: BigDecimal,
    #[serde(rename = "Variance", serialize_with = "serialize_as_f64")]
    pub variance: BigDecimal,
    #[serde(rename = "Actual Deductions", serialize_with = "serialize_as_f64")]
    pub actual_deductions: BigDecimal,
    #[serde(rename = "Expected Deductions", serialize_with = "serialize_as_f64")]
    pub expected_deductions: BigDecimal,
    #[serde(rename = "Classification")]
    pub classification: Classification,
    #[serde(rename = "Line Count")]
    pub line_count: usize,
}

/// 一次对账的完整结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciledDataset {
    pub rows: Vec<AggregatedReceipt>,
    pub source_counts: SourceCounts,
}

impl ReconciledDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn classification_follows_sign() {
        assert_eq!(Classification::from_variance(&dec("0.01")), Classification::Disputable);
        assert_eq!(Classification::from_variance(&dec("-0.01")), Classification::UnderApplied);
        assert_eq!(Classification::from_variance(&dec("0.000")), Classification::ConfirmedValid);
    }

    #[test]
    fn variance_forced_to_zero_without_mapping() {
        assert_eq!(compute_variance(&dec("600"), &dec("0"), None), BigDecimal::zero());
        assert_eq!(compute_variance(&dec("600"), &dec("0"), Some("")), BigDecimal::zero());
        assert_eq!(compute_variance(&dec("600"), &dec("500"), Some("SKU-9")), dec("10"));
        assert_eq!(compute_variance(&dec("450"), &dec("500"), Some("SKU-9")), dec("-5"));
    }

    #[test]
    fn classification_round_trips_wire_names() {
        for c in Classification::ALL {
            assert_eq!(c.as_str().parse::<Classification>(), Ok(c));
            assert_eq!(serde_json::to_value(c).unwrap(), serde_json::json!(c.as_str()));
        }
        assert!("disputable".parse::<Classification>().is_err());
    }

    #[test]
    fn invoice_date_renders_for_display() {
        let summary = InvoiceSummary {
            invoice_id: "INV-1".into(),
            order_id: "PO-1".into(),
            product_id: "UPC-1".into(),
            receive_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            quantity: dec("2"),
            net_receipts: dec("10"),
            so_reference: None,
            so_item_code: None,
            so_total_revenue: BigDecimal::zero(),
            variance: BigDecimal::zero(),
            actual_deductions: dec("1"),
            expected_deductions: BigDecimal::zero(),
            classification: Classification::ConfirmedValid,
            line_count: 1,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["Receive Date"], "Jan 05, 2024");
        assert_eq!(json["Net Receipts"], 10.0);
        assert_eq!(json["Classification"], "Confirmed Valid");
    }
}
