use crate::models::{
    AggregatedReceipt, Classification, MonthlyTrend, ReconSummary, RecordFilter,
    VarianceByClassification,
};
use bigdecimal::{BigDecimal, Zero};
use std::collections::BTreeMap;

fn sum_by<F>(rows: &[AggregatedReceipt], field: F) -> BigDecimal
where
    F: Fn(&AggregatedReceipt) -> &BigDecimal,
{
    rows.iter()
        .fold(BigDecimal::zero(), |acc, row| acc + field(row))
}

/// 汇总统计 (基于行级结果)
pub fn summarize(rows: &[AggregatedReceipt]) -> ReconSummary {
    let zero = BigDecimal::zero();
    let total_variance = sum_by(rows, |r| &r.variance);
    let positive_variance = rows
        .iter()
        .filter(|r| r.variance > zero)
        .fold(BigDecimal::zero(), |acc, r| acc + &r.variance);
    let total_actual_deductions = sum_by(rows, |r| &r.actual_deductions);

    let mut breakdown: BTreeMap<Classification, usize> = BTreeMap::new();
    for row in rows {
        *breakdown.entry(row.classification).or_insert(0) += 1;
    }
    let count_of = |c: Classification| breakdown.get(&c).copied().unwrap_or(0);

    let average_variance = if rows.is_empty() {
        None
    } else {
        Some(total_variance.clone() / BigDecimal::from(rows.len() as u64))
    };
    let recoverable_share = if total_actual_deductions.is_zero() {
        BigDecimal::zero()
    } else {
        positive_variance.clone() / total_actual_deductions.clone()
    };

    ReconSummary {
        total_records: rows.len(),
        total_net_receipts: sum_by(rows, |r| &r.net_receipts),
        total_so_revenue: sum_by(rows, |r| &r.so_total_revenue),
        total_expected_deductions: sum_by(rows, |r| &r.expected_deductions),
        disputable_count: count_of(Classification::Disputable),
        under_applied_count: count_of(Classification::UnderApplied),
        confirmed_valid_count: count_of(Classification::ConfirmedValid),
        total_deductions: total_actual_deductions.clone(),
        recoverable_amount: positive_variance.clone(),
        recoverable_share,
        average_variance,
        total_actual_deductions,
        positive_variance,
        total_variance,
        classification_breakdown: breakdown,
    }
}

impl RecordFilter {
    pub fn matches(&self, row: &AggregatedReceipt) -> bool {
        if let Some(classification) = self.classification {
            if row.classification != classification {
                return false;
            }
        }
        if let Some(min) = &self.min_variance {
            if row.variance < *min {
                return false;
            }
        }
        if let Some(max) = &self.max_variance {
            if row.variance > *max {
                return false;
            }
        }
        if let Some(po) = &self.purchase_order {
            if row.order_id != *po {
                return false;
            }
        }
        if let Some(upc) = &self.upc {
            if row.product_id != *upc {
                return false;
            }
        }
        true
    }
}

pub fn filter_rows(rows: &[AggregatedReceipt], filter: &RecordFilter) -> Vec<AggregatedReceipt> {
    rows.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// 可争议行, 按差异降序
pub fn disputable_items(rows: &[AggregatedReceipt]) -> Vec<AggregatedReceipt> {
    let mut items: Vec<AggregatedReceipt> = rows
        .iter()
        .filter(|r| r.classification == Classification::Disputable)
        .cloned()
        .collect();
    items.sort_by(|a, b| b.variance.cmp(&a.variance));
    items
}

/// 按自然月汇总实际/预期扣款, 无收货日期的行不计入
pub fn monthly_trends(rows: &[AggregatedReceipt]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, (BigDecimal, BigDecimal)> = BTreeMap::new();
    for row in rows {
        let Some(date) = row.receive_date else {
            continue;
        };
        let entry = months
            .entry(date.format("%Y-%m").to_string())
            .or_insert_with(|| (BigDecimal::zero(), BigDecimal::zero()));
        entry.0 = &entry.0 + &row.actual_deductions;
        entry.1 = &entry.1 + &row.expected_deductions;
    }

    months
        .into_iter()
        .map(|(month, (actual, expected))| MonthlyTrend {
            month,
            actual_deductions: actual.round(2),
            expected_deductions: expected.round(2),
        })
        .collect()
}

/// 图表口径:
/// Confirmed Valid 取差异为 0 的实际扣款; Disputable 取正差异; Under-Applied 取负差异之和的相反数
pub fn variance_by_classification(rows: &[AggregatedReceipt]) -> VarianceByClassification {
    let zero = BigDecimal::zero();
    let mut confirmed_valid = BigDecimal::zero();
    let mut disputable = BigDecimal::zero();
    let mut under_applied = BigDecimal::zero();

    for row in rows {
        match row.classification {
            Classification::ConfirmedValid if row.variance == zero => {
                confirmed_valid = &confirmed_valid + &row.actual_deductions;
            }
            Classification::Disputable if row.variance > zero => {
                disputable = &disputable + &row.variance;
            }
            Classification::UnderApplied if row.variance < zero => {
                under_applied = &under_applied - &row.variance;
            }
            _ => {}
        }
    }

    VarianceByClassification {
        confirmed_valid,
        disputable,
        under_applied,
    }
}
