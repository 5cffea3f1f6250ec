use crate::models::{AggregatedReceipt, Classification, InvoiceSummary};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// 按发票号重新汇总
///
/// 分类由汇总后的差异重新计算, 不沿用行级分类。
/// 没有发票号的行不参与汇总。
pub fn summarize_by_invoice(rows: &[AggregatedReceipt]) -> Vec<InvoiceSummary> {
    let mut invoices: BTreeMap<&str, InvoiceSummary> = BTreeMap::new();
    let mut without_invoice = 0usize;

    for row in rows {
        let Some(invoice_id) = row.invoice_id.as_deref() else {
            without_invoice += 1;
            continue;
        };

        match invoices.entry(invoice_id) {
            Entry::Vacant(slot) => {
                slot.insert(start_summary(invoice_id, row));
            }
            Entry::Occupied(mut slot) => {
                let summary = slot.get_mut();
                summary.quantity = &summary.quantity + &row.quantity;
                summary.net_receipts = &summary.net_receipts + &row.net_receipts;
                summary.so_total_revenue = &summary.so_total_revenue + &row.so_total_revenue;
                summary.variance = &summary.variance + &row.variance;
                summary.actual_deductions = &summary.actual_deductions + &row.actual_deductions;
                summary.expected_deductions = &summary.expected_deductions + &row.expected_deductions;
                summary.receive_date = summary.receive_date.max(row.receive_date);
                if summary.so_reference.is_none() {
                    summary.so_reference = row.so_reference.clone();
                }
                if summary.so_item_code.is_none() {
                    summary.so_item_code = row.so_item_code.clone();
                }
                summary.line_count += 1;
            }
        }
    }

    if without_invoice > 0 {
        tracing::debug!("{} reconciled rows have no invoice id and were left out", without_invoice);
    }

    invoices
        .into_values()
        .map(|mut summary| {
            summary.classification = Classification::from_variance(&summary.variance);
            summary
        })
        .collect()
}

fn start_summary(invoice_id: &str, row: &AggregatedReceipt) -> InvoiceSummary {
    InvoiceSummary {
        invoice_id: invoice_id.to_string(),
        order_id: row.order_id.clone(),
        product_id: row.product_id.clone(),
        receive_date: row.receive_date,
        quantity: row.quantity.clone(),
        net_receipts: row.net_receipts.clone(),
        so_reference: row.so_reference.clone(),
        so_item_code: row.so_item_code.clone(),
        so_total_revenue: row.so_total_revenue.clone(),
        variance: row.variance.clone(),
        actual_deductions: row.actual_deductions.clone(),
        expected_deductions: row.expected_deductions.clone(),
        classification: row.classification,
        line_count: 1,
    }
}
