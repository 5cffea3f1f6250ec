use crate::error::TransformError;
use crate::models::money::divisor;
use crate::models::{
    compute_variance, AggregatedReceipt, Classification, ControlEntry, ReceiptLine,
    ReconciledDataset, RegisterLine, SourceTables,
};
use crate::source::load_tables;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

/// 同一 (PO, UPC) 的收货汇总
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptGroup {
    pub order_id: String,
    pub product_id: String,
    pub invoice_id: Option<String>,
    pub receive_date: Option<NaiveDate>,
    pub quantity: BigDecimal,
    pub net_receipts: BigDecimal,
}

/// 销售订单登记表索引 - 每次对账构建一次, 避免逐行扫描
#[derive(Debug, Default)]
pub struct RegisterIndex {
    /// 登记表中出现过的 Reference Number
    references: HashSet<String>,
    /// Reference Number -> Item: UPC Code -> Total Revenue 合计
    revenue: HashMap<String, HashMap<String, BigDecimal>>,
}

impl RegisterIndex {
    pub fn build(lines: &[RegisterLine]) -> Self {
        let mut references = HashSet::new();
        let mut revenue: HashMap<String, HashMap<String, BigDecimal>> = HashMap::new();

        for line in lines {
            let Some(reference) = &line.reference_number else {
                continue;
            };
            references.insert(reference.clone());

            if let Some(item) = &line.item_code {
                let entry = revenue
                    .entry(reference.clone())
                    .or_default()
                    .entry(item.clone())
                    .or_insert_with(BigDecimal::zero);
                *entry = &*entry + &line.total_revenue;
            }
        }

        Self { references, revenue }
    }

    /// 存在性检查: 订单号出现在登记表中则返回自身
    pub fn so_reference(&self, order_id: &str) -> Option<String> {
        self.references.contains(order_id).then(|| order_id.to_string())
    }

    /// (reference, item) 组合的收入合计, 任一键缺失或无匹配时为 0
    pub fn total_revenue(&self, reference: Option<&str>, item_code: Option<&str>) -> BigDecimal {
        match (reference, item_code) {
            (Some(reference), Some(item)) => self
                .revenue
                .get(reference)
                .and_then(|items| items.get(item))
                .cloned()
                .unwrap_or_else(BigDecimal::zero),
            _ => BigDecimal::zero(),
        }
    }
}

/// UPC -> SO 物料编码; 同一 UPC 以后出现的行为准
pub fn control_map(entries: &[ControlEntry]) -> HashMap<String, Option<String>> {
    entries
        .iter()
        .map(|e| (e.upc.clone(), e.so_item_code.clone()))
        .collect()
}

/// 按 (PO, UPC) 分组: 发票号取首个非空值, 日期取最早, 数量与金额求和
pub fn aggregate_receipts(lines: &[ReceiptLine]) -> Vec<ReceiptGroup> {
    let mut groups: BTreeMap<(String, String), ReceiptGroup> = BTreeMap::new();

    for line in lines {
        let key = (line.order_id.clone(), line.product_id.clone());
        let group = groups.entry(key).or_insert_with(|| ReceiptGroup {
            order_id: line.order_id.clone(),
            product_id: line.product_id.clone(),
            invoice_id: None,
            receive_date: None,
            quantity: BigDecimal::zero(),
            net_receipts: BigDecimal::zero(),
        });

        if group.invoice_id.is_none() {
            group.invoice_id = line.invoice_id.clone();
        }
        group.receive_date = match (group.receive_date, line.receive_date) {
            (Some(current), Some(date)) => Some(current.min(date)),
            (current, date) => current.or(date),
        };
        group.quantity = &group.quantity + &line.quantity;
        group.net_receipts = &group.net_receipts + &line.net_receipts;
    }

    groups.into_values().collect()
}

/// 交叉引用 + 差异计算 + 分类
pub fn classify_group(
    group: ReceiptGroup,
    register: &RegisterIndex,
    control: &HashMap<String, Option<String>>,
) -> AggregatedReceipt {
    let so_reference = register.so_reference(&group.order_id);
    let so_item_code = control.get(&group.product_id).cloned().flatten();
    let so_total_revenue = register.total_revenue(so_reference.as_deref(), so_item_code.as_deref());

    let variance = compute_variance(&group.net_receipts, &so_total_revenue, so_item_code.as_deref());
    let classification = Classification::from_variance(&variance);
    let actual_deductions = group.net_receipts.clone() / divisor();
    let expected_deductions = so_total_revenue.clone() / divisor();

    AggregatedReceipt {
        order_id: group.order_id,
        product_id: group.product_id,
        invoice_id: group.invoice_id,
        receive_date: group.receive_date,
        quantity: group.quantity,
        net_receipts: group.net_receipts,
        so_reference,
        so_item_code,
        so_total_revenue,
        variance,
        actual_deductions,
        expected_deductions,
        classification,
    }
}

/// 对已加载的源表执行对账 (纯计算, 无 IO)
pub fn reconcile_tables(tables: &SourceTables) -> ReconciledDataset {
    let groups = aggregate_receipts(&tables.receipts);
    let register = RegisterIndex::build(&tables.register);
    let control = control_map(&tables.control);

    tracing::debug!(
        "Aggregated {} receipt lines into {} (PO, UPC) groups; register references: {}",
        tables.receipts.len(),
        groups.len(),
        register.references.len()
    );

    let rows = groups
        .into_iter()
        .map(|group| classify_group(group, &register, &control))
        .collect();

    ReconciledDataset {
        rows,
        source_counts: tables.counts(),
    }
}

/// 读取工作簿并对账; 每次调用都重新读取与计算
pub fn reconcile(path: &Path) -> Result<ReconciledDataset, TransformError> {
    let started = Instant::now();
    let tables = load_tables(path)?;
    let dataset = reconcile_tables(&tables);

    tracing::info!(
        "Reconciled {}: {} receipt lines -> {} rows in {:?}",
        path.display(),
        tables.receipts.len(),
        dataset.len(),
        started.elapsed()
    );
    Ok(dataset)
}
