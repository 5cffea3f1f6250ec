use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;

/// 亚马逊 PO 收货明细 (AmzaonPO)
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub order_id: String,              // Purchase Order
    pub product_id: String,            // UPC
    pub invoice_id: Option<String>,    // Amazon Invoice ID
    pub receive_date: Option<NaiveDate>,
    pub quantity: BigDecimal,
    pub net_receipts: BigDecimal,
}

/// 销售订单登记表明细 (CustomSalesOrderRegisterM)
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterLine {
    pub reference_number: Option<String>,
    pub item_code: Option<String>,     // Item: UPC Code
    pub total_revenue: BigDecimal,
}

/// UPC -> 销售订单物料编码 (Control)
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEntry {
    pub upc: String,
    pub so_item_code: Option<String>,
}

/// Mapping 表行, 目前只做加载与计数
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub reference_number: Option<String>,
    pub so_item_code: Option<String>,
}

/// 一次加载得到的四张源表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTables {
    pub receipts: Vec<ReceiptLine>,
    pub register: Vec<RegisterLine>,
    pub mapping: Vec<MappingEntry>,
    pub control: Vec<ControlEntry>,
}

/// 各源表行数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub receipts: usize,
    pub register: usize,
    pub mapping: usize,
    pub control: usize,
}

impl SourceTables {
    pub fn counts(&self) -> SourceCounts {
        SourceCounts {
            receipts: self.receipts.len(),
            register: self.register.len(),
            mapping: self.mapping.len(),
            control: self.control.len(),
        }
    }
}
