use super::workbook::{
    SheetTable, SourceWorkbook, CONTROL_SHEET, MAPPING_SHEET, RECEIPTS_SHEET, REGISTER_SHEET,
};
use crate::error::TransformError;
use crate::models::money::{decimal_from_f64, parse_decimal};
use crate::models::{ControlEntry, MappingEntry, ReceiptLine, RegisterLine, SourceTables};
use bigdecimal::{BigDecimal, Zero};
use calamine::Data;
use chrono::{Days, NaiveDate};
use std::path::Path;

// 列名
pub const COL_PURCHASE_ORDER: &str = "Purchase Order";
pub const COL_UPC: &str = "UPC";
pub const COL_INVOICE_ID: &str = "Amazon Invoice ID";
pub const COL_RECEIVE_DATE: &str = "Receive Date";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_NET_RECEIPTS: &str = "Net Receipts";
pub const COL_REFERENCE_NUMBER: &str = "Reference Number";
pub const COL_ITEM_UPC_CODE: &str = "Item: UPC Code";
pub const COL_TOTAL_REVENUE: &str = "Total Revenue";
pub const COL_SO_ITEM_UPC_CODE: &str = "SO Item: UPC Code";

/// 加载并校验四张源表
pub fn load_tables(path: &Path) -> Result<SourceTables, TransformError> {
    let mut workbook = SourceWorkbook::open(path)?;

    let receipts = parse_receipts(&workbook.read(RECEIPTS_SHEET)?)?;
    let register = parse_register(&workbook.read(REGISTER_SHEET)?)?;
    let mapping = parse_mapping(&workbook.read(MAPPING_SHEET)?)?;
    let control = parse_control(&workbook.read(CONTROL_SHEET)?)?;

    Ok(SourceTables {
        receipts,
        register,
        mapping,
        control,
    })
}

pub fn parse_receipts(table: &SheetTable) -> Result<Vec<ReceiptLine>, TransformError> {
    let order_col = table.column(COL_PURCHASE_ORDER)?;
    let upc_col = table.column(COL_UPC)?;
    let invoice_col = table.column(COL_INVOICE_ID)?;
    let date_col = table.column(COL_RECEIVE_DATE)?;
    let qty_col = table.column(COL_QUANTITY)?;
    let net_col = table.column(COL_NET_RECEIPTS)?;

    let mut lines = Vec::with_capacity(table.row_count());
    let mut skipped = 0usize;
    for (row, cells) in table.rows() {
        let order_id = key_cell(cells, order_col);
        let product_id = key_cell(cells, upc_col);
        let (Some(order_id), Some(product_id)) = (order_id, product_id) else {
            skipped += 1;
            tracing::debug!(
                "Sheet '{}' row {}: missing {} or {}, row skipped",
                table.sheet, row, COL_PURCHASE_ORDER, COL_UPC
            );
            continue;
        };

        lines.push(ReceiptLine {
            order_id,
            product_id,
            invoice_id: key_cell(cells, invoice_col),
            receive_date: date_cell(table, row, cells, date_col, COL_RECEIVE_DATE)?,
            quantity: decimal_cell(table, row, cells, qty_col, COL_QUANTITY)?,
            net_receipts: decimal_cell(table, row, cells, net_col, COL_NET_RECEIPTS)?,
        });
    }

    if skipped > 0 {
        tracing::warn!("Sheet '{}': {} rows without order/UPC keys skipped", table.sheet, skipped);
    }
    Ok(lines)
}

pub fn parse_register(table: &SheetTable) -> Result<Vec<RegisterLine>, TransformError> {
    let ref_col = table.column(COL_REFERENCE_NUMBER)?;
    let item_col = table.column(COL_ITEM_UPC_CODE)?;
    let revenue_col = table.column(COL_TOTAL_REVENUE)?;

    table
        .rows()
        .map(|(row, cells)| {
            Ok(RegisterLine {
                reference_number: key_cell(cells, ref_col),
                item_code: key_cell(cells, item_col),
                total_revenue: decimal_cell(table, row, cells, revenue_col, COL_TOTAL_REVENUE)?,
            })
        })
        .collect()
}

pub fn parse_control(table: &SheetTable) -> Result<Vec<ControlEntry>, TransformError> {
    let upc_col = table.column(COL_UPC)?;
    let item_col = table.column(COL_SO_ITEM_UPC_CODE)?;

    Ok(table
        .rows()
        .filter_map(|(_, cells)| {
            key_cell(cells, upc_col).map(|upc| ControlEntry {
                upc,
                so_item_code: key_cell(cells, item_col),
            })
        })
        .collect())
}

/// Mapping 表的列均为可选
pub fn parse_mapping(table: &SheetTable) -> Result<Vec<MappingEntry>, TransformError> {
    let ref_col = table.optional_column(COL_REFERENCE_NUMBER);
    let item_col = table.optional_column(COL_SO_ITEM_UPC_CODE);

    Ok(table
        .rows()
        .map(|(_, cells)| MappingEntry {
            reference_number: ref_col.and_then(|c| key_cell(cells, c)),
            so_item_code: item_col.and_then(|c| key_cell(cells, c)),
        })
        .collect())
}

/// 键列按字符串读取; 整数数值不带小数部分, 保留 UPC 等长编码
pub fn key_cell(cells: &[Data], col: usize) -> Option<String> {
    let text = match cells.get(col)? {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn invalid(table: &SheetTable, row: usize, column: &str, expected: &'static str, cell: &Data) -> TransformError {
    TransformError::InvalidValue {
        sheet: table.sheet.clone(),
        row,
        column: column.to_string(),
        expected,
        value: cell.to_string(),
    }
}

/// 数值列: 空单元格计 0, 无法解析则报错
pub fn decimal_cell(
    table: &SheetTable,
    row: usize,
    cells: &[Data],
    col: usize,
    column: &str,
) -> Result<BigDecimal, TransformError> {
    let Some(cell) = cells.get(col) else {
        return Ok(BigDecimal::zero());
    };
    let parsed = match cell {
        Data::Empty => Some(BigDecimal::zero()),
        Data::Float(n) => decimal_from_f64(*n),
        Data::Int(n) => Some(BigDecimal::from(*n)),
        Data::String(s) if s.trim().is_empty() => Some(BigDecimal::zero()),
        Data::String(s) => parse_decimal(s),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(table, row, column, "a decimal", cell))
}

/// 日期列: 空单元格为 None
pub fn date_cell(
    table: &SheetTable,
    row: usize,
    cells: &[Data],
    col: usize,
    column: &str,
) -> Result<Option<NaiveDate>, TransformError> {
    let Some(cell) = cells.get(col) else {
        return Ok(None);
    };
    let parsed = match cell {
        Data::Empty => return Ok(None),
        Data::String(s) if s.trim().is_empty() => return Ok(None),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::Float(n) => serial_to_date(*n),
        Data::Int(n) => serial_to_date(*n as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_text(s),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| invalid(table, row, column, "a date", cell))
}

/// Excel 序列日期 (1900 日期系统, 以 1899-12-30 为零点)
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%d-%b-%Y"];

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    // ISO 日期时间只取日期部分
    let iso_prefix = text.get(..10).unwrap_or(text);
    if let Ok(date) = NaiveDate::parse_from_str(iso_prefix, "%Y-%m-%d") {
        return Some(date);
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
