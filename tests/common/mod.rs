#![allow(dead_code)]

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};

pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

use Cell::{Blank, Number, Text};

fn write_row(sheet: &mut Worksheet, row: u32, cells: &[Cell]) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        match cell {
            Text(s) => {
                sheet.write_string(row, col, *s)?;
            }
            Number(n) => {
                sheet.write_number(row, col, *n)?;
            }
            Blank => {}
        }
    }
    Ok(())
}

/// 工作表: 标题行 (可选) + 表头位于 header_row + 数据行
fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    header_row: u32,
    header: &[&str],
    rows: &[Vec<Cell>],
) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    if header_row > 0 {
        sheet.write_string(0, 0, format!("{name} export"))?;
    }
    let header: Vec<Cell> = header.iter().map(|h| Text(*h)).collect();
    write_row(sheet, header_row, &header)?;
    for (idx, row) in rows.iter().enumerate() {
        write_row(sheet, header_row + 1 + idx as u32, row)?;
    }
    Ok(())
}

const RECEIPTS_HEADER: [&str; 6] = [
    "Purchase Order",
    "UPC",
    "Amazon Invoice ID",
    "Receive Date",
    "Quantity",
    "Net Receipts",
];

/// 标准样例:
/// - PO1/111 两行收货, 净额 200, 登记收入 100 => 差异 10, Disputable
/// - PO1/222 净额 30, 登记收入 80 => 差异 -5, Under-Applied
/// - PO2/333 未映射 => 差异 0, Confirmed Valid
/// - 缺 PO 的行被跳过
pub fn write_sample(path: &Path) -> Result<(), XlsxError> {
    write_workbook(path, true, false)
}

/// 标准样例 + PO3/111 一行收货 (净额 70, 无登记收入 => 差异 7, Disputable)
pub fn write_sample_with_extra_receipt(path: &Path) -> Result<(), XlsxError> {
    write_workbook(path, true, true)
}

/// 缺少 Control 工作表
pub fn write_without_control(path: &Path) -> Result<(), XlsxError> {
    write_workbook(path, false, false)
}

fn write_workbook(path: &Path, with_control: bool, extra_receipt: bool) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();

    let mut receipts = vec![
        vec![Text("PO1"), Text("111"), Text("INV1"), Number(45306.0), Number(2.0), Number(150.0)],
        vec![Text("PO1"), Text("111"), Blank, Number(45300.0), Number(1.0), Number(50.0)],
        vec![Text("PO1"), Text("222"), Text("INV1"), Number(45310.0), Number(1.0), Number(30.0)],
        vec![Text("PO2"), Text("333"), Text("INV2"), Number(45340.0), Number(4.0), Number(120.0)],
        vec![Blank, Text("444"), Text("INV3"), Number(45340.0), Number(1.0), Number(99.0)],
    ];
    if extra_receipt {
        receipts.push(vec![Text("PO3"), Text("111"), Text("INV3"), Number(45350.0), Number(1.0), Number(70.0)]);
    }
    write_sheet(&mut workbook, "AmzaonPO", 0, &RECEIPTS_HEADER, &receipts)?;

    write_sheet(
        &mut workbook,
        "CustomSalesOrderRegisterM",
        6,
        &["Reference Number", "Item: UPC Code", "Total Revenue"],
        &[
        vec![Text("PO1"), Text("ITEM-A"), Number(60.0)],
        vec![Text("PO1"), Text("ITEM-A"), Number(40.0)],
        vec![Text("PO1"), Text("ITEM-B"), Number(80.0)],
        ],
    )?;

    write_sheet(
        &mut workbook,
        "Mapping",
        1,
        &["Reference Number", "SO Item: UPC Code"],
        &[vec![Text("PO1"), Text("ITEM-A")]],
    )?;

    if with_control {
        write_sheet(
            &mut workbook,
            "Control",
            2,
            &["UPC", "SO Item: UPC Code"],
            &[
                vec![Text("111"), Text("ITEM-A")],
                vec![Text("222"), Text("ITEM-B")],
            ],
        )?;
    }

    workbook.save(path)
}

pub fn sample_in(dir: &Path) -> PathBuf {
    let path = dir.join("sample.xlsx");
    write_sample(&path).expect("write sample workbook");
    path
}
