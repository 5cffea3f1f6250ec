use crate::error::TransformError;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 工作表定义: 名称 + 表头前需跳过的行数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSpec {
    pub name: &'static str,
    pub header_skip: usize,
}

pub const RECEIPTS_SHEET: SheetSpec = SheetSpec { name: "AmzaonPO", header_skip: 0 };
pub const REGISTER_SHEET: SheetSpec = SheetSpec { name: "CustomSalesOrderRegisterM", header_skip: 6 };
pub const MAPPING_SHEET: SheetSpec = SheetSpec { name: "Mapping", header_skip: 1 };
pub const CONTROL_SHEET: SheetSpec = SheetSpec { name: "Control", header_skip: 2 };

pub const REQUIRED_SHEETS: [SheetSpec; 4] = [RECEIPTS_SHEET, REGISTER_SHEET, MAPPING_SHEET, CONTROL_SHEET];

/// 表头 + 数据行 (保留原始单元格, 类型解析在 tables 中完成)
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub sheet: String,
    columns: HashMap<String, usize>,
    /// (工作表行号, 单元格)
    rows: Vec<(usize, Vec<Data>)>,
}

impl SheetTable {
    /// 从单元格网格构建; `start_row` 为网格首行在工作表中的位置 (0 起)
    pub fn from_grid(sheet: &str, header_skip: usize, start_row: usize, grid: Vec<Vec<Data>>) -> Self {
        let to_skip = header_skip.saturating_sub(start_row);
        let mut first_row = start_row + to_skip;
        let mut iter = grid.into_iter().skip(to_skip).peekable();

        // 跳过表头前的空行
        while iter.next_if(|cells| is_blank_row(cells)).is_some() {
            first_row += 1;
        }

        let mut columns = HashMap::new();
        if let Some(header) = iter.next() {
            for (idx, cell) in header.iter().enumerate() {
                if let Data::String(name) = cell {
                    let name = name.trim();
                    if !name.is_empty() {
                        // 重名列取第一个
                        columns.entry(name.to_string()).or_insert(idx);
                    }
                }
            }
        }

        let rows = iter
            .enumerate()
            // 工作表行号: 表头占 first_row, 数据从下一行开始, 对外 1 起
            .map(|(idx, cells)| (first_row + idx + 2, cells))
            .filter(|(_, cells)| !is_blank_row(cells))
            .collect();

        Self {
            sheet: sheet.to_string(),
            columns,
            rows,
        }
    }

    /// 必需列的位置
    pub fn column(&self, name: &str) -> Result<usize, TransformError> {
        self.columns.get(name).copied().ok_or_else(|| TransformError::MissingColumn {
            sheet: self.sheet.clone(),
            column: name.to_string(),
        })
    }

    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Data])> {
        self.rows.iter().map(|(row, cells)| (*row, cells.as_slice()))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

fn is_blank_row(cells: &[Data]) -> bool {
    cells.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

/// 已打开的源工作簿
pub struct SourceWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl SourceWorkbook {
    /// 打开工作簿并校验四张必需工作表是否齐全
    pub fn open(path: &Path) -> Result<Self, TransformError> {
        if !path.exists() {
            return Err(TransformError::MissingFile(path.to_path_buf()));
        }

        let sheets = open_workbook_auto(path)?;
        let names = sheets.sheet_names();
        for spec in REQUIRED_SHEETS {
            if !names.iter().any(|n| n == spec.name) {
                return Err(TransformError::MissingSheet {
                    sheet: spec.name.to_string(),
                });
            }
        }

        Ok(Self { sheets })
    }

    /// 读取一张工作表
    pub fn read(&mut self, spec: SheetSpec) -> Result<SheetTable, TransformError> {
        let range = self.sheets.worksheet_range(spec.name)?;
        let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let grid: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        let table = SheetTable::from_grid(spec.name, spec.header_skip, start_row, grid);
        tracing::debug!(
            "Sheet '{}': {} data rows (header skip {}, range start row {})",
            spec.name,
            table.row_count(),
            spec.header_skip,
            start_row
        );
        Ok(table)
    }
}
