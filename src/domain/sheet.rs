// ==========================================
// 课程学分导入工具 - 工作表模型
// ==========================================
// 职责: 内存中的表格区域 + 行级操作
// 约定: 行号/列号均为 1 起始（与表格软件一致），第 1 行为表头
// ==========================================

use crate::domain::types::CellValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 工作表操作错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("行号越界: {row}（最后一行 {last_row}）")]
    RowOutOfRange { row: usize, last_row: usize },

    #[error("列号越界: {0}（列号从 1 开始）")]
    ColumnOutOfRange(usize),
}

// ==========================================
// RowFormat - 行格式
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowFormat {
    pub background: Option<String>, // 背景色（如 "#FFF2CC"），None = 无背景
    pub bordered: bool,             // 是否绘制完整边框
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub cells: Vec<CellValue>,
    pub format: RowFormat,
}

impl SheetRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self {
            cells,
            format: RowFormat::default(),
        }
    }

    /// 读取单元格（0 起始下标），越界视为空
    pub fn cell(&self, idx: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(idx).unwrap_or(&EMPTY)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_blank())
    }
}

// ==========================================
// Sheet - 工作表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    rows: Vec<SheetRow>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// 从二维单元格创建（第一行为表头）
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows: rows.into_iter().map(SheetRow::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 更换工作表名（写回工作簿时沿用文件中的实际名称）
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 最后一行行号（含表头）；空表为 0
    pub fn last_row(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 最大列数
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    pub fn header(&self) -> Option<&SheetRow> {
        self.rows.first()
    }

    /// 表头以下的数据行
    pub fn body(&self) -> &[SheetRow] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    /// 读取指定行（1 起始）
    pub fn row(&self, row: usize) -> Option<&SheetRow> {
        row.checked_sub(1).and_then(|idx| self.rows.get(idx))
    }

    /// 追加一行（解析器使用）
    pub fn push_row(&mut self, row: SheetRow) {
        self.rows.push(row);
    }

    /// 在指定行之前插入空行
    ///
    /// row = last_row + 1 时等价于追加
    pub fn insert_row_before(&mut self, row: usize) -> Result<(), SheetError> {
        if row == 0 || row > self.rows.len() + 1 {
            return Err(SheetError::RowOutOfRange {
                row,
                last_row: self.rows.len(),
            });
        }
        self.rows.insert(row - 1, SheetRow::default());
        Ok(())
    }

    /// 从 (row, col) 开始横向写入一组值，行宽不足时自动扩展
    pub fn write_range(
        &mut self,
        row: usize,
        col: usize,
        values: &[CellValue],
    ) -> Result<(), SheetError> {
        if col == 0 {
            return Err(SheetError::ColumnOutOfRange(col));
        }
        let target = self.row_mut(row)?;
        let needed = col - 1 + values.len();
        if target.cells.len() < needed {
            target.cells.resize(needed, CellValue::Empty);
        }
        for (offset, value) in values.iter().enumerate() {
            target.cells[col - 1 + offset] = value.clone();
        }
        Ok(())
    }

    pub fn clear_background(&mut self, row: usize) -> Result<(), SheetError> {
        self.row_mut(row)?.format.background = None;
        Ok(())
    }

    pub fn set_border(&mut self, row: usize, bordered: bool) -> Result<(), SheetError> {
        self.row_mut(row)?.format.bordered = bordered;
        Ok(())
    }

    /// 按指定列对表头以下全部行升序排序（稳定排序）
    pub fn sort_body_by_column(&mut self, col: usize) -> Result<(), SheetError> {
        if col == 0 {
            return Err(SheetError::ColumnOutOfRange(col));
        }
        if self.rows.len() <= 1 {
            return Ok(());
        }
        self.rows[1..].sort_by(|a, b| a.cell(col - 1).sort_cmp(b.cell(col - 1)));
        Ok(())
    }

    /// 将指定列重写为 1..N 连续序号
    pub fn renumber_column(&mut self, col: usize) -> Result<(), SheetError> {
        if col == 0 {
            return Err(SheetError::ColumnOutOfRange(col));
        }
        for (idx, row) in self.rows.iter_mut().skip(1).enumerate() {
            if row.cells.len() < col {
                row.cells.resize(col, CellValue::Empty);
            }
            row.cells[col - 1] = CellValue::Int(idx as i64 + 1);
        }
        Ok(())
    }

    /// 读取指定列的表头以下全部值
    pub fn column_values(&self, col: usize) -> Vec<CellValue> {
        self.body()
            .iter()
            .map(|r| r.cell(col.saturating_sub(1)).clone())
            .collect()
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut SheetRow, SheetError> {
        let last_row = self.rows.len();
        row.checked_sub(1)
            .and_then(|idx| self.rows.get_mut(idx))
            .ok_or(SheetError::RowOutOfRange { row, last_row })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sheet {
        Sheet::from_rows(
            "Completed Credits",
            vec![
                vec![CellValue::text("#"), CellValue::text("Student ID")],
                vec![CellValue::Int(7), CellValue::text("S300")],
                vec![CellValue::Int(9), CellValue::text("S100")],
            ],
        )
    }

    #[test]
    fn test_insert_row_before_and_write() {
        let mut sheet = sample();
        sheet.insert_row_before(2).unwrap();
        sheet
            .write_range(2, 2, &[CellValue::text("S200"), CellValue::Int(1)])
            .unwrap();

        assert_eq!(sheet.last_row(), 4);
        let row = sheet.row(2).unwrap();
        assert_eq!(row.cells, vec![CellValue::Empty, CellValue::text("S200"), CellValue::Int(1)]);
        assert_eq!(sheet.row(3).unwrap().cell(1), &CellValue::text("S300"));
    }

    #[test]
    fn test_insert_row_out_of_range() {
        let mut sheet = sample();
        assert!(sheet.insert_row_before(0).is_err());
        assert!(sheet.insert_row_before(5).is_err());
        // last_row + 1 允许（追加）
        assert!(sheet.insert_row_before(4).is_ok());
    }

    #[test]
    fn test_sort_body_keeps_header() {
        let mut sheet = sample();
        sheet.sort_body_by_column(2).unwrap();

        assert_eq!(sheet.header().unwrap().cell(1), &CellValue::text("Student ID"));
        assert_eq!(
            sheet.column_values(2),
            vec![CellValue::text("S100"), CellValue::text("S300")]
        );
    }

    #[test]
    fn test_renumber_column_dense() {
        let mut sheet = sample();
        sheet.insert_row_before(2).unwrap();
        sheet.renumber_column(1).unwrap();

        assert_eq!(
            sheet.column_values(1),
            vec![CellValue::Int(1), CellValue::Int(2), CellValue::Int(3)]
        );
    }

    #[test]
    fn test_format_flags() {
        let mut sheet = sample();
        sheet.rows[1].format.background = Some("#FFFF00".to_string());
        sheet.clear_background(2).unwrap();
        sheet.set_border(2, true).unwrap();

        let format = &sheet.row(2).unwrap().format;
        assert_eq!(format.background, None);
        assert!(format.bordered);
    }
}
