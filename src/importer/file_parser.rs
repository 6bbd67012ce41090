// ==========================================
// 月度绩效评优系统 - 文件解析器实现
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 来源文件读取
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// ParseOptions - 解析选项
// ==========================================

/// 文件解析选项 (来自 ResolvedFileConfig)
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// 工作表名 (优先于序号; CSV 忽略)
    pub sheet_name: Option<String>,
    /// 工作表序号 (0 起; CSV 忽略)
    pub sheet_index: Option<usize>,
    /// 表头行号 (跳过头部行之后计, 0 为首行)
    pub header_row: usize,
    /// 文件头部跳过行数
    pub skip_rows: usize,
    /// 文件尾部跳过行数 (只作用于数据行)
    pub skip_footer: usize,
}

/// 把单元格网格按选项裁剪为 记录列表
///
/// 步骤: 去头部 skip_rows 行 → header_row 行为表头 →
/// 其后为数据行 → 去尾部 skip_footer 行 → 跳过全空白行。
fn grid_to_records(
    grid: Vec<Vec<String>>,
    options: &ParseOptions,
) -> ImportResult<Vec<HashMap<String, String>>> {
    let trimmed: Vec<Vec<String>> = grid.into_iter().skip(options.skip_rows).collect();

    let headers: Vec<String> = trimmed
        .get(options.header_row)
        .ok_or_else(|| ImportError::FileReadError("文件无表头行".to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut data: Vec<Vec<String>> = trimmed.into_iter().skip(options.header_row + 1).collect();
    if options.skip_footer > 0 {
        let keep = data.len().saturating_sub(options.skip_footer);
        data.truncate(keep);
    }

    let mut records = Vec::new();
    for row in data {
        let mut row_map = HashMap::new();
        for (col_idx, value) in row.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                if header.is_empty() {
                    continue;
                }
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }

        // 跳过完全空白的行
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }

        records.push(row_map);
    }

    Ok(records)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    pub fn parse(
        &self,
        file_path: &Path,
        options: &ParseOptions,
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头位置由选项决定
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            grid.push(record.iter().map(|v| v.to_string()).collect());
        }

        grid_to_records(grid, options)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    pub fn parse(
        &self,
        file_path: &Path,
        options: &ParseOptions,
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(file_path)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(
                "Excel 文件无工作表".to_string(),
            ));
        }

        // 工作表定位: 名称 → 序号 → 首个
        let sheet_name = if let Some(name) = &options.sheet_name {
            if sheet_names.iter().any(|s| s == name) {
                name.clone()
            } else if sheet_names.len() == 1 {
                // 唯一工作表时容忍名称不符
                tracing::warn!(
                    expected = %name,
                    actual = %sheet_names[0],
                    "工作表名不符, 使用文件中唯一工作表"
                );
                sheet_names[0].clone()
            } else {
                return Err(ImportError::SheetNotFound(name.clone()));
            }
        } else if let Some(index) = options.sheet_index {
            sheet_names
                .get(index)
                .cloned()
                .ok_or_else(|| ImportError::SheetNotFound(format!("序号 {}", index)))?
        } else {
            sheet_names[0].clone()
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        grid_to_records(grid, options)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(
        &self,
        file_path: P,
        options: &ParseOptions,
    ) -> ImportResult<Vec<HashMap<String, String>>> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(path, options),
            "xlsx" | "xls" => ExcelParser.parse(path, options),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
