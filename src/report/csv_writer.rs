// ==========================================
// 月度绩效评优系统 - CSV 报表输出
// ==========================================
// 职责: 把结构化表格落盘为 CSV (每表一个文件)
// 说明: 文件命名 {运行标签}_{表名}.csv, 目录不存在时自动创建
// ==========================================

use crate::report::tables::ReportTable;
use crate::report::ReportError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// CSV 报表输出器 (无状态)
pub struct CsvReportWriter;

impl CsvReportWriter {
    pub fn new() -> Self {
        Self
    }

    /// 输出单张表
    pub fn write_table(
        &self,
        table: &ReportTable,
        out_dir: &Path,
        run_tag: &str,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(out_dir)?;

        let path = out_dir.join(format!("{}_{}.csv", run_tag, table.name));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// 输出全部表格
    ///
    /// # 返回
    /// - 落盘文件路径列表 (与输入表序一致)
    pub fn write_all(
        &self,
        tables: &[ReportTable],
        out_dir: &Path,
        run_tag: &str,
    ) -> Result<Vec<PathBuf>, ReportError> {
        let mut paths = Vec::with_capacity(tables.len());
        for table in tables {
            let path = self.write_table(table, out_dir, run_tag)?;
            info!(file = %path.display(), rows = table.rows.len(), "报表落盘");
            paths.push(path);
        }
        Ok(paths)
    }
}

impl Default for CsvReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_table() -> ReportTable {
        ReportTable {
            name: "scores".to_string(),
            headers: vec!["工号".to_string(), "评分 (M-1)".to_string()],
            rows: vec![
                vec!["00000001".to_string(), "0.5".to_string()],
                vec!["00000002".to_string(), "1".to_string()],
            ],
        }
    }

    #[test]
    fn test_write_table_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = CsvReportWriter::new()
            .write_table(&sample_table(), dir.path(), "20250101_120000")
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "20250101_120000_scores.csv"
        );
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("工号,评分 (M-1)\n"));
        assert!(content.contains("00000001,0.5"));
    }

    #[test]
    fn test_write_all_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("OUT");
        let paths = CsvReportWriter::new()
            .write_all(&[sample_table()], &nested, "run")
            .unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].exists());
    }
}
