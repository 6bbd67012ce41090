// ==========================================
// 月度绩效评优系统 - 报表输出层
// ==========================================
// 职责: 结果表组装与 CSV 落盘
// 红线: 只读流程结果, 不回写任何计算表
// ==========================================

pub mod csv_writer;
pub mod tables;

pub use csv_writer::CsvReportWriter;
pub use tables::{ReportBuilder, ReportTable};

use thiserror::Error;

/// 报表输出错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报表文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 输出失败: {0}")]
    Csv(#[from] csv::Error),
}
