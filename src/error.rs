// ==========================================
// 月度绩效评优系统 - 应用层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::report::ReportError;
use thiserror::Error;

/// 应用层错误类型 (结构性失败, 导致整次运行中止)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("导入错误: {0}")]
    Import(#[from] ImportError),

    #[error("报表输出错误: {0}")]
    Report(#[from] ReportError),

    #[error("并行任务失败: {0}")]
    Join(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
