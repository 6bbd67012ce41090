// ==========================================
// 月度绩效评优系统 - 配置层
// ==========================================
// 职责: 内置默认配置、文件级覆写合并、配置校验
// 红线: 配置解析在启动期一次完成, 运行中不可变
// ==========================================

pub mod manager;
pub mod rules;

pub use manager::{
    CalcSettings, ColumnMap, ConfigManager, DomainConfig, FileItem, ResolvedFileConfig,
};
pub use rules::{ExclusionRule, InclusionMode, InclusionRule};

use thiserror::Error;

/// 配置错误 (结构性缺陷, 一律致命)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("未知业务条线: {0}")]
    UnknownDomain(String),

    #[error("文件项 {key} 的月份非法: {period} (合法范围 1-12)")]
    InvalidPeriod { key: String, period: u8 },

    #[error("条线 {domain} 月份 {period} 重复配置: {first_key} 与 {second_key}")]
    DuplicatePeriod {
        domain: String,
        period: u8,
        first_key: String,
        second_key: String,
    },

    #[error("条线 {domain} 规则配置非法: {message}")]
    MalformedRule { domain: String, message: String },

    #[error("条线 {domain} 权重非法: {weight}")]
    InvalidWeight { domain: String, weight: f64 },

    #[error("配置快照序列化失败: {0}")]
    Snapshot(String),
}
