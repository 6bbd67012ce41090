// ==========================================
// 月度绩效评优系统 - 核心库
// ==========================================
// 依据: 月度汇总计算说明 v1.2
// 系统定位: 决策支持系统 (评优结果供人工终审)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 系统配置
pub mod config;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 业务规则
pub mod engine;

// 报表层 - 结果输出
pub mod report;

// 应用层错误
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CalcPolicy, Direction, DomainKind, FirstPeriodMode, SecondDiffEdgeMode};

// 领域实体
pub use domain::{BestMonthResult, EmployeeIdentity, FilteredTable, MetricTable, RawRow, ScoreEntry};

// 配置
pub use config::{ConfigManager, DomainConfig, ExclusionRule, InclusionRule, ResolvedFileConfig};

// 引擎
pub use engine::{
    CountingDiagnostics, DiagnosticsSink, NoOpDiagnosticsSink, PipelineOrchestrator,
    PipelineResult,
};

// 报表
pub use report::{CsvReportWriter, ReportBuilder, ReportTable};

// 应用层错误
pub use error::{AppError, AppResult};

/// 系统版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "月度绩效评优系统";
