// ==========================================
// 月度绩效评优系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与指标表结构
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod employee;
pub mod metrics;
pub mod types;

// 重导出核心类型
pub use employee::{EmployeeIdentity, FilteredTable, RawRow};
pub use metrics::{BestMonthResult, DerivedTriple, MetricTable, ScoreEntry};
pub use types::{
    priority_key, CalcPolicy, Direction, DomainKind, FirstPeriodMode, SecondDiffEdgeMode,
};
