// ==========================================
// 月度绩效评优系统 - 计算引擎层
// ==========================================
// 职责: 行过滤、身份归并、月度汇总、派生计算、归一化、评分
// 红线: 引擎一律无状态, 不做文件 I/O (读取属编排器的导入阶段)
// ==========================================

pub mod aggregator;
pub mod calc;
pub mod diagnostics;
pub mod identity_resolver;
pub mod normalizer;
pub mod orchestrator;
pub mod rule_filter;
pub mod scorer;

// 重导出核心引擎
pub use aggregator::MonthlyAggregator;
pub use calc::CalcEngine;
pub use diagnostics::{CountingDiagnostics, DiagnosticsSink, DiagnosticsSnapshot, NoOpDiagnosticsSink};
pub use identity_resolver::{IdentityResolver, ResolveStats};
pub use normalizer::{NormalizeOutcome, Normalizer};
pub use orchestrator::{PipelineOrchestrator, PipelineResult};
pub use rule_filter::{FilterStats, RuleFilterEngine};
pub use scorer::{BestMonthSelector, ScoreEngine};
