// ==========================================
// 月度绩效评优系统 - 引擎层诊断事件
// ==========================================
// 职责: 定义诊断计数 trait, 实现依赖倒置
// 说明: Engine 层定义 trait, 调用方决定落地方式 (计数/丢弃)
// 红线: 诊断只记不判, 任何实现不得影响计算结果
// ==========================================

use crate::domain::types::DomainKind;
use crate::engine::normalizer::NormalizeOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

// ==========================================
// 诊断事件 Trait
// ==========================================

/// 诊断事件接收者 Trait
///
/// Engine 层定义, 由调用方实现。引擎阶段在关键节点上报计数,
/// 不依赖任何具体日志/指标后端。
pub trait DiagnosticsSink: Send + Sync {
    /// 单文件规则过滤删行
    fn record_rows_dropped(&self, source_file: &str, rule_field: &str, count: usize);

    /// 规则因列缺失被跳过
    fn record_rule_skipped(&self, source_file: &str, rule_field: &str);

    /// 身份解析中低优先级身份被覆盖
    fn record_identity_conflict(&self, employee_id: &str);

    /// 归一化命中退化口径
    fn record_normalization_edge(&self, domain: DomainKind, outcome: NormalizeOutcome);

    /// 单员工评分完成
    fn record_score(&self, employee_id: &str, best_period: u8);
}

/// 空操作诊断接收者
///
/// 用于不需要诊断的场景 (如单元测试)
#[derive(Debug, Clone, Default)]
pub struct NoOpDiagnosticsSink;

impl DiagnosticsSink for NoOpDiagnosticsSink {
    fn record_rows_dropped(&self, _source_file: &str, _rule_field: &str, _count: usize) {}
    fn record_rule_skipped(&self, _source_file: &str, _rule_field: &str) {}
    fn record_identity_conflict(&self, _employee_id: &str) {}
    fn record_normalization_edge(&self, _domain: DomainKind, _outcome: NormalizeOutcome) {}
    fn record_score(&self, _employee_id: &str, _best_period: u8) {}
}

// ==========================================
// CountingDiagnostics - 进程内计数实现
// ==========================================

/// 诊断计数快照
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticsSnapshot {
    /// 规则字段 → 累计删行数
    pub rows_dropped_by_rule: BTreeMap<String, usize>,
    /// 文件 → 被跳过的规则字段
    pub skipped_rules_by_file: BTreeMap<String, Vec<String>>,
    pub identity_conflicts: usize,
    /// "条线/口径" → 命中次数
    pub normalization_edges: BTreeMap<String, usize>,
    pub employees_scored: usize,
}

/// 进程内计数诊断接收者 (批处理运行末尾随日志输出)
#[derive(Debug, Default)]
pub struct CountingDiagnostics {
    snapshot: Mutex<DiagnosticsSnapshot>,
}

impl CountingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取锁 (锁中毒时沿用内部值, 诊断永不中断主流程)
    fn guard(&self) -> std::sync::MutexGuard<'_, DiagnosticsSnapshot> {
        self.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.guard().clone()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl DiagnosticsSink for CountingDiagnostics {
    fn record_rows_dropped(&self, _source_file: &str, rule_field: &str, count: usize) {
        if count == 0 {
            return;
        }
        let mut snapshot = self.guard();
        *snapshot
            .rows_dropped_by_rule
            .entry(rule_field.to_string())
            .or_insert(0) += count;
    }

    fn record_rule_skipped(&self, source_file: &str, rule_field: &str) {
        let mut snapshot = self.guard();
        snapshot
            .skipped_rules_by_file
            .entry(source_file.to_string())
            .or_default()
            .push(rule_field.to_string());
    }

    fn record_identity_conflict(&self, _employee_id: &str) {
        self.guard().identity_conflicts += 1;
    }

    fn record_normalization_edge(&self, domain: DomainKind, outcome: NormalizeOutcome) {
        if outcome == NormalizeOutcome::MinMax {
            return;
        }
        let key = format!("{}/{:?}", domain.as_str(), outcome);
        *self.guard().normalization_edges.entry(key).or_insert(0) += 1;
    }

    fn record_score(&self, _employee_id: &str, _best_period: u8) {
        self.guard().employees_scored += 1;
    }
}
