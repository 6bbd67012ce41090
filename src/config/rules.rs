// ==========================================
// 月度绩效评优系统 - 行过滤规则定义
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 行过滤规则
// 职责: 定义排除规则与包含规则的配置结构
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// ExclusionRule - 排除规则
// ==========================================

/// 排除规则: 字段值命中禁用集合的行被删除
///
/// 豁免组合:
/// - `exempt_if_other_rows_by_client`: 同客户编号存在未命中行时保留
/// - `exempt_if_other_rows_by_employee`: 同工号存在未命中行时保留
/// - 两者同时配置时任一成立即保留 (或逻辑)
/// - `active=false`: 规则整体忽略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// 映射后的字段别名 (如 "territorial_unit", "status")
    pub field: String,
    /// 禁用值列表 (比较时去空格、折叠大小写)
    pub forbidden_values: Vec<String>,
    /// 是否生效
    pub active: bool,
    /// 同客户有未命中行时豁免
    pub exempt_if_other_rows_by_client: bool,
    /// 同工号有未命中行时豁免
    pub exempt_if_other_rows_by_employee: bool,
}

impl ExclusionRule {
    /// 构造无豁免的排除规则
    pub fn unconditional(field: &str, forbidden_values: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            forbidden_values: forbidden_values.iter().map(|v| v.to_string()).collect(),
            active: true,
            exempt_if_other_rows_by_client: false,
            exempt_if_other_rows_by_employee: false,
        }
    }

    /// 规范化后的禁用值集合 (trim + 小写)
    pub fn normalized_forbidden(&self) -> BTreeSet<String> {
        self.forbidden_values
            .iter()
            .map(|v| v.trim().to_lowercase())
            .collect()
    }
}

// ==========================================
// InclusionRule - 包含规则
// ==========================================

/// 包含规则判定口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InclusionMode {
    /// 值必须在列表中
    MustBeIn,
    /// 值必须不在列表中
    MustNotBeIn,
}

/// 包含规则: 行必须通过全部包含规则才保留 (与逻辑)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionRule {
    /// 映射后的字段别名
    pub field: String,
    /// 比较值列表 (比较时去空格、折叠大小写)
    pub values: Vec<String>,
    pub mode: InclusionMode,
}

impl InclusionRule {
    pub fn new(field: &str, values: &[&str], mode: InclusionMode) -> Self {
        Self {
            field: field.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            mode,
        }
    }

    /// 规范化后的比较值集合 (trim + 小写)
    pub fn normalized_values(&self) -> BTreeSet<String> {
        self.values.iter().map(|v| v.trim().to_lowercase()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_forbidden_case_fold() {
        let rule = ExclusionRule::unconditional("status", &[" Deleted ", "ARCHIVE"]);
        let set = rule.normalized_forbidden();
        assert!(set.contains("deleted"));
        assert!(set.contains("archive"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_normalized_inclusion_values() {
        let rule = InclusionRule::new("type", &["Active", " active "], InclusionMode::MustBeIn);
        // 规范化后去重
        assert_eq!(rule.normalized_values().len(), 1);
    }
}
