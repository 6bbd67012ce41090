// ==========================================
// 月度绩效评优系统 - 行过滤引擎
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 行过滤规则
// ==========================================
// 职责: 按排除规则与包含规则裁剪单文件数据行
// 红线: 规则顺序敏感 (排除规则逐条作用于前一条的存留集);
//       引用缺失列的规则跳过并告警, 不中断处理
// ==========================================

use crate::config::rules::{ExclusionRule, InclusionMode, InclusionRule};
use crate::domain::employee::RawRow;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

// ==========================================
// FilterStats - 过滤统计
// ==========================================

/// 单文件过滤统计 (仅供观测, 下游不依赖)
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterStats {
    pub rows_in: usize,
    pub rows_kept: usize,
    /// 规则字段 → 删除行数
    pub dropped_by_rule: BTreeMap<String, usize>,
    /// 因列缺失被跳过的规则字段
    pub skipped_rules: Vec<String>,
}

// ==========================================
// RuleFilterEngine - 行过滤引擎
// ==========================================

/// 行过滤引擎 (无状态)
pub struct RuleFilterEngine;

impl RuleFilterEngine {
    pub fn new() -> Self {
        Self
    }

    /// 应用全部过滤规则
    ///
    /// # 参数
    /// - `rows`: 映射后的数据行
    /// - `available_fields`: 本文件实际可用的别名集合
    ///
    /// # 返回
    /// - 存留行与过滤统计
    pub fn apply(
        &self,
        rows: Vec<RawRow>,
        exclusions: &[ExclusionRule],
        inclusions: &[InclusionRule],
        available_fields: &BTreeSet<String>,
    ) -> (Vec<RawRow>, FilterStats) {
        let mut stats = FilterStats {
            rows_in: rows.len(),
            ..FilterStats::default()
        };

        let mut current = rows;
        for rule in exclusions {
            if !rule.active {
                debug!(field = %rule.field, "排除规则未启用, 跳过");
                continue;
            }
            if !available_fields.contains(&rule.field) {
                warn!(field = %rule.field, "排除规则引用的列在本文件缺失, 规则跳过");
                stats.skipped_rules.push(rule.field.clone());
                continue;
            }
            current = Self::apply_exclusion(current, rule, &mut stats);
        }

        for rule in inclusions {
            if !available_fields.contains(&rule.field) {
                warn!(field = %rule.field, "包含规则引用的列在本文件缺失, 规则跳过");
                stats.skipped_rules.push(rule.field.clone());
                continue;
            }
            current = Self::apply_inclusion(current, rule, &mut stats);
        }

        stats.rows_kept = current.len();
        (current, stats)
    }

    /// 规范化字段值 (trim + 小写), 缺失为 None
    fn normalized_value(row: &RawRow, field: &str) -> Option<String> {
        row.field_value(field).map(|v| v.trim().to_lowercase())
    }

    /// 应用单条排除规则
    ///
    /// 豁免集合以本规则作用前的存留集为准: 同客户/同工号存在
    /// 持有未命中值的行才豁免; 字段值缺失的行不构成豁免依据。
    fn apply_exclusion(
        rows: Vec<RawRow>,
        rule: &ExclusionRule,
        stats: &mut FilterStats,
    ) -> Vec<RawRow> {
        let forbidden = rule.normalized_forbidden();

        let is_hit = |row: &RawRow| -> bool {
            Self::normalized_value(row, &rule.field)
                .map(|v| forbidden.contains(&v))
                .unwrap_or(false)
        };

        // 预计算豁免键集合 (仅统计字段值存在且未命中的行)
        let mut exempt_clients: BTreeSet<String> = BTreeSet::new();
        let mut exempt_employees: BTreeSet<String> = BTreeSet::new();
        if rule.exempt_if_other_rows_by_client || rule.exempt_if_other_rows_by_employee {
            for row in &rows {
                match Self::normalized_value(row, &rule.field) {
                    Some(value) if !forbidden.contains(&value) => {}
                    _ => continue,
                }
                if rule.exempt_if_other_rows_by_client {
                    if let Some(client) = &row.client_id {
                        exempt_clients.insert(client.clone());
                    }
                }
                if rule.exempt_if_other_rows_by_employee && !row.employee_id.is_empty() {
                    exempt_employees.insert(row.employee_id.clone());
                }
            }
        }

        let mut dropped = 0usize;
        let kept: Vec<RawRow> = rows
            .into_iter()
            .filter(|row| {
                if !is_hit(row) {
                    return true;
                }
                // 任一豁免成立即保留 (或逻辑)
                let by_client = rule.exempt_if_other_rows_by_client
                    && row
                        .client_id
                        .as_ref()
                        .map(|c| exempt_clients.contains(c))
                        .unwrap_or(false);
                let by_employee = rule.exempt_if_other_rows_by_employee
                    && !row.employee_id.is_empty()
                    && exempt_employees.contains(&row.employee_id);
                if by_client || by_employee {
                    return true;
                }
                dropped += 1;
                false
            })
            .collect();

        if dropped > 0 {
            debug!(field = %rule.field, dropped, "排除规则生效");
        }
        *stats.dropped_by_rule.entry(rule.field.clone()).or_insert(0) += dropped;
        kept
    }

    /// 应用单条包含规则
    ///
    /// 字段值缺失的行无法通过任一口径的判定, 一律删除。
    fn apply_inclusion(
        rows: Vec<RawRow>,
        rule: &InclusionRule,
        stats: &mut FilterStats,
    ) -> Vec<RawRow> {
        let values = rule.normalized_values();

        let mut dropped = 0usize;
        let kept: Vec<RawRow> = rows
            .into_iter()
            .filter(|row| {
                let pass = match Self::normalized_value(row, &rule.field) {
                    None => false,
                    Some(v) => match rule.mode {
                        InclusionMode::MustBeIn => values.contains(&v),
                        InclusionMode::MustNotBeIn => !values.contains(&v),
                    },
                };
                if !pass {
                    dropped += 1;
                }
                pass
            })
            .collect();

        if dropped > 0 {
            debug!(field = %rule.field, dropped, "包含规则生效");
        }
        *stats.dropped_by_rule.entry(rule.field.clone()).or_insert(0) += dropped;
        kept
    }
}

impl Default for RuleFilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DomainKind;
    use std::collections::HashMap;

    fn row(employee_id: &str, client_id: Option<&str>, status: &str) -> RawRow {
        let mut extra = HashMap::new();
        if !status.is_empty() {
            extra.insert("status".to_string(), status.to_string());
        }
        RawRow {
            employee_id: employee_id.to_string(),
            territorial_unit: None,
            org_unit: None,
            client_id: client_id.map(|c| c.to_string()),
            display_name: None,
            metric_value: Some(1.0),
            domain: DomainKind::Od,
            period: 1,
            source_file: "test.xlsx".to_string(),
            row_number: 0,
            extra,
        }
    }

    fn fields(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_exclusion_removes_forbidden_rows() {
        let rows = vec![
            row("00000001", None, "Deleted"),
            row("00000002", None, "Active"),
        ];
        let rule = ExclusionRule::unconditional("status", &["deleted"]);

        let (kept, stats) = RuleFilterEngine::new().apply(
            rows,
            &[rule],
            &[],
            &fields(&["employee_id", "status"]),
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].employee_id, "00000002");
        assert_eq!(stats.dropped_by_rule.get("status"), Some(&1));
    }

    #[test]
    fn test_exclusion_inactive_rule_ignored() {
        let rows = vec![row("00000001", None, "Deleted")];
        let mut rule = ExclusionRule::unconditional("status", &["deleted"]);
        rule.active = false;

        let (kept, _) = RuleFilterEngine::new().apply(
            rows,
            &[rule],
            &[],
            &fields(&["employee_id", "status"]),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_exclusion_missing_field_skips_rule() {
        let rows = vec![row("00000001", None, "Deleted")];
        let rule = ExclusionRule::unconditional("status", &["deleted"]);

        // 本文件没有 status 列
        let (kept, stats) =
            RuleFilterEngine::new().apply(rows, &[rule], &[], &fields(&["employee_id"]));

        assert_eq!(kept.len(), 1);
        assert_eq!(stats.skipped_rules, vec!["status".to_string()]);
    }

    #[test]
    fn test_exclusion_client_exemption_keeps_hit_row() {
        // 客户 C1 另有未命中行, 命中行豁免; 客户 C2 无未命中行, 删除
        let rows = vec![
            row("00000001", Some("C1"), "Deleted"),
            row("00000002", Some("C1"), "Active"),
            row("00000003", Some("C2"), "Deleted"),
        ];
        let mut rule = ExclusionRule::unconditional("status", &["deleted"]);
        rule.exempt_if_other_rows_by_client = true;

        let (kept, _) = RuleFilterEngine::new().apply(
            rows,
            &[rule],
            &[],
            &fields(&["employee_id", "client_id", "status"]),
        );

        let ids: Vec<&str> = kept.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["00000001", "00000002"]);
    }

    #[test]
    fn test_exclusion_blank_value_row_does_not_exempt() {
        // 同客户的另一行字段值缺失: 不构成豁免依据, 命中行仍删除
        let rows = vec![
            row("00000001", Some("C1"), "Deleted"),
            row("00000002", Some("C1"), ""),
        ];
        let mut rule = ExclusionRule::unconditional("status", &["deleted"]);
        rule.exempt_if_other_rows_by_client = true;

        let (kept, _) = RuleFilterEngine::new().apply(
            rows,
            &[rule],
            &[],
            &fields(&["employee_id", "client_id", "status"]),
        );

        let ids: Vec<&str> = kept.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["00000002"]);
    }

    #[test]
    fn test_exclusion_employee_exemption_or_logic() {
        // 客户豁免不成立, 但同工号存在未命中行 → 保留 (或逻辑)
        let rows = vec![
            row("00000001", Some("C1"), "Deleted"),
            row("00000001", Some("C9"), "Active"),
        ];
        let mut rule = ExclusionRule::unconditional("status", &["deleted"]);
        rule.exempt_if_other_rows_by_client = true;
        rule.exempt_if_other_rows_by_employee = true;

        let (kept, _) = RuleFilterEngine::new().apply(
            rows,
            &[rule],
            &[],
            &fields(&["employee_id", "client_id", "status"]),
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_inclusion_and_semantics() {
        let mut r1 = row("00000001", None, "Active");
        r1.extra.insert("type".to_string(), "A".to_string());
        let mut r2 = row("00000002", None, "Active");
        r2.extra.insert("type".to_string(), "B".to_string());
        let mut r3 = row("00000003", None, "Closed");
        r3.extra.insert("type".to_string(), "A".to_string());

        let rules = vec![
            InclusionRule::new("status", &["active"], InclusionMode::MustBeIn),
            InclusionRule::new("type", &["B"], InclusionMode::MustNotBeIn),
        ];

        let (kept, _) = RuleFilterEngine::new().apply(
            vec![r1, r2, r3],
            &[],
            &rules,
            &fields(&["employee_id", "status", "type"]),
        );

        // 必须同时通过两条规则
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].employee_id, "00000001");
    }

    #[test]
    fn test_inclusion_missing_value_fails_both_modes() {
        let make_rows = || vec![row("00000001", None, ""), row("00000002", None, "Active")];

        // must_be_in: 缺失值不通过
        let rule = InclusionRule::new("status", &["active"], InclusionMode::MustBeIn);
        let (kept, _) = RuleFilterEngine::new().apply(
            make_rows(),
            &[],
            &[rule],
            &fields(&["employee_id", "status"]),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].employee_id, "00000002");

        // must_not_be_in: 缺失值同样不通过
        let rule = InclusionRule::new("status", &["closed"], InclusionMode::MustNotBeIn);
        let (kept, _) = RuleFilterEngine::new().apply(
            make_rows(),
            &[],
            &[rule],
            &fields(&["employee_id", "status"]),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].employee_id, "00000002");
    }
}
