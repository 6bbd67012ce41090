// ==========================================
// 月度绩效评优系统 - 员工身份解析引擎
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 身份归并与优先级
// ==========================================
// 职责: 跨文件归并员工身份, 文件内按指标合计择优身份组
// 红线: 已写入身份仅在优先级键严格更小时覆盖;
//       工号为空或非纯数字的行静默跳过 (计数不报错)
// ==========================================

use crate::domain::employee::{EmployeeIdentity, FilteredTable};
use crate::domain::types::priority_key;
use crate::engine::diagnostics::DiagnosticsSink;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ==========================================
// ResolveStats - 解析统计
// ==========================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveStats {
    /// 缺少工号列而整体跳过的文件数
    pub tables_skipped: usize,
    /// 工号非法而跳过的行数
    pub rows_skipped_bad_id: usize,
    /// 低优先级文件覆盖高键值身份的次数
    pub overwrites: usize,
    pub identities: usize,
}

/// 文件内身份候选组: (区域分部, 营业机构, 姓名) → 指标合计
struct CandidateGroup {
    territorial_unit: String,
    org_unit: String,
    display_name: String,
    metric_sum: f64,
}

// ==========================================
// IdentityResolver - 身份解析引擎
// ==========================================

/// 身份解析引擎 (无状态)
pub struct IdentityResolver;

impl IdentityResolver {
    pub fn new() -> Self {
        Self
    }

    /// 跨全部文件解析员工身份表
    ///
    /// 文件按调用方给定顺序处理; 同一工号以优先级键
    /// (条线序 × 月份倒序) 严格更小者为准。
    ///
    /// # 返回
    /// - 工号 → 身份 (BTreeMap, 遍历顺序确定)
    pub fn resolve(
        &self,
        tables: &[FilteredTable],
        sink: &dyn DiagnosticsSink,
    ) -> (BTreeMap<String, EmployeeIdentity>, ResolveStats) {
        let mut identities: BTreeMap<String, EmployeeIdentity> = BTreeMap::new();
        let mut stats = ResolveStats::default();

        for table in tables {
            if !table.has_field("employee_id") {
                warn!(file = %table.source_file, "文件缺少工号列, 不贡献身份");
                stats.tables_skipped += 1;
                continue;
            }

            let key = priority_key(table.domain, table.period);
            for (employee_id, group) in self.best_groups(table, &mut stats) {
                let is_overwrite = match identities.get(&employee_id) {
                    // 已有身份不劣于本文件, 保留
                    Some(existing) if existing.priority_rank <= key => continue,
                    Some(_) => true,
                    None => false,
                };
                if is_overwrite {
                    debug!(
                        employee_id = %employee_id,
                        file = %table.source_file,
                        "更高优先级文件覆盖员工身份"
                    );
                    sink.record_identity_conflict(&employee_id);
                    stats.overwrites += 1;
                }
                identities.insert(
                    employee_id.clone(),
                    EmployeeIdentity {
                        employee_id,
                        territorial_unit: group.territorial_unit,
                        org_unit: group.org_unit,
                        display_name: group.display_name,
                        resolved_from_domain: table.domain,
                        resolved_from_period: table.period,
                        priority_rank: key,
                    },
                );
            }
        }

        stats.identities = identities.len();
        (identities, stats)
    }

    /// 文件内去重: 同工号多个身份组时取指标合计最大的组
    ///
    /// 组按首次出现顺序枚举, 合计并列时保留先出现的组
    /// (严格大于才换组)。
    fn best_groups(
        &self,
        table: &FilteredTable,
        stats: &mut ResolveStats,
    ) -> Vec<(String, CandidateGroup)> {
        // 工号 → (组键 → 组), 组内保持插入顺序
        let mut by_employee: Vec<(String, Vec<CandidateGroup>)> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();

        for row in &table.rows {
            let id = row.employee_id.trim();
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                stats.rows_skipped_bad_id += 1;
                continue;
            }

            let territorial_unit = row.territorial_unit.clone().unwrap_or_default();
            let org_unit = row.org_unit.clone().unwrap_or_default();
            let display_name = row.display_name.clone().unwrap_or_default();
            let value = row.metric_value.unwrap_or(0.0);

            let slot = *index.entry(id.to_string()).or_insert_with(|| {
                by_employee.push((id.to_string(), Vec::new()));
                by_employee.len() - 1
            });
            let groups = &mut by_employee[slot].1;

            match groups.iter_mut().find(|g| {
                g.territorial_unit == territorial_unit
                    && g.org_unit == org_unit
                    && g.display_name == display_name
            }) {
                Some(group) => group.metric_sum += value,
                None => groups.push(CandidateGroup {
                    territorial_unit,
                    org_unit,
                    display_name,
                    metric_sum: value,
                }),
            }
        }

        by_employee
            .into_iter()
            .filter_map(|(id, groups)| {
                let mut iter = groups.into_iter();
                let first = iter.next()?;
                // 严格大于才换组, 并列保留先出现者
                let best = iter.fold(first, |best, candidate| {
                    if candidate.metric_sum > best.metric_sum {
                        candidate
                    } else {
                        best
                    }
                });
                Some((id, best))
            })
            .collect()
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}
