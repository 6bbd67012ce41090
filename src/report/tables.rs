// ==========================================
// 月度绩效评优系统 - 报表构建器
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 六张结果表
// ==========================================
// 职责: 把流程结果组装为六张列名稳定的结构化表格
// 红线: 列命名 "{条线} (M-{月份})" 是对外契约, 不得更改;
//       行序与列序确定 (同输入必得同输出)
// ==========================================

use crate::domain::metrics::MetricTable;
use crate::domain::types::DomainKind;
use crate::engine::orchestrator::PipelineResult;

// ==========================================
// ReportTable - 结构化表格
// ==========================================

/// 一张待输出的结构化表格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    /// 表名 (作为输出文件名的一部分)
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 数值格式化 (整数值不带小数尾巴)
fn fmt_value(value: f64) -> String {
    format!("{}", value)
}

/// 指标列名: "{条线} (M-{月份})"
fn metric_column(domain: DomainKind, period: u8) -> String {
    format!("{} (M-{})", domain.as_str(), period)
}

/// 员工身份表头 (四列固定前缀)
const IDENTITY_HEADERS: [&str; 4] = ["工号", "区域分部", "营业机构", "姓名"];

// ==========================================
// ReportBuilder - 报表构建器
// ==========================================

/// 报表构建器 (无状态)
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建全部六张结果表
    pub fn build_all(&self, result: &PipelineResult) -> Vec<ReportTable> {
        vec![
            self.build_filtered_rows(result),
            self.build_identity_sums(result),
            self.build_metric_table(result, &result.derived, "derived_metrics"),
            self.build_metric_table(result, &result.normalized, "normalized_metrics"),
            self.build_scores(result),
            self.build_best_month(result),
        ]
    }

    /// 表1: 过滤后数据行 (全部文件拼接)
    fn build_filtered_rows(&self, result: &PipelineResult) -> ReportTable {
        let headers = vec![
            "工号".to_string(),
            "区域分部".to_string(),
            "营业机构".to_string(),
            "客户编号".to_string(),
            "姓名".to_string(),
            "指标值".to_string(),
            "条线".to_string(),
            "月份".to_string(),
            "来源文件".to_string(),
        ];

        let mut rows = Vec::new();
        for table in &result.filtered_tables {
            for row in &table.rows {
                rows.push(vec![
                    row.employee_id.clone(),
                    row.territorial_unit.clone().unwrap_or_default(),
                    row.org_unit.clone().unwrap_or_default(),
                    row.client_id.clone().unwrap_or_default(),
                    row.display_name.clone().unwrap_or_default(),
                    row.metric_value.map(fmt_value).unwrap_or_default(),
                    table.domain.as_str().to_string(),
                    table.period.to_string(),
                    table.source_file.clone(),
                ]);
            }
        }

        ReportTable {
            name: "filtered_rows".to_string(),
            headers,
            rows,
        }
    }

    /// 身份四列 + 逐条线逐月指标列 的通用组装
    fn build_metric_table(
        &self,
        result: &PipelineResult,
        metrics: &MetricTable,
        name: &str,
    ) -> ReportTable {
        let mut headers: Vec<String> = IDENTITY_HEADERS.iter().map(|h| h.to_string()).collect();
        let mut columns: Vec<(DomainKind, u8)> = Vec::new();
        for domain in DomainKind::all() {
            if let Some(periods) = result.periods_by_domain.get(&domain) {
                for &period in periods {
                    headers.push(metric_column(domain, period));
                    columns.push((domain, period));
                }
            }
        }

        let rows = result
            .identities
            .values()
            .map(|identity| {
                let mut row = vec![
                    identity.employee_id.clone(),
                    identity.territorial_unit.clone(),
                    identity.org_unit.clone(),
                    identity.display_name.clone(),
                ];
                for &(domain, period) in &columns {
                    row.push(
                        metrics
                            .get(&identity.employee_id, domain, period)
                            .map(fmt_value)
                            .unwrap_or_default(),
                    );
                }
                row
            })
            .collect();

        ReportTable {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// 表2: 身份表与逐文件合计的连接
    fn build_identity_sums(&self, result: &PipelineResult) -> ReportTable {
        self.build_metric_table(result, &result.aggregates, "identities_sums")
    }

    /// 表5: 逐月评分、名次与最佳月份
    fn build_scores(&self, result: &PipelineResult) -> ReportTable {
        let all_periods = result.all_periods();

        let mut headers: Vec<String> = IDENTITY_HEADERS.iter().map(|h| h.to_string()).collect();
        for &period in &all_periods {
            headers.push(format!("评分 (M-{})", period));
        }
        for &period in &all_periods {
            headers.push(format!("名次 (M-{})", period));
        }
        headers.push("最佳月份".to_string());

        let rows = result
            .identities
            .values()
            .map(|identity| {
                let mut row = vec![
                    identity.employee_id.clone(),
                    identity.territorial_unit.clone(),
                    identity.org_unit.clone(),
                    identity.display_name.clone(),
                ];
                let entries = result.scores.get(&identity.employee_id);
                for &period in &all_periods {
                    let score = entries
                        .and_then(|e| e.iter().find(|s| s.period == period))
                        .map(|s| fmt_value(s.score));
                    row.push(score.unwrap_or_default());
                }
                for &period in &all_periods {
                    let rank = entries
                        .and_then(|e| e.iter().find(|s| s.period == period))
                        .map(|s| s.rank.to_string());
                    row.push(rank.unwrap_or_default());
                }
                row.push(
                    result
                        .best_months
                        .get(&identity.employee_id)
                        .map(|b| b.periods_label.clone())
                        .unwrap_or_default(),
                );
                row
            })
            .collect();

        ReportTable {
            name: "scores".to_string(),
            headers,
            rows,
        }
    }

    /// 表6: 最佳月份及该月派生指标
    fn build_best_month(&self, result: &PipelineResult) -> ReportTable {
        let mut headers: Vec<String> = IDENTITY_HEADERS.iter().map(|h| h.to_string()).collect();
        headers.push("最佳月份".to_string());
        for domain in DomainKind::all() {
            headers.push(format!("{} (最佳月)", domain.as_str()));
        }

        let rows = result
            .identities
            .values()
            .filter_map(|identity| {
                let best = result.best_months.get(&identity.employee_id)?;
                let mut row = vec![
                    identity.employee_id.clone(),
                    identity.territorial_unit.clone(),
                    identity.org_unit.clone(),
                    identity.display_name.clone(),
                    best.periods_label.clone(),
                ];
                for domain in DomainKind::all() {
                    row.push(
                        best.best_values
                            .get(domain)
                            .map(fmt_value)
                            .unwrap_or_default(),
                    );
                }
                Some(row)
            })
            .collect();

        ReportTable {
            name: "best_month".to_string(),
            headers,
            rows,
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::domain::employee::{FilteredTable, RawRow};
    use crate::engine::diagnostics::NoOpDiagnosticsSink;
    use crate::engine::orchestrator::PipelineOrchestrator;
    use std::collections::{BTreeMap, BTreeSet, HashMap};
    use std::sync::Arc;

    fn sample_result() -> PipelineResult {
        let row = |id: &str, period: u8, value: f64| RawRow {
            employee_id: id.to_string(),
            territorial_unit: Some("TU-01".to_string()),
            org_unit: Some("机构A".to_string()),
            client_id: None,
            display_name: Some("张三".to_string()),
            metric_value: Some(value),
            domain: DomainKind::Od,
            period,
            source_file: format!("M-{}_OD.xlsx", period),
            row_number: 0,
            extra: HashMap::new(),
        };
        let table = |period: u8, rows: Vec<RawRow>| FilteredTable {
            domain: DomainKind::Od,
            period,
            source_file: format!("M-{}_OD.xlsx", period),
            label: format!("OD {}月", period),
            rows,
            available_fields: ["employee_id", "territorial_unit", "org_unit", "display_name"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<String>>(),
        };

        let orchestrator = PipelineOrchestrator::new(
            Arc::new(ConfigManager::with_defaults()),
            Arc::new(NoOpDiagnosticsSink),
        );
        orchestrator
            .run_on_tables(
                vec![
                    table(1, vec![row("00000001", 1, 10.0)]),
                    table(2, vec![row("00000001", 2, 20.0)]),
                ],
                BTreeMap::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_build_all_six_tables() {
        let tables = ReportBuilder::new().build_all(&sample_result());
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "filtered_rows",
                "identities_sums",
                "derived_metrics",
                "normalized_metrics",
                "scores",
                "best_month"
            ]
        );
    }

    #[test]
    fn test_metric_column_naming_contract() {
        let tables = ReportBuilder::new().build_all(&sample_result());
        let sums = &tables[1];
        assert_eq!(
            sums.headers,
            vec!["工号", "区域分部", "营业机构", "姓名", "OD (M-1)", "OD (M-2)"]
        );
        assert_eq!(sums.rows[0][4], "10");
        assert_eq!(sums.rows[0][5], "20");
    }

    #[test]
    fn test_scores_table_has_best_month_label() {
        let tables = ReportBuilder::new().build_all(&sample_result());
        let scores = &tables[4];
        let best_idx = scores
            .headers
            .iter()
            .position(|h| h == "最佳月份")
            .unwrap();
        assert_eq!(scores.rows[0][best_idx], "2");
    }

    #[test]
    fn test_build_all_deterministic() {
        let result = sample_result();
        let builder = ReportBuilder::new();
        assert_eq!(builder.build_all(&result), builder.build_all(&result));
    }
}
