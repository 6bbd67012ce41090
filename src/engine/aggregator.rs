// ==========================================
// 月度绩效评优系统 - 月度汇总引擎
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 按文件分组求和
// ==========================================
// 职责: 逐文件按工号求指标合计, 汇入 (工号, 条线, 月份) 键值表
// 红线: 纯求和, 不做身份判断; 工号空白行在分组前剔除
// ==========================================

use crate::domain::employee::FilteredTable;
use crate::domain::metrics::MetricTable;
use std::collections::BTreeMap;
use tracing::debug;

/// 月度汇总引擎 (无状态)
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 单文件分组求和: 工号 → 指标合计
    ///
    /// 工号空白的行剔除; 指标缺失按 0 计入。
    pub fn aggregate_file(&self, table: &FilteredTable) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        for row in &table.rows {
            let id = row.employee_id.trim();
            if id.is_empty() {
                continue;
            }
            *sums.entry(id.to_string()).or_insert(0.0) += row.metric_value.unwrap_or(0.0);
        }
        debug!(
            file = %table.source_file,
            employees = sums.len(),
            "文件月度合计完成"
        );
        sums
    }

    /// 全量汇总: 全部文件 → (工号, 条线, 月份) 键值表
    ///
    /// 同一 (条线, 月份) 至多一个文件 (配置校验保证), 不存在键冲突。
    pub fn aggregate_all(&self, tables: &[FilteredTable]) -> MetricTable {
        let mut metrics = MetricTable::new();
        for table in tables {
            for (employee_id, sum) in self.aggregate_file(table) {
                metrics.insert(&employee_id, table.domain, table.period, sum);
            }
        }
        metrics
    }
}

impl Default for MonthlyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::employee::RawRow;
    use crate::domain::types::DomainKind;
    use std::collections::{BTreeSet, HashMap};

    fn row(id: &str, value: Option<f64>) -> RawRow {
        RawRow {
            employee_id: id.to_string(),
            territorial_unit: None,
            org_unit: None,
            client_id: None,
            display_name: None,
            metric_value: value,
            domain: DomainKind::Od,
            period: 1,
            source_file: "test.xlsx".to_string(),
            row_number: 0,
            extra: HashMap::new(),
        }
    }

    fn table(domain: DomainKind, period: u8, rows: Vec<RawRow>) -> FilteredTable {
        FilteredTable {
            domain,
            period,
            source_file: "test.xlsx".to_string(),
            label: "测试".to_string(),
            rows,
            available_fields: BTreeSet::new(),
        }
    }

    #[test]
    fn test_aggregate_file_grouped_sum() {
        let t = table(
            DomainKind::Od,
            1,
            vec![
                row("00000001", Some(10.0)),
                row("00000001", Some(5.0)),
                row("00000002", Some(3.0)),
                // 空工号与缺失指标
                row("", Some(100.0)),
                row("00000002", None),
            ],
        );

        let sums = MonthlyAggregator::new().aggregate_file(&t);
        assert_eq!(sums.len(), 2);
        assert_eq!(sums["00000001"], 15.0);
        assert_eq!(sums["00000002"], 3.0);
    }

    #[test]
    fn test_aggregate_all_keys_by_domain_and_period() {
        let tables = vec![
            table(DomainKind::Od, 1, vec![row("00000001", Some(1.0))]),
            table(DomainKind::Ra, 1, vec![row("00000001", Some(2.0))]),
            table(DomainKind::Od, 2, vec![row("00000001", Some(3.0))]),
        ];

        let metrics = MonthlyAggregator::new().aggregate_all(&tables);
        assert_eq!(metrics.get("00000001", DomainKind::Od, 1), Some(1.0));
        assert_eq!(metrics.get("00000001", DomainKind::Ra, 1), Some(2.0));
        assert_eq!(metrics.get("00000001", DomainKind::Od, 2), Some(3.0));
        // 缺失键按 0 查找
        assert_eq!(metrics.get_or_zero("00000001", DomainKind::Ps, 1), 0.0);
    }
}
