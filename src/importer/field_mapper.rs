// ==========================================
// 月度绩效评优系统 - 字段映射器
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 列映射与标识符规范化
// 职责: 源列名 → 标准别名, 标识符定宽补零, 指标值容错解析
// 红线: 单行解析失败不中断整文件, 记录后按缺失处理
// ==========================================

use crate::config::ColumnMap;
use crate::domain::employee::RawRow;
use crate::domain::types::DomainKind;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// 工号定宽 (数字工号左补零至此宽度)
pub const EMPLOYEE_ID_WIDTH: usize = 8;
/// 客户编号定宽
pub const CLIENT_ID_WIDTH: usize = 12;

/// 标识符规范化: 去空格, 纯数字左补零至定宽
///
/// 非纯数字的标识符只去空格, 原样保留。
pub fn normalize_identifier(raw: &str, width: usize) -> String {
    let trimmed = raw.trim();
    // Excel 常把工号读成 "1234.0"
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", trimmed, width = width)
    } else {
        trimmed.to_string()
    }
}

/// 指标值容错解析: 去空格与不间断空格, 逗号小数点折算
///
/// # 返回
/// - None: 空值或无法解析为数值
pub fn parse_metric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

// ==========================================
// FieldMapper - 字段映射器
// ==========================================

pub struct FieldMapper {
    /// 别名 → 源列名
    columns: Vec<ColumnMap>,
}

impl FieldMapper {
    pub fn new(columns: &[ColumnMap]) -> Self {
        Self {
            columns: columns.to_vec(),
        }
    }

    /// 把解析器产出的原始记录映射为 RawRow 列表
    ///
    /// # 返回
    /// - 映射后的行
    /// - 本文件实际可用的别名集合 (源列在表头中出现)
    pub fn map_table(
        &self,
        records: &[HashMap<String, String>],
        domain: DomainKind,
        period: u8,
        source_file: &str,
    ) -> (Vec<RawRow>, BTreeSet<String>) {
        // 表头以全文件键并集为准 (解析器保证同文件表头一致)
        let mut present_columns: BTreeSet<&str> = BTreeSet::new();
        for record in records {
            for key in record.keys() {
                present_columns.insert(key.as_str());
            }
        }

        let mut available_fields = BTreeSet::new();
        for map in &self.columns {
            if present_columns.contains(map.source.as_str()) {
                available_fields.insert(map.alias.clone());
            } else {
                debug!(
                    file = %source_file,
                    alias = %map.alias,
                    source = %map.source,
                    "源列缺失, 该别名在本文件不可用"
                );
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let value_of = |alias: &str| -> Option<&str> {
                self.columns
                    .iter()
                    .find(|m| m.alias == alias)
                    .and_then(|m| record.get(&m.source))
                    .map(|s| s.as_str())
                    .filter(|s| !s.trim().is_empty())
            };

            let employee_id = value_of("employee_id")
                .map(|v| normalize_identifier(v, EMPLOYEE_ID_WIDTH))
                .unwrap_or_default();
            let client_id = value_of("client_id")
                .map(|v| normalize_identifier(v, CLIENT_ID_WIDTH));
            let metric_value = value_of("metric_value").and_then(parse_metric);

            let mut extra = HashMap::new();
            for map in &self.columns {
                let standard = matches!(
                    map.alias.as_str(),
                    "employee_id"
                        | "territorial_unit"
                        | "org_unit"
                        | "client_id"
                        | "display_name"
                        | "metric_value"
                );
                if standard {
                    continue;
                }
                if let Some(value) = record.get(&map.source) {
                    extra.insert(map.alias.clone(), value.clone());
                }
            }

            rows.push(RawRow {
                employee_id,
                territorial_unit: value_of("territorial_unit").map(|v| v.trim().to_string()),
                org_unit: value_of("org_unit").map(|v| v.trim().to_string()),
                client_id,
                display_name: value_of("display_name").map(|v| v.trim().to_string()),
                metric_value,
                domain,
                period,
                source_file: source_file.to_string(),
                row_number: idx + 1,
                extra,
            });
        }

        (rows, available_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_columns() -> Vec<ColumnMap> {
        vec![
            ColumnMap::new("employee_id", "Employee ID"),
            ColumnMap::new("territorial_unit", "TB Short"),
            ColumnMap::new("client_id", "INN"),
            ColumnMap::new("metric_value", "Fact"),
            ColumnMap::new("status", "Status"),
        ]
    }

    fn record(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_identifier_pads_digits() {
        assert_eq!(normalize_identifier(" 1234 ", 8), "00001234");
        assert_eq!(normalize_identifier("1234.0", 8), "00001234");
        // 非纯数字原样保留
        assert_eq!(normalize_identifier("AB-12", 8), "AB-12");
        assert_eq!(normalize_identifier("", 8), "");
    }

    #[test]
    fn test_parse_metric_tolerant() {
        assert_eq!(parse_metric("1 234,5"), Some(1234.5));
        assert_eq!(parse_metric("\u{a0}10.0"), Some(10.0));
        assert_eq!(parse_metric("-3"), Some(-3.0));
        assert_eq!(parse_metric("abc"), None);
        assert_eq!(parse_metric(""), None);
    }

    #[test]
    fn test_map_table_standard_and_extra() {
        let mapper = FieldMapper::new(&standard_columns());
        let records = vec![record(&[
            ("Employee ID", "42"),
            ("TB Short", "TU-01"),
            ("INN", "99"),
            ("Fact", "2,5"),
            ("Status", "Active"),
        ])];

        let (rows, fields) = mapper.map_table(&records, DomainKind::Od, 3, "M-3_OD.xlsx");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "00000042");
        assert_eq!(rows[0].client_id.as_deref(), Some("000000000099"));
        assert_eq!(rows[0].metric_value, Some(2.5));
        assert_eq!(rows[0].extra.get("status"), Some(&"Active".to_string()));
        assert!(fields.contains("status"));
    }

    #[test]
    fn test_map_table_missing_source_column() {
        let mapper = FieldMapper::new(&standard_columns());
        let records = vec![record(&[("Employee ID", "42"), ("Fact", "1.0")])];

        let (rows, fields) = mapper.map_table(&records, DomainKind::Ra, 1, "M-1_RA.xlsx");

        assert!(!fields.contains("territorial_unit"));
        assert!(fields.contains("employee_id"));
        assert_eq!(rows[0].territorial_unit, None);
    }

    #[test]
    fn test_map_table_unparseable_metric_is_none() {
        let mapper = FieldMapper::new(&standard_columns());
        let records = vec![record(&[("Employee ID", "42"), ("Fact", "n/a")])];

        let (rows, _) = mapper.map_table(&records, DomainKind::Ps, 2, "M-2_PS.xlsx");
        assert_eq!(rows[0].metric_value, None);
    }
}
