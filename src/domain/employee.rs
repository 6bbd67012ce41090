// ==========================================
// 月度绩效评优系统 - 员工实体定义
// ==========================================
// 职责: 定义过滤后数据行与员工身份实体
// 红线: RawRow 由规则过滤器产出后不可变; 身份一旦写入不再覆盖
// (除非新键严格更优, 见 engine/identity_resolver)
// ==========================================

use crate::domain::types::DomainKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// RawRow - 映射后的单条数据行
// ==========================================

/// 一条来源文件记录 (列名已映射为标准别名)
///
/// 标准字段之外被映射的列保存在 `extra` 中, 供过滤规则按别名取值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRow {
    /// 员工工号 (定宽补零后; 可能为空串, 下游各自跳过)
    pub employee_id: String,
    /// 区域分部
    pub territorial_unit: Option<String>,
    /// 营业机构
    pub org_unit: Option<String>,
    /// 客户编号 (定宽补零后)
    pub client_id: Option<String>,
    /// 姓名
    pub display_name: Option<String>,
    /// 指标值 (无法解析为数值时为 None)
    pub metric_value: Option<f64>,

    // ===== 来源信息 =====
    /// 业务条线
    pub domain: DomainKind,
    /// 月份 (1-12)
    pub period: u8,
    /// 来源文件名
    pub source_file: String,
    /// 数据行号 (自 1 起, 不含表头)
    pub row_number: usize,

    /// 标准字段之外的映射列 (别名 → 原值)
    pub extra: HashMap<String, String>,
}

impl RawRow {
    /// 按别名取字段值 (空串视为缺失)
    ///
    /// # 参数
    /// - `field`: 映射后的别名 (如 "territorial_unit", "status")
    pub fn field_value(&self, field: &str) -> Option<&str> {
        let value = match field {
            "employee_id" => Some(self.employee_id.as_str()),
            "territorial_unit" => self.territorial_unit.as_deref(),
            "org_unit" => self.org_unit.as_deref(),
            "client_id" => self.client_id.as_deref(),
            "display_name" => self.display_name.as_deref(),
            _ => self.extra.get(field).map(|s| s.as_str()),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

// ==========================================
// FilteredTable - 单文件过滤后表格
// ==========================================

/// 一个来源文件经映射与规则过滤后的全部行
#[derive(Debug, Clone)]
pub struct FilteredTable {
    pub domain: DomainKind,
    pub period: u8,
    pub source_file: String,
    /// 日志用标签 (如 "OD 1月")
    pub label: String,
    pub rows: Vec<RawRow>,
    /// 本文件实际可用的别名集合 (源列缺失的别名不在其中)
    pub available_fields: BTreeSet<String>,
}

impl FilteredTable {
    pub fn has_field(&self, field: &str) -> bool {
        self.available_fields.contains(field)
    }
}

// ==========================================
// EmployeeIdentity - 员工身份实体
// ==========================================

/// 全局唯一的员工身份记录
///
/// 由身份解析引擎按优先级键首次写入, 之后仅在严格更优时覆盖。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeIdentity {
    pub employee_id: String,
    pub territorial_unit: String,
    pub org_unit: String,
    pub display_name: String,
    /// 身份来源条线
    pub resolved_from_domain: DomainKind,
    /// 身份来源月份
    pub resolved_from_period: u8,
    /// 解析时的优先级键 (越小越优)
    pub priority_rank: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> RawRow {
        let mut extra = HashMap::new();
        extra.insert("status".to_string(), "Active".to_string());
        extra.insert("blank".to_string(), "   ".to_string());
        RawRow {
            employee_id: "00001234".to_string(),
            territorial_unit: Some("TU-01".to_string()),
            org_unit: None,
            client_id: Some("000000000077".to_string()),
            display_name: Some("张三".to_string()),
            metric_value: Some(10.5),
            domain: DomainKind::Od,
            period: 3,
            source_file: "M-3_OD.xlsx".to_string(),
            row_number: 1,
            extra,
        }
    }

    #[test]
    fn test_field_value_standard_fields() {
        let row = sample_row();
        assert_eq!(row.field_value("employee_id"), Some("00001234"));
        assert_eq!(row.field_value("territorial_unit"), Some("TU-01"));
        assert_eq!(row.field_value("org_unit"), None);
    }

    #[test]
    fn test_field_value_extra_and_blank() {
        let row = sample_row();
        assert_eq!(row.field_value("status"), Some("Active"));
        // 空白值视为缺失
        assert_eq!(row.field_value("blank"), None);
        assert_eq!(row.field_value("unknown"), None);
    }
}
