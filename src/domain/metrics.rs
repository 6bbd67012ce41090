// ==========================================
// 月度绩效评优系统 - 指标表结构
// ==========================================
// 职责: 定义月度合计/派生指标/归一化指标的键值表与评分结果
// 红线: 各阶段产出表只写一次, 后续阶段只读不改
// ==========================================

use crate::domain::types::DomainKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// MetricTable - (工号, 条线, 月份) → 数值
// ==========================================

/// 指标键值表
///
/// 月度合计表、派生指标表与归一化表共用此结构。
/// 使用 BTreeMap 保证遍历顺序确定 (同输入必得同输出)。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    values: BTreeMap<(String, DomainKind, u8), f64>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个键值 (同键重复写入视为覆盖, 调用方保证键不重叠)
    pub fn insert(&mut self, employee_id: &str, domain: DomainKind, period: u8, value: f64) {
        self.values
            .insert((employee_id.to_string(), domain, period), value);
    }

    /// 查询键值 (缺失返回 None)
    pub fn get(&self, employee_id: &str, domain: DomainKind, period: u8) -> Option<f64> {
        self.values
            .get(&(employee_id.to_string(), domain, period))
            .copied()
    }

    /// 查询键值, 缺失按 0 处理 (月度合计查找口径)
    pub fn get_or_zero(&self, employee_id: &str, domain: DomainKind, period: u8) -> f64 {
        self.get(employee_id, domain, period).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(String, DomainKind, u8), &f64)> {
        self.values.iter()
    }
}

// ==========================================
// DerivedTriple - 单月三条线派生指标
// ==========================================

/// 某员工某月份的 (OD, RA, PS) 派生指标三元组
///
/// 条线当月无文件时该分量为 None。用于最佳月份并列坍缩比较。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedTriple {
    pub od: Option<f64>,
    pub ra: Option<f64>,
    pub ps: Option<f64>,
}

impl DerivedTriple {
    pub fn get(&self, domain: DomainKind) -> Option<f64> {
        match domain {
            DomainKind::Od => self.od,
            DomainKind::Ra => self.ra,
            DomainKind::Ps => self.ps,
        }
    }

    /// 数值近似相等判断
    ///
    /// 缺失模式必须一致; 非缺失分量的差值不超过 `tolerance`。
    pub fn approx_eq(&self, other: &DerivedTriple, tolerance: f64) -> bool {
        for domain in DomainKind::all() {
            match (self.get(domain), other.get(domain)) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    if (a - b).abs() > tolerance {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

// ==========================================
// ScoreEntry - 单月加权评分
// ==========================================

/// 某员工某月份的加权评分与名次
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub period: u8,
    pub score: f64,
    /// 并列共享名次 (1 为最佳)
    pub rank: u32,
}

// ==========================================
// BestMonthResult - 最佳月份结果
// ==========================================

/// 某员工的最佳月份选择结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMonthResult {
    pub employee_id: String,
    /// 全部获胜月份 (升序, 并列坍缩后)
    pub winning_periods: Vec<u8>,
    /// 逗号拼接的报表标签 (如 "3" 或 "3,7")
    pub periods_label: String,
    /// 首个获胜月份
    pub best_period: u8,
    /// 首个获胜月份的派生指标三元组
    pub best_values: DerivedTriple,
}

impl BestMonthResult {
    pub fn new(employee_id: &str, winning_periods: Vec<u8>, best_values: DerivedTriple) -> Self {
        let periods_label = winning_periods
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let best_period = winning_periods.first().copied().unwrap_or(0);
        Self {
            employee_id: employee_id.to_string(),
            winning_periods,
            periods_label,
            best_period,
            best_values,
        }
    }
}
