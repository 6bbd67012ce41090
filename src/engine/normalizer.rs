// ==========================================
// 月度绩效评优系统 - 归一化引擎
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 极差归一化与退化口径
// ==========================================
// 职责: 把员工单条线的派生指标序列映射到 [0,1]
// 红线: 退化序列 (单信息月/全零/全等) 走显式口径, 不走除法;
//       结果一律钳制在 [0,1]
// ==========================================

use crate::domain::types::Direction;
use serde::Serialize;

/// 极差视为零的阈值
const SPAN_EPSILON: f64 = 1e-12;

/// 归一化口径判定结果 (仅供观测)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizeOutcome {
    /// 常规极差归一化
    MinMax,
    /// 仅一个非零月: 该月 1.0, 其余 0.0
    SingleInformative,
    /// 全零序列: 统一 0.5
    AllZero,
    /// 非零但全等: 统一 0.5
    AllEqual,
}

/// 归一化引擎 (无状态)
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// 对单员工单条线的派生指标序列做极差归一化
    ///
    /// # 参数
    /// - `values`: 按月份升序的派生指标
    /// - `direction`: Max 越大越优 / Min 越小越优
    ///
    /// # 返回
    /// - 等长的 [0,1] 序列与口径判定
    pub fn normalize(&self, values: &[f64], direction: Direction) -> (Vec<f64>, NormalizeOutcome) {
        if values.is_empty() {
            return (Vec::new(), NormalizeOutcome::AllZero);
        }

        let informative = values.iter().filter(|v| **v != 0.0).count();

        // 至多一个信息月
        if informative == 1 {
            let normalized = values
                .iter()
                .map(|v| if *v != 0.0 { 1.0 } else { 0.0 })
                .collect();
            return (normalized, NormalizeOutcome::SingleInformative);
        }
        if informative == 0 {
            return (vec![0.5; values.len()], NormalizeOutcome::AllZero);
        }

        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = hi - lo;

        // 全等序列 (极差为零)
        if span.abs() < SPAN_EPSILON {
            return (vec![0.5; values.len()], NormalizeOutcome::AllEqual);
        }

        let normalized = values
            .iter()
            .map(|v| {
                let scaled = match direction {
                    Direction::Max => (v - lo) / span,
                    Direction::Min => (hi - v) / span,
                };
                scaled.clamp(0.0, 1.0)
            })
            .collect();
        (normalized, NormalizeOutcome::MinMax)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
