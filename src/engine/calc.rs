// ==========================================
// 月度绩效评优系统 - 派生指标计算引擎
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 三种计算口径
// ==========================================
// 职责: 把员工单条线的月度合计序列换算为派生指标序列
// 红线: 策略与边界口径按文件配置逐位生效;
//       前置月份缺位按 0 参与公式, 不报错
// ==========================================

use crate::config::manager::CalcSettings;
use crate::domain::types::{CalcPolicy, FirstPeriodMode, SecondDiffEdgeMode};

/// 派生指标计算引擎 (无状态)
pub struct CalcEngine;

impl CalcEngine {
    pub fn new() -> Self {
        Self
    }

    /// 按逐位策略换算序列
    ///
    /// # 参数
    /// - `values`: 按月份升序排列的月度合计 (缺位月份已补 0)
    /// - `settings`: 与 `values` 等长的逐位计算配置 (逐文件解析而来)
    ///
    /// # 返回
    /// - 与输入等长的派生指标序列
    pub fn derive_sequence(&self, values: &[f64], settings: &[CalcSettings]) -> Vec<f64> {
        debug_assert_eq!(values.len(), settings.len());

        values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.derive_at(values, i, v, &settings[i]))
            .collect()
    }

    /// 全序列同一策略的简便入口
    pub fn derive_uniform(&self, values: &[f64], settings: &CalcSettings) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.derive_at(values, i, v, settings))
            .collect()
    }

    fn derive_at(&self, values: &[f64], i: usize, v: f64, settings: &CalcSettings) -> f64 {
        match settings.policy {
            CalcPolicy::AsIs => v,

            CalcPolicy::TwoMonthDelta => {
                if i == 0 {
                    match settings.first_period_mode {
                        FirstPeriodMode::SelfValue => v,
                        FirstPeriodMode::Zero => 0.0,
                    }
                } else {
                    v - values[i - 1]
                }
            }

            CalcPolicy::ThreePeriodSecondDiff => match i {
                0 => match settings.second_diff_edge_mode {
                    SecondDiffEdgeMode::SelfThenDiff => v,
                    _ => 0.0,
                },
                1 => match settings.second_diff_edge_mode {
                    SecondDiffEdgeMode::ZeroBoth => 0.0,
                    _ => v - values[0],
                },
                _ => v - 2.0 * values[i - 1] + values[i - 2],
            },
        }
    }
}

impl Default for CalcEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(
        policy: CalcPolicy,
        first: FirstPeriodMode,
        edge: SecondDiffEdgeMode,
    ) -> CalcSettings {
        CalcSettings {
            policy,
            first_period_mode: first,
            second_diff_edge_mode: edge,
        }
    }

    #[test]
    fn test_as_is_copies_values() {
        let engine = CalcEngine::new();
        let s = settings(
            CalcPolicy::AsIs,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::DiffSecond,
        );
        assert_eq!(engine.derive_uniform(&[10.0, 15.0, 7.0], &s), vec![10.0, 15.0, 7.0]);
    }

    #[test]
    fn test_two_month_delta_self_first() {
        let engine = CalcEngine::new();
        let s = settings(
            CalcPolicy::TwoMonthDelta,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::DiffSecond,
        );
        assert_eq!(engine.derive_uniform(&[10.0, 15.0, 7.0], &s), vec![10.0, 5.0, -8.0]);
    }

    #[test]
    fn test_two_month_delta_zero_first() {
        let engine = CalcEngine::new();
        let s = settings(
            CalcPolicy::TwoMonthDelta,
            FirstPeriodMode::Zero,
            SecondDiffEdgeMode::DiffSecond,
        );
        assert_eq!(engine.derive_uniform(&[10.0, 15.0], &s), vec![0.0, 5.0]);
    }

    #[test]
    fn test_second_diff_self_then_diff() {
        let engine = CalcEngine::new();
        let s = settings(
            CalcPolicy::ThreePeriodSecondDiff,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::SelfThenDiff,
        );
        // 首期取自身, 次期一阶差分, 之后二阶差分
        assert_eq!(engine.derive_uniform(&[5.0, 8.0, 20.0], &s), vec![5.0, 3.0, 9.0]);
    }

    #[test]
    fn test_second_diff_zero_both_edges() {
        let engine = CalcEngine::new();
        let s = settings(
            CalcPolicy::ThreePeriodSecondDiff,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::ZeroBoth,
        );
        assert_eq!(engine.derive_uniform(&[5.0, 8.0, 20.0], &s), vec![0.0, 0.0, 9.0]);
    }

    #[test]
    fn test_second_diff_diff_second_edge() {
        let engine = CalcEngine::new();
        let s = settings(
            CalcPolicy::ThreePeriodSecondDiff,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::DiffSecond,
        );
        assert_eq!(engine.derive_uniform(&[5.0, 8.0, 20.0], &s), vec![0.0, 3.0, 9.0]);
    }

    #[test]
    fn test_per_position_settings() {
        let engine = CalcEngine::new();
        let as_is = settings(
            CalcPolicy::AsIs,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::DiffSecond,
        );
        let delta = settings(
            CalcPolicy::TwoMonthDelta,
            FirstPeriodMode::SelfValue,
            SecondDiffEdgeMode::DiffSecond,
        );

        // 首位按原值, 次位按两月差
        let derived = engine.derive_sequence(&[10.0, 15.0], &[as_is, delta]);
        assert_eq!(derived, vec![10.0, 5.0]);
    }
}
