// ==========================================
// 月度绩效评优系统 - 评分与最佳月份引擎
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 加权评分与并列坍缩
// ==========================================
// 职责: 按条线权重合成月度评分, 共享名次排名, 选出最佳月份
// 红线: 名次并列按评分精确相等判定;
//       连续并列月仅在派生三元组近似相等时坍缩为首月
// ==========================================

use crate::domain::metrics::{BestMonthResult, DerivedTriple, MetricTable, ScoreEntry};
use crate::domain::types::DomainKind;
use std::collections::BTreeMap;

/// 并列坍缩的三元组比较容差
const TIE_TOLERANCE: f64 = 1e-10;

// ==========================================
// ScoreEngine - 加权评分引擎
// ==========================================

/// 加权评分引擎 (无状态)
pub struct ScoreEngine;

impl ScoreEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计算单员工全月份的加权评分与名次
    ///
    /// 条线在归一化表缺位时按 0 计入评分。
    ///
    /// # 参数
    /// - `periods`: 全局月份并集 (升序)
    /// - `weights`: 条线 → 权重 (不要求和为 1)
    ///
    /// # 返回
    /// - 按月份升序的评分条目 (名次为共享最小名次, 1 为最佳)
    pub fn score_employee(
        &self,
        employee_id: &str,
        periods: &[u8],
        normalized: &MetricTable,
        weights: &BTreeMap<DomainKind, f64>,
    ) -> Vec<ScoreEntry> {
        let scores: Vec<(u8, f64)> = periods
            .iter()
            .map(|&period| {
                let score: f64 = DomainKind::all()
                    .into_iter()
                    .map(|domain| {
                        let weight = weights.get(&domain).copied().unwrap_or(0.0);
                        weight * normalized.get(employee_id, domain, period).unwrap_or(0.0)
                    })
                    .sum();
                (period, score)
            })
            .collect();

        // 降序共享名次: 与前一位评分精确相等则同名次
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .1
                .partial_cmp(&scores[a].1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut ranks = vec![0u32; scores.len()];
        let mut prev_score = f64::NAN;
        let mut prev_rank = 0u32;
        for (position, &idx) in order.iter().enumerate() {
            let score = scores[idx].1;
            let rank = if score == prev_score {
                prev_rank
            } else {
                (position + 1) as u32
            };
            ranks[idx] = rank;
            prev_score = score;
            prev_rank = rank;
        }

        scores
            .into_iter()
            .zip(ranks)
            .map(|((period, score), rank)| ScoreEntry { period, score, rank })
            .collect()
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// BestMonthSelector - 最佳月份选择器
// ==========================================

/// 最佳月份选择器 (无状态)
pub struct BestMonthSelector;

impl BestMonthSelector {
    pub fn new() -> Self {
        Self
    }

    /// 从名次 1 月份集合选出最终获胜月份
    ///
    /// 连续月号构成的并列段在派生三元组近似相等时坍缩为段首月;
    /// 三元组存在差异的段整段保留。
    pub fn select(
        &self,
        employee_id: &str,
        entries: &[ScoreEntry],
        triples: &BTreeMap<u8, DerivedTriple>,
    ) -> BestMonthResult {
        let mut winners: Vec<u8> = entries
            .iter()
            .filter(|e| e.rank == 1)
            .map(|e| e.period)
            .collect();
        winners.sort_unstable();

        let collapsed = self.collapse_runs(&winners, triples);

        let best_values = collapsed
            .first()
            .and_then(|p| triples.get(p))
            .copied()
            .unwrap_or(DerivedTriple {
                od: None,
                ra: None,
                ps: None,
            });

        BestMonthResult::new(employee_id, collapsed, best_values)
    }

    /// 把升序月份集切成连续月号段并按需坍缩
    fn collapse_runs(&self, winners: &[u8], triples: &BTreeMap<u8, DerivedTriple>) -> Vec<u8> {
        let mut result = Vec::new();
        let mut run: Vec<u8> = Vec::new();

        for &period in winners {
            if let Some(&last) = run.last() {
                if period != last + 1 {
                    self.flush_run(&run, triples, &mut result);
                    run.clear();
                }
            }
            run.push(period);
        }
        self.flush_run(&run, triples, &mut result);

        result
    }

    fn flush_run(&self, run: &[u8], triples: &BTreeMap<u8, DerivedTriple>, out: &mut Vec<u8>) {
        if run.len() <= 1 {
            out.extend_from_slice(run);
            return;
        }

        let first = triples.get(&run[0]);
        let all_equal = run.iter().skip(1).all(|p| match (first, triples.get(p)) {
            (Some(a), Some(b)) => a.approx_eq(b, TIE_TOLERANCE),
            (None, None) => true,
            _ => false,
        });

        if all_equal {
            out.push(run[0]);
        } else {
            out.extend_from_slice(run);
        }
    }
}

impl Default for BestMonthSelector {
    fn default() -> Self {
        Self::new()
    }
}
