// ==========================================
// 月度绩效评优系统 - 领域类型定义
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 条线优先级与计算策略
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 业务条线 (Domain Kind)
// ==========================================
// 三大独立数据条线, 声明顺序即优先级顺序 (OD > RA > PS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainKind {
    Od, // 营业收入 (Operating Income)
    Ra, // 生息资产 (Performing Assets)
    Ps, // 负债 (Liabilities)
}

impl DomainKind {
    /// 条线优先级序号 (1 最高)
    pub fn rank(&self) -> u32 {
        match self {
            DomainKind::Od => 1,
            DomainKind::Ra => 2,
            DomainKind::Ps => 3,
        }
    }

    /// 字符串标识 (与输入目录/输出列名一致)
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Od => "OD",
            DomainKind::Ra => "RA",
            DomainKind::Ps => "PS",
        }
    }

    /// 从字符串解析条线
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OD" => Some(DomainKind::Od),
            "RA" => Some(DomainKind::Ra),
            "PS" => Some(DomainKind::Ps),
            _ => None,
        }
    }

    /// 全部条线 (按优先级顺序)
    pub fn all() -> [DomainKind; 3] {
        [DomainKind::Od, DomainKind::Ra, DomainKind::Ps]
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 身份优先级键
// ==========================================

/// 计算 (条线, 月份) 的身份解析优先级键
///
/// 规则: 条线 OD > RA > PS; 同条线内月份 12 > 11 > ... > 1。
/// 键值越小优先级越高, 仅当新键严格小于已有键时才允许覆盖。
///
/// # 参数
/// - `domain`: 业务条线
/// - `period`: 月份 (1-12)
pub fn priority_key(domain: DomainKind, period: u8) -> u32 {
    domain.rank() * 100 + 12u32.saturating_sub(period as u32)
}

// ==========================================
// 计算策略 (Calculation Policy)
// ==========================================
// 将原始月度合计转换为派生指标的三种口径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalcPolicy {
    AsIs,                  // 策略1: 原值
    TwoMonthDelta,         // 策略2: 两月差值
    ThreePeriodSecondDiff, // 策略3: 三期二阶差分
}

impl CalcPolicy {
    /// 从配置代码解析策略 (1/2/3)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CalcPolicy::AsIs),
            2 => Some(CalcPolicy::TwoMonthDelta),
            3 => Some(CalcPolicy::ThreePeriodSecondDiff),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            CalcPolicy::AsIs => 1,
            CalcPolicy::TwoMonthDelta => 2,
            CalcPolicy::ThreePeriodSecondDiff => 3,
        }
    }
}

impl fmt::Display for CalcPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcPolicy::AsIs => write!(f, "AS_IS"),
            CalcPolicy::TwoMonthDelta => write!(f, "TWO_MONTH_DELTA"),
            CalcPolicy::ThreePeriodSecondDiff => write!(f, "THREE_PERIOD_SECOND_DIFF"),
        }
    }
}

// ==========================================
// 策略2 首期口径 (First Period Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirstPeriodMode {
    SelfValue, // 首期取原值
    Zero,      // 首期取 0
}

impl fmt::Display for FirstPeriodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirstPeriodMode::SelfValue => write!(f, "SELF"),
            FirstPeriodMode::Zero => write!(f, "ZERO"),
        }
    }
}

// ==========================================
// 策略3 边界口径 (Second Diff Edge Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecondDiffEdgeMode {
    ZeroBoth,     // 前两期均取 0
    DiffSecond,   // 首期 0, 次期一阶差
    SelfThenDiff, // 首期原值, 次期一阶差
}

impl fmt::Display for SecondDiffEdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecondDiffEdgeMode::ZeroBoth => write!(f, "ZERO_BOTH"),
            SecondDiffEdgeMode::DiffSecond => write!(f, "DIFF_SECOND"),
            SecondDiffEdgeMode::SelfThenDiff => write!(f, "SELF_THEN_DIFF"),
        }
    }
}

// ==========================================
// 归一化方向 (Normalization Direction)
// ==========================================
// 指标方向: 值越大越好 / 越小越好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Max, // 越大越好
    Min, // 越小越好
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Max => write!(f, "MAX"),
            Direction::Min => write!(f, "MIN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_rank_order() {
        assert!(DomainKind::Od.rank() < DomainKind::Ra.rank());
        assert!(DomainKind::Ra.rank() < DomainKind::Ps.rank());
    }

    #[test]
    fn test_domain_parse_roundtrip() {
        for d in DomainKind::all() {
            assert_eq!(DomainKind::parse(d.as_str()), Some(d));
        }
        assert_eq!(DomainKind::parse(" od "), Some(DomainKind::Od));
        assert_eq!(DomainKind::parse("XX"), None);
    }

    #[test]
    fn test_priority_key_cross_domain() {
        // 条线优先于月份: OD 3月 胜 RA 12月
        assert!(priority_key(DomainKind::Od, 3) < priority_key(DomainKind::Ra, 12));
    }

    #[test]
    fn test_priority_key_within_domain() {
        // 同条线内晚月优先
        assert!(priority_key(DomainKind::Od, 12) < priority_key(DomainKind::Od, 1));
        assert!(priority_key(DomainKind::Ps, 11) < priority_key(DomainKind::Ps, 10));
    }

    #[test]
    fn test_calc_policy_from_code() {
        assert_eq!(CalcPolicy::from_code(1), Some(CalcPolicy::AsIs));
        assert_eq!(CalcPolicy::from_code(2), Some(CalcPolicy::TwoMonthDelta));
        assert_eq!(CalcPolicy::from_code(3), Some(CalcPolicy::ThreePeriodSecondDiff));
        assert_eq!(CalcPolicy::from_code(4), None);
    }
}
