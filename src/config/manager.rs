// ==========================================
// 月度绩效评优系统 - 配置管理器
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 分组配置与文件清单
// ==========================================
// 职责: 内置默认配置、逐文件配置解析 (文件覆写 → 条线默认)
// 说明: 启动时一次性解析为不可变 ResolvedFileConfig,
//       各阶段按值/引用传递, 不存在可变全局默认
// ==========================================

use crate::config::rules::{ExclusionRule, InclusionRule};
use crate::config::ConfigError;
use crate::domain::types::{
    CalcPolicy, Direction, DomainKind, FirstPeriodMode, SecondDiffEdgeMode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ColumnMap - 列映射
// ==========================================

/// 源列名 → 标准别名 映射项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    /// 标准别名 (如 "employee_id")
    pub alias: String,
    /// 源文件中的列名
    pub source: String,
}

impl ColumnMap {
    pub fn new(alias: &str, source: &str) -> Self {
        Self {
            alias: alias.to_string(),
            source: source.to_string(),
        }
    }
}

/// 条线默认列映射 (与来源文件表头约定一致)
fn default_columns() -> Vec<ColumnMap> {
    vec![
        ColumnMap::new("employee_id", "Employee ID"),
        ColumnMap::new("territorial_unit", "TB Short"),
        ColumnMap::new("org_unit", "GOSB Full"),
        ColumnMap::new("client_id", "INN"),
        ColumnMap::new("display_name", "Full Name"),
        ColumnMap::new("metric_value", "Fact"),
    ]
}

// ==========================================
// CalcSettings - 计算策略配置
// ==========================================

/// 单文件/单条线的派生指标计算配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcSettings {
    pub policy: CalcPolicy,
    /// 策略2 首期口径
    pub first_period_mode: FirstPeriodMode,
    /// 策略3 边界口径
    pub second_diff_edge_mode: SecondDiffEdgeMode,
}

impl Default for CalcSettings {
    fn default() -> Self {
        Self {
            policy: CalcPolicy::AsIs,
            first_period_mode: FirstPeriodMode::SelfValue,
            second_diff_edge_mode: SecondDiffEdgeMode::DiffSecond,
        }
    }
}

// ==========================================
// FileItem - 单文件配置项
// ==========================================

/// 条线内一个来源文件的配置
///
/// `file_name` 为空串表示该月份不启用。
/// `columns`/`exclusion_rules`/`inclusion_rules`/`calc` 为空或 None 时
/// 回落到条线默认值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileItem {
    /// 文件键 (如 "OD_03")
    pub key: String,
    /// 日志标签 (如 "OD 3月")
    pub label: String,
    /// IN 目录下的文件名; 空串表示不使用
    pub file_name: String,
    /// 月份 (1-12)
    pub period: u8,
    /// 工作表名 (None 回落条线默认)
    pub sheet: Option<String>,
    /// 列映射覆写 (空数组回落条线默认)
    pub columns: Vec<ColumnMap>,
    /// 排除规则覆写
    pub exclusion_rules: Vec<ExclusionRule>,
    /// 包含规则覆写
    pub inclusion_rules: Vec<InclusionRule>,
    /// 计算策略覆写
    pub calc: Option<CalcSettings>,
}

impl FileItem {
    /// 按默认命名约定构造月份文件项 (M-{month}_{domain}.xlsx)
    fn monthly(domain: DomainKind, period: u8) -> Self {
        Self {
            key: format!("{}_{:02}", domain.as_str(), period),
            label: format!("{} {}月", domain.as_str(), period),
            file_name: format!("M-{}_{}.xlsx", period, domain.as_str()),
            period,
            sheet: None,
            columns: Vec::new(),
            exclusion_rules: Vec::new(),
            inclusion_rules: Vec::new(),
            calc: None,
        }
    }
}

// ==========================================
// DomainConfig - 条线配置
// ==========================================

/// 一条业务条线 (OD/RA/PS) 的完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub domain: DomainKind,
    /// 默认工作表名
    pub default_sheet: String,
    /// 工作表序号 (与 default_sheet 二选一, 优先取名称)
    pub sheet_index: Option<usize>,
    /// 表头行号 (0 为首行)
    pub header_row: usize,
    /// 文件头部跳过行数
    pub skip_rows: usize,
    /// 文件尾部跳过行数
    pub skip_footer: usize,
    /// 文件清单
    pub items: Vec<FileItem>,
    pub default_columns: Vec<ColumnMap>,
    pub default_exclusion_rules: Vec<ExclusionRule>,
    pub default_inclusion_rules: Vec<InclusionRule>,
    /// 默认计算策略
    pub default_calc: CalcSettings,
    /// 归一化方向
    pub direction: Direction,
    /// 评分权重 (不要求三条线之和为 1)
    pub weight: f64,
}

impl DomainConfig {
    /// 生成 12 个月标准文件清单的条线配置
    fn standard(domain: DomainKind, weight: f64) -> Self {
        Self {
            domain,
            default_sheet: "Sheet1".to_string(),
            sheet_index: None,
            header_row: 0,
            skip_rows: 0,
            skip_footer: 0,
            items: (1..=12).map(|p| FileItem::monthly(domain, p)).collect(),
            default_columns: default_columns(),
            default_exclusion_rules: Vec::new(),
            default_inclusion_rules: Vec::new(),
            default_calc: CalcSettings::default(),
            direction: Direction::Max,
            weight,
        }
    }
}

// ==========================================
// ResolvedFileConfig - 逐文件解析结果
// ==========================================

/// 单个来源文件的最终生效配置 (覆写与默认合并完毕, 不可变)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFileConfig {
    pub domain: DomainKind,
    pub period: u8,
    pub key: String,
    pub label: String,
    pub file_name: String,
    pub sheet_name: Option<String>,
    pub sheet_index: Option<usize>,
    pub header_row: usize,
    pub skip_rows: usize,
    pub skip_footer: usize,
    pub columns: Vec<ColumnMap>,
    pub exclusion_rules: Vec<ExclusionRule>,
    pub inclusion_rules: Vec<InclusionRule>,
    pub calc: CalcSettings,
    pub direction: Direction,
    pub weight: f64,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================

pub struct ConfigManager {
    domains: BTreeMap<DomainKind, DomainConfig>,
}

impl ConfigManager {
    /// 使用内置默认配置构造
    pub fn with_defaults() -> Self {
        let mut domains = BTreeMap::new();
        domains.insert(DomainKind::Od, DomainConfig::standard(DomainKind::Od, 1.0));
        domains.insert(DomainKind::Ra, DomainConfig::standard(DomainKind::Ra, 1.0));
        domains.insert(DomainKind::Ps, DomainConfig::standard(DomainKind::Ps, 1.0));
        Self { domains }
    }

    /// 使用外部给定的条线配置构造
    pub fn from_domain_configs(configs: Vec<DomainConfig>) -> Self {
        let domains = configs.into_iter().map(|c| (c.domain, c)).collect();
        Self { domains }
    }

    /// 获取条线配置
    ///
    /// # 返回
    /// - Err(ConfigError::UnknownDomain): 配置缺失 (属结构性缺陷, 调用方应中止)
    pub fn domain_config(&self, domain: DomainKind) -> Result<&DomainConfig, ConfigError> {
        self.domains
            .get(&domain)
            .ok_or_else(|| ConfigError::UnknownDomain(domain.to_string()))
    }

    /// 可变访问条线配置 (仅供启动期定制, 解析后不再修改)
    pub fn domain_config_mut(&mut self, domain: DomainKind) -> Result<&mut DomainConfig, ConfigError> {
        self.domains
            .get_mut(&domain)
            .ok_or_else(|| ConfigError::UnknownDomain(domain.to_string()))
    }

    /// 合并单文件配置 (文件覆写优先, 否则条线默认)
    fn resolve_item(&self, config: &DomainConfig, item: &FileItem) -> ResolvedFileConfig {
        let columns = if item.columns.is_empty() {
            config.default_columns.clone()
        } else {
            item.columns.clone()
        };
        let exclusion_rules = if item.exclusion_rules.is_empty() {
            config.default_exclusion_rules.clone()
        } else {
            item.exclusion_rules.clone()
        };
        let inclusion_rules = if item.inclusion_rules.is_empty() {
            config.default_inclusion_rules.clone()
        } else {
            item.inclusion_rules.clone()
        };
        let sheet_name = item
            .sheet
            .clone()
            .or_else(|| Some(config.default_sheet.clone()))
            .filter(|s| !s.is_empty());

        ResolvedFileConfig {
            domain: config.domain,
            period: item.period,
            key: item.key.clone(),
            label: item.label.clone(),
            file_name: item.file_name.clone(),
            sheet_name,
            sheet_index: config.sheet_index,
            header_row: config.header_row,
            skip_rows: config.skip_rows,
            skip_footer: config.skip_footer,
            columns,
            exclusion_rules,
            inclusion_rules,
            calc: item.calc.unwrap_or(config.default_calc),
            direction: config.direction,
            weight: config.weight,
        }
    }

    /// 解析全部启用文件 (file_name 非空) 的最终配置
    ///
    /// 顺序: 条线优先级序, 条线内按月份升序。
    pub fn resolve_all(&self) -> Result<Vec<ResolvedFileConfig>, ConfigError> {
        self.validate()?;

        let mut resolved = Vec::new();
        for domain in DomainKind::all() {
            let config = self.domain_config(domain)?;
            let mut items: Vec<&FileItem> = config
                .items
                .iter()
                .filter(|item| !item.file_name.trim().is_empty())
                .collect();
            items.sort_by_key(|item| item.period);
            for item in items {
                resolved.push(self.resolve_item(config, item));
            }
        }
        Ok(resolved)
    }

    /// 校验配置合法性 (结构性缺陷即失败)
    pub fn validate(&self) -> Result<(), ConfigError> {
        for domain in DomainKind::all() {
            let config = self.domain_config(domain)?;

            if !config.weight.is_finite() || config.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    domain: domain.to_string(),
                    weight: config.weight,
                });
            }

            let mut seen_periods = BTreeMap::new();
            for item in &config.items {
                if item.period < 1 || item.period > 12 {
                    return Err(ConfigError::InvalidPeriod {
                        key: item.key.clone(),
                        period: item.period,
                    });
                }
                if item.file_name.trim().is_empty() {
                    continue;
                }
                if let Some(prev) = seen_periods.insert(item.period, item.key.clone()) {
                    return Err(ConfigError::DuplicatePeriod {
                        domain: domain.to_string(),
                        period: item.period,
                        first_key: prev,
                        second_key: item.key.clone(),
                    });
                }
            }

            for rule in config
                .default_exclusion_rules
                .iter()
                .chain(config.items.iter().flat_map(|i| i.exclusion_rules.iter()))
            {
                if rule.field.trim().is_empty() {
                    return Err(ConfigError::MalformedRule {
                        domain: domain.to_string(),
                        message: "排除规则字段名为空".to_string(),
                    });
                }
            }
            for rule in config
                .default_inclusion_rules
                .iter()
                .chain(config.items.iter().flat_map(|i| i.inclusion_rules.iter()))
            {
                if rule.field.trim().is_empty() {
                    return Err(ConfigError::MalformedRule {
                        domain: domain.to_string(),
                        message: "包含规则字段名为空".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 条线评分权重表
    pub fn weights(&self) -> Result<BTreeMap<DomainKind, f64>, ConfigError> {
        let mut weights = BTreeMap::new();
        for domain in DomainKind::all() {
            weights.insert(domain, self.domain_config(domain)?.weight);
        }
        Ok(weights)
    }

    /// 配置快照 (JSON), 随运行日志留档
    pub fn snapshot_json(&self) -> Result<String, ConfigError> {
        let snapshot: BTreeMap<String, &DomainConfig> = self
            .domains
            .iter()
            .map(|(d, c)| (d.to_string(), c))
            .collect();
        serde_json::to_string(&snapshot).map_err(|e| ConfigError::Snapshot(e.to_string()))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}
