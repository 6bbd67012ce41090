// ==========================================
// 月度绩效评优系统 - 流程编排器
// ==========================================
// 依据: 月度汇总计算说明 v1.2 - 计算主流程
// 用途: 协调 读取→过滤→身份归并→汇总→派生→归一化→评分 七个阶段
// ==========================================
// 红线: 单文件异常就地吸收 (跳过并告警), 不中止整次运行;
//       身份归并阶段必须按配置顺序串行执行
// ==========================================

use crate::config::manager::{CalcSettings, ConfigManager, ResolvedFileConfig};
use crate::domain::employee::{EmployeeIdentity, FilteredTable};
use crate::domain::metrics::{BestMonthResult, DerivedTriple, MetricTable, ScoreEntry};
use crate::domain::types::DomainKind;
use crate::engine::aggregator::MonthlyAggregator;
use crate::engine::calc::CalcEngine;
use crate::engine::diagnostics::DiagnosticsSink;
use crate::engine::identity_resolver::{IdentityResolver, ResolveStats};
use crate::engine::normalizer::{NormalizeOutcome, Normalizer};
use crate::engine::rule_filter::{FilterStats, RuleFilterEngine};
use crate::engine::scorer::{BestMonthSelector, ScoreEngine};
use crate::error::{AppError, AppResult};
use crate::importer::{FieldMapper, ImportError, ParseOptions, UniversalFileParser};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// PipelineResult - 全流程结果
// ==========================================

#[derive(Debug, Clone)]
pub struct PipelineResult {
    // 过滤阶段输出
    pub filtered_tables: Vec<FilteredTable>,
    pub filter_stats: BTreeMap<String, FilterStats>,

    // 身份归并输出
    pub identities: BTreeMap<String, EmployeeIdentity>,
    pub resolve_stats: ResolveStats,

    // 指标阶段输出
    pub aggregates: MetricTable,
    pub derived: MetricTable,
    pub normalized: MetricTable,

    // 评分阶段输出
    pub scores: BTreeMap<String, Vec<ScoreEntry>>,
    pub best_months: BTreeMap<String, BestMonthResult>,

    /// 条线 → 实际加载的月份 (升序)
    pub periods_by_domain: BTreeMap<DomainKind, Vec<u8>>,
}

impl PipelineResult {
    /// 全条线月份并集 (升序)
    pub fn all_periods(&self) -> Vec<u8> {
        let mut periods: Vec<u8> = self
            .periods_by_domain
            .values()
            .flatten()
            .copied()
            .collect();
        periods.sort_unstable();
        periods.dedup();
        periods
    }
}

// ==========================================
// PipelineOrchestrator - 流程编排器
// ==========================================

pub struct PipelineOrchestrator {
    config: Arc<ConfigManager>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    filter: RuleFilterEngine,
    resolver: IdentityResolver,
    aggregator: MonthlyAggregator,
    calc: CalcEngine,
    normalizer: Normalizer,
    scorer: ScoreEngine,
    selector: BestMonthSelector,
}

impl PipelineOrchestrator {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置管理器 (已校验)
    /// - diagnostics: 诊断事件接收者
    pub fn new(config: Arc<ConfigManager>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            config,
            diagnostics,
            filter: RuleFilterEngine::new(),
            resolver: IdentityResolver::new(),
            aggregator: MonthlyAggregator::new(),
            calc: CalcEngine::new(),
            normalizer: Normalizer::new(),
            scorer: ScoreEngine::new(),
            selector: BestMonthSelector::new(),
        }
    }

    /// 从输入目录执行完整流程
    ///
    /// 文件解析与行过滤按文件并行 (spawn_blocking),
    /// 其后各阶段在内存表上串行执行。
    ///
    /// # 参数
    /// - input_dir: 来源文件根目录 (条线子目录 / 文件)
    pub async fn run_from_dir(&self, input_dir: &Path) -> AppResult<PipelineResult> {
        let resolved = self.config.resolve_all()?;
        info!(files = resolved.len(), dir = %input_dir.display(), "开始读取来源文件");

        // ==========================================
        // 步骤1: 并行 解析 → 映射 → 过滤
        // ==========================================
        let mut handles = Vec::with_capacity(resolved.len());
        for rc in resolved {
            let path = Self::locate_file(input_dir, &rc);
            handles.push(tokio::task::spawn_blocking(move || {
                let key = rc.key.clone();
                (key, load_one_file(path, rc))
            }));
        }

        let mut tables = Vec::new();
        let mut filter_stats = BTreeMap::new();
        for handle in futures::future::join_all(handles).await {
            let (key, outcome) = handle.map_err(|e| AppError::Join(e.to_string()))?;
            match outcome {
                Ok(Some((table, stats))) => {
                    // 统计上报
                    for (field, count) in &stats.dropped_by_rule {
                        self.diagnostics
                            .record_rows_dropped(&table.source_file, field, *count);
                    }
                    for field in &stats.skipped_rules {
                        self.diagnostics.record_rule_skipped(&table.source_file, field);
                    }
                    filter_stats.insert(key, stats);
                    tables.push(table);
                }
                Ok(None) => {
                    // 文件缺失, 已在任务内告警
                }
                Err(e) => {
                    // 单文件异常就地吸收
                    warn!(file = %key, error = %e, "文件读取失败, 跳过该文件");
                }
            }
        }

        self.run_on_tables(tables, filter_stats)
    }

    /// 在已过滤的内存表上执行后续阶段 (纯计算, 可直接用于测试)
    pub fn run_on_tables(
        &self,
        tables: Vec<FilteredTable>,
        filter_stats: BTreeMap<String, FilterStats>,
    ) -> AppResult<PipelineResult> {
        let weights = self.config.weights()?;

        // ==========================================
        // 步骤2: 身份归并 (必须串行, 顺序即优先级裁决依据)
        // ==========================================
        debug!("步骤2: 跨文件身份归并");
        let (identities, resolve_stats) = self.resolver.resolve(&tables, &*self.diagnostics);
        info!(
            identities = identities.len(),
            overwrites = resolve_stats.overwrites,
            bad_rows = resolve_stats.rows_skipped_bad_id,
            "身份归并完成"
        );
        if identities.is_empty() {
            warn!("空结果: 全部文件归并后无可解析员工");
        }

        // ==========================================
        // 步骤3: 月度汇总
        // ==========================================
        debug!("步骤3: 逐文件月度汇总");
        let aggregates = self.aggregator.aggregate_all(&tables);

        // 条线 → 加载月份 (升序) 与逐月计算配置
        let mut periods_by_domain: BTreeMap<DomainKind, Vec<u8>> = BTreeMap::new();
        let mut calc_by_file: BTreeMap<(DomainKind, u8), CalcSettings> = BTreeMap::new();
        for rc in self.config.resolve_all()? {
            calc_by_file.insert((rc.domain, rc.period), rc.calc);
        }
        for table in &tables {
            let periods = periods_by_domain.entry(table.domain).or_default();
            if !periods.contains(&table.period) {
                periods.push(table.period);
            }
        }
        for periods in periods_by_domain.values_mut() {
            periods.sort_unstable();
        }

        // 条线 → 参与员工 (该条线至少一个月有合计; 条线整体缺席的
        // 员工不产出该条线键, 评分按 0 计入)
        let mut participants: BTreeMap<DomainKind, std::collections::BTreeSet<&String>> =
            BTreeMap::new();
        for ((employee_id, domain, _), _) in aggregates.iter() {
            if let Some((id, _)) = identities.get_key_value(employee_id) {
                participants.entry(*domain).or_default().insert(id);
            }
        }

        // ==========================================
        // 步骤4: 派生指标计算
        // ==========================================
        debug!("步骤4: 派生指标计算");
        let mut derived = MetricTable::new();
        for (&domain, periods) in &periods_by_domain {
            let settings: Vec<CalcSettings> = periods
                .iter()
                .map(|p| calc_by_file.get(&(domain, *p)).copied().unwrap_or_default())
                .collect();
            let Some(members) = participants.get(&domain) else {
                continue;
            };
            for &employee_id in members {
                let values: Vec<f64> = periods
                    .iter()
                    .map(|p| aggregates.get_or_zero(employee_id, domain, *p))
                    .collect();
                let derived_values = self.calc.derive_sequence(&values, &settings);
                for (period, value) in periods.iter().zip(derived_values) {
                    derived.insert(employee_id, domain, *period, value);
                }
            }
        }

        // ==========================================
        // 步骤5: 极差归一化 (按员工 × 条线独立)
        // ==========================================
        debug!("步骤5: 极差归一化");
        let mut normalized = MetricTable::new();
        for (&domain, periods) in &periods_by_domain {
            let direction = self.config.domain_config(domain)?.direction;
            let Some(members) = participants.get(&domain) else {
                continue;
            };
            for &employee_id in members {
                let values: Vec<f64> = periods
                    .iter()
                    .map(|p| derived.get_or_zero(employee_id, domain, *p))
                    .collect();
                let (scaled, outcome) = self.normalizer.normalize(&values, direction);
                if outcome != NormalizeOutcome::MinMax {
                    self.diagnostics.record_normalization_edge(domain, outcome);
                }
                for (period, value) in periods.iter().zip(scaled) {
                    normalized.insert(employee_id, domain, *period, value);
                }
            }
        }

        // ==========================================
        // 步骤6: 加权评分与共享名次
        // ==========================================
        debug!("步骤6: 加权评分");
        let mut all_periods: Vec<u8> = periods_by_domain.values().flatten().copied().collect();
        all_periods.sort_unstable();
        all_periods.dedup();

        let mut scores = BTreeMap::new();
        let mut best_months = BTreeMap::new();
        for employee_id in identities.keys() {
            let entries =
                self.scorer
                    .score_employee(employee_id, &all_periods, &normalized, &weights);

            // ==========================================
            // 步骤7: 最佳月份选择 (并列坍缩)
            // ==========================================
            let mut triples = BTreeMap::new();
            for &period in &all_periods {
                triples.insert(
                    period,
                    DerivedTriple {
                        od: derived.get(employee_id, DomainKind::Od, period),
                        ra: derived.get(employee_id, DomainKind::Ra, period),
                        ps: derived.get(employee_id, DomainKind::Ps, period),
                    },
                );
            }
            let best = self.selector.select(employee_id, &entries, &triples);
            self.diagnostics.record_score(employee_id, best.best_period);

            scores.insert(employee_id.clone(), entries);
            best_months.insert(employee_id.clone(), best);
        }

        info!(
            employees = identities.len(),
            periods = all_periods.len(),
            "流程执行完成"
        );

        Ok(PipelineResult {
            filtered_tables: tables,
            filter_stats,
            identities,
            resolve_stats,
            aggregates,
            derived,
            normalized,
            scores,
            best_months,
            periods_by_domain,
        })
    }

    /// 定位来源文件: 条线子目录优先, 根目录兜底
    fn locate_file(input_dir: &Path, rc: &ResolvedFileConfig) -> PathBuf {
        let nested = input_dir.join(rc.domain.as_str()).join(&rc.file_name);
        if nested.exists() {
            nested
        } else {
            input_dir.join(&rc.file_name)
        }
    }
}

/// 阻塞任务: 解析单文件并执行映射与过滤
///
/// # 返回
/// - Ok(None): 文件缺失 (正常情况, 当月未提供)
fn load_one_file(
    path: PathBuf,
    rc: ResolvedFileConfig,
) -> Result<Option<(FilteredTable, FilterStats)>, ImportError> {
    if !path.exists() {
        warn!(file = %path.display(), label = %rc.label, "来源文件缺失, 跳过");
        return Ok(None);
    }

    let options = ParseOptions {
        sheet_name: rc.sheet_name.clone(),
        sheet_index: rc.sheet_index,
        header_row: rc.header_row,
        skip_rows: rc.skip_rows,
        skip_footer: rc.skip_footer,
    };
    let records = UniversalFileParser.parse(&path, &options)?;

    let mapper = FieldMapper::new(&rc.columns);
    let (rows, available_fields) = mapper.map_table(&records, rc.domain, rc.period, &rc.file_name);

    let (kept, stats) = RuleFilterEngine::new().apply(
        rows,
        &rc.exclusion_rules,
        &rc.inclusion_rules,
        &available_fields,
    );

    debug!(
        file = %rc.file_name,
        rows_in = stats.rows_in,
        rows_kept = stats.rows_kept,
        "文件读取与过滤完成"
    );

    Ok(Some((
        FilteredTable {
            domain: rc.domain,
            period: rc.period,
            source_file: rc.file_name,
            label: rc.label,
            rows: kept,
            available_fields,
        },
        stats,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::employee::RawRow;
    use crate::engine::diagnostics::NoOpDiagnosticsSink;
    use std::collections::{BTreeSet, HashMap};

    fn row(id: &str, domain: DomainKind, period: u8, value: f64) -> RawRow {
        RawRow {
            employee_id: id.to_string(),
            territorial_unit: Some("TU-01".to_string()),
            org_unit: Some("机构A".to_string()),
            client_id: None,
            display_name: Some("张三".to_string()),
            metric_value: Some(value),
            domain,
            period,
            source_file: format!("M-{}_{}.xlsx", period, domain.as_str()),
            row_number: 0,
            extra: HashMap::new(),
        }
    }

    fn table(domain: DomainKind, period: u8, rows: Vec<RawRow>) -> FilteredTable {
        let available_fields: BTreeSet<String> =
            ["employee_id", "territorial_unit", "org_unit", "display_name"]
                .iter()
                .map(|s| s.to_string())
                .collect();
        FilteredTable {
            domain,
            period,
            source_file: format!("M-{}_{}.xlsx", period, domain.as_str()),
            label: format!("{} {}月", domain.as_str(), period),
            rows,
            available_fields,
        }
    }

    fn orchestrator() -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Arc::new(ConfigManager::with_defaults()),
            Arc::new(NoOpDiagnosticsSink),
        )
    }

    #[test]
    fn test_run_on_tables_end_to_end() {
        let tables = vec![
            table(
                DomainKind::Od,
                1,
                vec![
                    row("00000001", DomainKind::Od, 1, 10.0),
                    row("00000002", DomainKind::Od, 1, 4.0),
                ],
            ),
            table(
                DomainKind::Od,
                2,
                vec![
                    row("00000001", DomainKind::Od, 2, 20.0),
                    row("00000002", DomainKind::Od, 2, 2.0),
                ],
            ),
        ];

        let result = orchestrator()
            .run_on_tables(tables, BTreeMap::new())
            .unwrap();

        assert_eq!(result.identities.len(), 2);
        assert_eq!(result.all_periods(), vec![1, 2]);
        // 默认策略 AS_IS: 派生等于合计
        assert_eq!(result.derived.get("00000001", DomainKind::Od, 2), Some(20.0));
        // 员工1 在 2月 归一化为 1.0 → 最佳月份为 2
        assert_eq!(result.best_months["00000001"].winning_periods, vec![2]);
        // 员工2 在 1月 更优
        assert_eq!(result.best_months["00000002"].winning_periods, vec![1]);
    }

    #[test]
    fn test_run_on_tables_empty_input() {
        let result = orchestrator()
            .run_on_tables(Vec::new(), BTreeMap::new())
            .unwrap();

        assert!(result.identities.is_empty());
        assert!(result.best_months.is_empty());
        assert!(result.all_periods().is_empty());
    }

    #[test]
    fn test_derived_keys_reference_identities_only() {
        // 身份表之外的工号不进入派生表
        let tables = vec![table(
            DomainKind::Ra,
            3,
            vec![row("00000007", DomainKind::Ra, 3, 5.0)],
        )];

        let result = orchestrator()
            .run_on_tables(tables, BTreeMap::new())
            .unwrap();

        assert_eq!(result.identities.len(), 1);
        assert_eq!(result.derived.len(), 1);
        assert_eq!(result.derived.get("00000007", DomainKind::Ra, 3), Some(5.0));
    }
}
